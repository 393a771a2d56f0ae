use std::time::Duration;

use crate::animation::ease::Ease;
use crate::annotation::model::Annotation;
use crate::annotation::store::AnnotationSource;
use crate::assets::image::ImageProvider;
use crate::foundation::error::{PinpointError, PinpointResult};
use crate::foundation::math::lerp;
use crate::geometry::resolver::{FocalTransform, FocusTarget, GeometryResolver};
use crate::presentation::config::PresentationConfig;
use crate::presentation::state::{Phase, PlaybackState};
use crate::reveal::text::TextReveal;
use crate::timeline::clock::{CancelToken, TickSource};
use crate::timeline::scheduler::{RunStatus, Tick, TimelineRun};

/// Description overlay as it should currently be displayed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Caption {
    /// Revealed prefix of the description.
    pub text: String,
    /// Container opacity in `[0, 1]`.
    pub opacity: f64,
    /// `false` outside annotation cycles.
    pub visible: bool,
}

impl Caption {
    /// Caption with no text, fully transparent.
    pub fn hidden() -> Self {
        Self::default()
    }
}

/// Output surface a [`Presenter`] writes visual state to.
///
/// Live adapters translate the numeric focal transform into their own representation; the
/// presenter never formats style strings.
pub trait Stage {
    /// Apply the current focal transform to the image.
    fn apply_focus(&mut self, focus: FocalTransform);
    /// Update the description overlay.
    fn show_caption(&mut self, caption: &Caption);
    /// Called after every phase transition, with the boundary time it happened at.
    fn phase_changed(&mut self, _at: Duration, _state: &PlaybackState) {}
}

impl<S: Stage + ?Sized> Stage for &mut S {
    fn apply_focus(&mut self, focus: FocalTransform) {
        (**self).apply_focus(focus);
    }

    fn show_caption(&mut self, caption: &Caption) {
        (**self).show_caption(caption);
    }

    fn phase_changed(&mut self, at: Duration, state: &PlaybackState) {
        (**self).phase_changed(at, state);
    }
}

/// Stage that discards output; used when only the state sequence matters (capture, planning).
#[derive(Clone, Copy, Debug, Default)]
pub struct NullStage;

impl Stage for NullStage {
    fn apply_focus(&mut self, _focus: FocalTransform) {}

    fn show_caption(&mut self, _caption: &Caption) {}
}

/// Presentation state machine.
///
/// Poll-driven: callers feed monotonically increasing times to [`Presenter::tick`]. Every phase
/// is a [`TimelineRun`] whose start is the previous phase's end, so a lap always takes exactly
/// its configured duration regardless of tick jitter.
pub struct Presenter<V: Stage = NullStage> {
    config: PresentationConfig,
    resolver: GeometryResolver,
    stage: V,
    state: PlaybackState,
    snapshot: Vec<Annotation>,
    targets: Vec<Option<FocusTarget>>,
    run: Option<TimelineRun>,
    reveal: TextReveal,
    focus: FocalTransform,
    caption: Caption,
    image_missing: bool,
}

impl<V: Stage> Presenter<V> {
    /// Idle presenter driving `stage`.
    pub fn new(config: PresentationConfig, stage: V) -> PinpointResult<Self> {
        config.validate()?;
        let resolver = config.resolver()?;
        let reveal = config.text_reveal();
        Ok(Self {
            config,
            resolver,
            stage,
            state: PlaybackState::default(),
            snapshot: Vec::new(),
            targets: Vec::new(),
            run: None,
            reveal,
            focus: FocalTransform::IDENTITY,
            caption: Caption::hidden(),
            image_missing: false,
        })
    }

    /// Snapshot `source` and begin zooming into the first annotation at `now`.
    ///
    /// Returns `false` without side effects when already playing, when the sequence is empty, or
    /// when no annotation can be framed.
    #[tracing::instrument(skip_all, fields(now_ms = now.as_millis() as u64))]
    pub fn start<S: AnnotationSource + ?Sized>(&mut self, source: &mut S, now: Duration) -> bool {
        if self.state.is_playing {
            tracing::debug!("start ignored: already playing");
            return false;
        }
        let snapshot = source.annotations();
        if snapshot.is_empty() {
            tracing::debug!(reason = %PinpointError::EmptySequence, "start ignored");
            return false;
        }

        let targets: Vec<Option<FocusTarget>> = snapshot
            .iter()
            .enumerate()
            .map(|(index, a)| match self.resolver.resolve_focus(a) {
                Ok(t) => Some(t),
                Err(e) => {
                    tracing::warn!(
                        index,
                        id = a.id.0,
                        kind = a.shape.kind(),
                        error = %e,
                        "annotation will be skipped"
                    );
                    None
                }
            })
            .collect();
        let Some(first) = targets.iter().position(Option::is_some) else {
            tracing::warn!("no annotation can be framed; start ignored");
            return false;
        };

        self.snapshot = snapshot;
        self.targets = targets;
        self.state = PlaybackState {
            is_playing: true,
            ..PlaybackState::default()
        };
        self.image_missing = false;
        source.set_markers_visible(false);
        tracing::info!(items = self.snapshot.len(), "presentation started");
        self.enter_zoom_in(first, now);
        true
    }

    /// Cancel any active run and return to the resting view.
    ///
    /// Safe to call in any phase and any number of times.
    pub fn stop<S: AnnotationSource + ?Sized>(&mut self, source: &mut S) {
        if let Some(run) = self.run.as_mut() {
            run.cancel();
        }
        self.run = None;
        let was_playing = self.state.is_playing;
        self.state.reset();
        self.snapshot.clear();
        self.targets.clear();
        self.reveal.clear();
        self.image_missing = false;
        self.focus = FocalTransform::IDENTITY;
        self.caption = Caption::hidden();
        self.stage.apply_focus(self.focus);
        self.stage.show_caption(&self.caption);
        source.set_markers_visible(true);
        if was_playing {
            tracing::info!("presentation stopped");
        }
    }

    /// Advance to `now`, completing every phase whose boundary has passed.
    pub fn tick<I: ImageProvider + ?Sized>(&mut self, now: Duration, images: &I) {
        if !self.state.is_playing {
            return;
        }
        while let Some(run) = self.run.as_mut() {
            let Some(tick) = run.tick(now) else {
                break;
            };
            let done = run.status() == RunStatus::Completed;
            let end = run.end();
            self.render(tick, images);
            if !done {
                break;
            }
            self.finish_phase(end);
        }
    }

    /// Current playback state.
    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// `true` between `start` and `stop`.
    pub fn is_playing(&self) -> bool {
        self.state.is_playing
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    /// Index of the framed annotation.
    pub fn current_index(&self) -> usize {
        self.state.current_index
    }

    /// Completed laps since `start`.
    pub fn laps(&self) -> u64 {
        self.state.laps
    }

    /// Focal transform most recently applied to the stage.
    pub fn focus(&self) -> FocalTransform {
        self.focus
    }

    /// Caption as last shown.
    pub fn caption(&self) -> &Caption {
        &self.caption
    }

    /// Timing configuration.
    pub fn config(&self) -> &PresentationConfig {
        &self.config
    }

    /// Annotations captured by the current run.
    pub fn snapshot(&self) -> &[Annotation] {
        &self.snapshot
    }

    /// End of the active phase, if any.
    pub fn next_boundary(&self) -> Option<Duration> {
        self.run.as_ref().map(TimelineRun::end)
    }

    /// Live adapter.
    pub fn stage(&self) -> &V {
        &self.stage
    }

    /// Live adapter, mutably.
    pub fn stage_mut(&mut self) -> &mut V {
        &mut self.stage
    }

    /// Consume the presenter and return its stage.
    pub fn into_stage(self) -> V {
        self.stage
    }

    fn render<I: ImageProvider + ?Sized>(&mut self, tick: Tick, images: &I) {
        let phase = self.state.phase;
        let target = self
            .targets
            .get(self.state.current_index)
            .copied()
            .flatten();
        let (focus, opacity) = match (phase, target) {
            (Phase::ZoomIn, Some(t)) => (FocalTransform::toward(t, tick.eased), tick.eased),
            (Phase::Hold, Some(t)) => (FocalTransform::framed(t), 1.0),
            (Phase::ZoomOut, Some(t)) => (
                FocalTransform {
                    scale: lerp(t.target_scale, 1.0, tick.eased),
                    origin_x: t.origin_x,
                    origin_y: t.origin_y,
                },
                1.0 - tick.eased,
            ),
            _ => (FocalTransform::IDENTITY, 0.0),
        };

        if images.current_image().is_none() {
            if !self.image_missing {
                tracing::warn!(
                    index = self.state.current_index,
                    reason = %PinpointError::MissingImage,
                    "skipping animation ticks"
                );
                self.image_missing = true;
            }
            return;
        }
        self.image_missing = false;

        if phase.is_item_phase() {
            let zoom_in = (phase == Phase::ZoomIn).then_some(tick.raw);
            self.state.text_cursor = self.reveal.advance(tick.at, zoom_in);
            self.caption = Caption {
                text: self.reveal.visible().to_owned(),
                opacity,
                visible: true,
            };
        } else {
            self.caption = Caption::hidden();
        }
        self.focus = focus;
        self.stage.apply_focus(focus);
        self.stage.show_caption(&self.caption);
    }

    fn finish_phase(&mut self, at: Duration) {
        match self.state.phase {
            Phase::ZoomIn => {
                let hold = TimelineRun::timer(at, self.config.hold_duration());
                self.enter(Phase::Hold, at, hold);
            }
            Phase::Hold => {
                let zoom_out =
                    TimelineRun::new(at, self.config.zoom_duration(), Ease::InOutCubic);
                self.enter(Phase::ZoomOut, at, zoom_out);
            }
            Phase::ZoomOut => self.advance(at),
            Phase::InterItemDelay => {
                if self.targets.first().is_some_and(Option::is_some) {
                    self.enter_zoom_in(0, at);
                } else {
                    self.advance(at);
                }
            }
            Phase::Idle => self.run = None,
        }
    }

    /// Move to the next framable annotation, or into the wrap delay after the last one.
    fn advance(&mut self, at: Duration) {
        let n = self.snapshot.len();
        if n == 0 {
            self.run = None;
            return;
        }
        let mut i = self.state.current_index;
        loop {
            let next = (i + 1) % n;
            if next == 0 {
                self.state.laps += 1;
                self.state.current_index = 0;
                self.state.text_cursor = 0;
                self.reveal.clear();
                let delay = TimelineRun::timer(at, self.config.transition_delay());
                self.enter(Phase::InterItemDelay, at, delay);
                return;
            }
            if self.targets.get(next).is_some_and(Option::is_some) {
                self.enter_zoom_in(next, at);
                return;
            }
            tracing::debug!(index = next, "skipping annotation without a focal target");
            i = next;
        }
    }

    fn enter_zoom_in(&mut self, index: usize, at: Duration) {
        self.state.current_index = index;
        self.state.text_cursor = 0;
        let text = self
            .snapshot
            .get(index)
            .map_or("", |a| a.description.as_str());
        self.reveal.begin(text, at);
        let zoom_in = TimelineRun::new(at, self.config.zoom_duration(), Ease::InOutCubic);
        self.enter(Phase::ZoomIn, at, zoom_in);
    }

    fn enter(&mut self, phase: Phase, at: Duration, run: TimelineRun) {
        self.state.phase = phase;
        self.run = Some(run);
        tracing::debug!(
            %phase,
            index = self.state.current_index,
            at_ms = at.as_millis() as u64,
            "phase transition"
        );
        self.stage.phase_changed(at, &self.state);
    }
}

/// Run live playback: pull ticks from `ticks` and feed them to `presenter` until it stops.
///
/// Returns [`RunStatus::Cancelled`] when `cancel` fires (the presenter is stopped at that tick
/// boundary), [`RunStatus::Completed`] when playback ends or `max_laps` laps have been played,
/// and [`RunStatus::Running`] when the tick source runs dry mid-presentation.
pub fn drive<V, S, I, T>(
    presenter: &mut Presenter<V>,
    source: &mut S,
    images: &I,
    ticks: &mut T,
    cancel: &CancelToken,
    max_laps: Option<u64>,
) -> RunStatus
where
    V: Stage,
    S: AnnotationSource + ?Sized,
    I: ImageProvider + ?Sized,
    T: TickSource + ?Sized,
{
    loop {
        if cancel.is_cancelled() {
            presenter.stop(source);
            return RunStatus::Cancelled;
        }
        if !presenter.is_playing() {
            return RunStatus::Completed;
        }
        let Some(now) = ticks.next_tick() else {
            return RunStatus::Running;
        };
        presenter.tick(now, images);
        if max_laps.is_some_and(|l| presenter.laps() >= l) {
            presenter.stop(source);
            return RunStatus::Completed;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/presenter.rs"]
mod tests;
