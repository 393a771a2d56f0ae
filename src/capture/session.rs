use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rayon::prelude::*;

use crate::annotation::model::Annotation;
use crate::annotation::store::AnnotationSource;
use crate::assets::image::SourceImage;
use crate::capture::config::CaptureConfig;
use crate::capture::renderer::{CaptureRenderer, CaptureScene, FrameRGBA, FrameSnapshot};
use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{PinpointError, PinpointResult};
use crate::presentation::config::PresentationConfig;
use crate::presentation::presenter::{NullStage, Presenter, Stage};
use crate::presentation::state::Phase;
use crate::timeline::clock::CancelToken;

/// One output frame of a recording, before rendering.
#[derive(Clone, Debug, PartialEq)]
pub struct PlannedFrame {
    /// Output frame index.
    pub index: FrameIndex,
    /// Output time, lead-in included.
    pub time: Duration,
    /// Presenter phase; `Idle` for lead-in and lead-out frames.
    pub phase: Phase,
    /// Annotation index held by the presenter.
    pub current_index: usize,
    /// Visual state to render.
    pub snapshot: FrameSnapshot,
}

/// Frame counters of one recording.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    /// Frames pushed to the sink.
    pub frames_total: u64,
    /// Frames drawn by a renderer.
    pub frames_rendered: u64,
    /// Frames reused from an identical earlier frame.
    pub frames_elided: u64,
}

/// Result of a finished (or early-stopped) recording.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptureArtifact {
    /// Output file, when the sink wrote one.
    pub path: Option<PathBuf>,
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Video duration implied by `frames` at the target rate.
    pub duration: Duration,
    /// Render and elision counters.
    pub stats: CaptureStats,
    /// `true` when the stop handle ended the recording before the pass completed.
    pub stopped_early: bool,
}

/// Requests an early end of a running recording; clone it into another thread.
#[derive(Clone, Debug, Default)]
pub struct CaptureStopHandle(CancelToken);

impl CaptureStopHandle {
    /// Ask the recording to stop at the next frame (or chunk) boundary.
    pub fn stop(&self) {
        self.0.cancel();
    }

    /// `true` once [`stop`](Self::stop) has been called.
    pub fn is_stopped(&self) -> bool {
        self.0.is_cancelled()
    }
}

/// Offscreen recording of one presentation pass.
///
/// The presenter is driven at exact frame times with a [`NullStage`], so every recording of the
/// same inputs yields the same frames regardless of how long rendering takes.
pub struct CaptureSession {
    presentation: PresentationConfig,
    config: CaptureConfig,
    annotations: Vec<Annotation>,
    image: Option<SourceImage>,
    stop: CaptureStopHandle,
}

impl CaptureSession {
    /// Snapshot `source` for this recording; later store edits do not affect it.
    pub fn new<S: AnnotationSource + ?Sized>(
        presentation: PresentationConfig,
        config: CaptureConfig,
        source: &S,
        image: Option<SourceImage>,
    ) -> PinpointResult<Self> {
        presentation.validate()?;
        config.validate()?;
        Ok(Self {
            presentation,
            config,
            annotations: source.annotations(),
            image,
            stop: CaptureStopHandle::default(),
        })
    }

    /// Capture settings.
    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Annotation snapshot taken at construction.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Handle that stops [`record`](Self::record) early; clones share one flag.
    pub fn stop_handle(&self) -> CaptureStopHandle {
        self.stop.clone()
    }

    /// Frame-by-frame schedule: lead-in stills, one full pass, lead-out stills.
    ///
    /// The pass ends when the presenter wraps back to the first item; the wrap delay is not
    /// recorded. Fails with `EmptySequence` when no annotation can be presented.
    pub fn plan(&self) -> PinpointResult<Vec<PlannedFrame>> {
        let fps = self.config.target.fps;
        let mut presenter = Presenter::new(self.presentation.clone(), NullStage)?;
        let mut source = self.annotations.clone();
        if !presenter.start(&mut source, Duration::ZERO) {
            return Err(PinpointError::EmptySequence);
        }

        let lead_in = fps.frames_covering(self.config.lead_in);
        let lead_out = fps.frames_covering(self.config.lead_out);
        let mut frames = Vec::new();
        let mut push = |phase: Phase, current_index: usize, snapshot: FrameSnapshot| {
            let index = FrameIndex(frames.len() as u64);
            frames.push(PlannedFrame {
                index,
                time: fps.frame_time(index),
                phase,
                current_index,
                snapshot,
            });
        };

        for _ in 0..lead_in {
            push(Phase::Idle, 0, FrameSnapshot::still());
        }
        let mut k = 0u64;
        loop {
            presenter.tick(fps.frame_time(FrameIndex(k)), &self.image);
            if presenter.laps() >= 1 || !presenter.is_playing() {
                break;
            }
            push(
                presenter.phase(),
                presenter.current_index(),
                snapshot_of(&presenter),
            );
            k += 1;
        }
        for _ in 0..lead_out {
            push(Phase::Idle, 0, FrameSnapshot::still());
        }
        presenter.stop(&mut source);
        Ok(frames)
    }

    /// Render the planned frames into `sink`.
    ///
    /// All setup (image, plan, scene, thread pool) happens before `sink.begin`; a sink that
    /// rejects its configuration receives no frames.
    #[tracing::instrument(skip_all, fields(
        width = self.config.target.width,
        height = self.config.target.height,
        fps = self.config.target.fps.num,
    ))]
    pub fn record(&self, sink: &mut dyn FrameSink) -> PinpointResult<CaptureArtifact> {
        let image = self.image.clone().ok_or(PinpointError::MissingImage)?;
        let plan = self.plan()?;
        let scene = CaptureScene::new(&self.config, image, self.annotations.clone())?;
        let threading = &self.config.threading;
        let pool = if threading.parallel {
            Some(build_thread_pool(threading.threads)?)
        } else {
            None
        };

        let target = self.config.target;
        sink.begin(SinkConfig {
            width: target.width,
            height: target.height,
            fps: target.fps,
            bitrate: target.bitrate,
        })?;
        tracing::info!(frames = plan.len(), "capture started");

        let (stats, mut stopped_early) = match self.stream(&plan, &scene, pool.as_ref(), sink) {
            Ok(done) => done,
            Err(err) => {
                // Failed captures still close the sink.
                if let Err(end_err) = sink.end() {
                    tracing::warn!(error = %end_err, "closing sink after failed capture");
                }
                return Err(err);
            }
        };

        let lead_out = target.fps.frames_covering(self.config.lead_out) as usize;
        let presentation_end = plan.len().saturating_sub(lead_out);
        // Stopping during lead-out still counts as a complete pass.
        if stopped_early && stats.frames_total as usize >= presentation_end {
            stopped_early = false;
        }

        sink.end()?;
        tracing::info!(
            frames = stats.frames_total,
            rendered = stats.frames_rendered,
            elided = stats.frames_elided,
            stopped_early,
            "capture finished"
        );
        Ok(CaptureArtifact {
            path: None,
            frames: stats.frames_total,
            duration: target.fps.frame_time(FrameIndex(stats.frames_total)),
            stats,
            stopped_early,
        })
    }

    /// Render `plan` into an already configured sink; returns the stats and whether the
    /// stop handle cut the run short.
    fn stream(
        &self,
        plan: &[PlannedFrame],
        scene: &Arc<CaptureScene>,
        pool: Option<&rayon::ThreadPool>,
        sink: &mut dyn FrameSink,
    ) -> PinpointResult<(CaptureStats, bool)> {
        let threading = &self.config.threading;
        let mut stats = CaptureStats::default();

        match pool {
            None => {
                let mut renderer = CaptureRenderer::new(Arc::clone(scene));
                let mut last: Option<(u64, FrameRGBA)> = None;
                for planned in plan {
                    if self.stop.is_stopped() {
                        return Ok((stats, true));
                    }
                    let fp = planned.snapshot.fingerprint();
                    let (fp, frame) = match last.take() {
                        Some((prev, frame)) if threading.static_frame_elision && prev == fp => {
                            stats.frames_elided += 1;
                            (prev, frame)
                        }
                        _ => {
                            stats.frames_rendered += 1;
                            (fp, renderer.render(&planned.snapshot)?)
                        }
                    };
                    sink.push_frame(planned.index, &frame)?;
                    stats.frames_total += 1;
                    last = Some((fp, frame));
                }
            }
            Some(pool) => {
                for chunk in plan.chunks(normalized_chunk_size(threading.chunk_size)) {
                    if self.stop.is_stopped() {
                        return Ok((stats, true));
                    }
                    let chunk_stats = render_chunk_parallel(
                        chunk,
                        scene,
                        threading.static_frame_elision,
                        pool,
                        sink,
                    )?;
                    stats.frames_total += chunk_stats.frames_total;
                    stats.frames_rendered += chunk_stats.frames_rendered;
                    stats.frames_elided += chunk_stats.frames_elided;
                }
            }
        }
        Ok((stats, false))
    }

    /// Record to `dir/presentation_{w}x{h}_{quality}_{fps}fps.mp4` through the system `ffmpeg`.
    pub fn record_to_file(&self, dir: impl AsRef<Path>) -> PinpointResult<CaptureArtifact> {
        let path = dir.as_ref().join(self.config.file_name());
        let mut sink = FfmpegSink::new(FfmpegSinkOpts {
            bg_rgba: self.config.background,
            ..FfmpegSinkOpts::new(path.clone())
        });
        let artifact = self.record(&mut sink)?;
        Ok(CaptureArtifact {
            path: Some(path),
            ..artifact
        })
    }

    /// Render the frame shown `at` into the presentation (lead-in excluded).
    pub fn render_still(&self, at: Duration) -> PinpointResult<FrameRGBA> {
        let image = self.image.clone().ok_or(PinpointError::MissingImage)?;
        let mut presenter = Presenter::new(self.presentation.clone(), NullStage)?;
        let mut source = self.annotations.clone();
        if !presenter.start(&mut source, Duration::ZERO) {
            return Err(PinpointError::EmptySequence);
        }
        presenter.tick(at, &image);
        let snapshot = snapshot_of(&presenter);

        let scene = CaptureScene::new(&self.config, image, self.annotations.clone())?;
        CaptureRenderer::new(scene).render(&snapshot)
    }
}

fn snapshot_of<V: Stage>(presenter: &Presenter<V>) -> FrameSnapshot {
    FrameSnapshot {
        focus: presenter.focus(),
        caption: presenter.caption().clone(),
        current: presenter
            .phase()
            .is_item_phase()
            .then_some(presenter.current_index()),
    }
}

fn render_chunk_parallel(
    chunk: &[PlannedFrame],
    scene: &Arc<CaptureScene>,
    elision: bool,
    pool: &rayon::ThreadPool,
    sink: &mut dyn FrameSink,
) -> PinpointResult<CaptureStats> {
    let mut unique_indices = Vec::<usize>::with_capacity(chunk.len());
    let mut frame_to_unique = Vec::<usize>::with_capacity(chunk.len());
    if elision {
        let mut first = HashMap::<u64, usize>::new();
        for (idx, planned) in chunk.iter().enumerate() {
            let fp = planned.snapshot.fingerprint();
            if let Some(existing) = first.get(&fp).copied() {
                frame_to_unique.push(existing);
            } else {
                let slot = unique_indices.len();
                unique_indices.push(idx);
                first.insert(fp, slot);
                frame_to_unique.push(slot);
            }
        }
    } else {
        for idx in 0..chunk.len() {
            frame_to_unique.push(idx);
            unique_indices.push(idx);
        }
    }

    let rendered = pool.install(|| {
        unique_indices
            .par_iter()
            .map_init(
                || CaptureRenderer::new(Arc::clone(scene)),
                |renderer, &idx| renderer.render(&chunk[idx].snapshot),
            )
            .collect::<Vec<_>>()
    });
    let unique_frames = rendered.into_iter().collect::<PinpointResult<Vec<_>>>()?;

    for (planned, slot) in chunk.iter().zip(frame_to_unique) {
        let frame = unique_frames.get(slot).ok_or_else(|| {
            PinpointError::evaluation("internal error: unique frame missing for slot")
        })?;
        sink.push_frame(planned.index, frame)?;
    }

    let total = chunk.len() as u64;
    let rendered_count = unique_frames.len() as u64;
    Ok(CaptureStats {
        frames_total: total,
        frames_rendered: rendered_count,
        frames_elided: total.saturating_sub(rendered_count),
    })
}

fn build_thread_pool(threads: Option<usize>) -> PinpointResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(PinpointError::validation(
            "capture threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| PinpointError::evaluation(format!("failed to build rayon thread pool: {e}")))
}

fn normalized_chunk_size(chunk_size: usize) -> usize {
    chunk_size.max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
