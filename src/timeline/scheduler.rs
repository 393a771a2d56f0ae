use std::time::Duration;

use crate::animation::ease::Ease;
use crate::timeline::clock::{CancelToken, TickSource};

/// Lifecycle of one [`TimelineRun`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunStatus {
    /// Still emitting ticks.
    #[default]
    Running,
    /// Reached progress 1.0; the final tick has been emitted.
    Completed,
    /// Stopped early; no further ticks are emitted.
    Cancelled,
}

/// Progress sample emitted by a run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Elapsed / duration, clamped to `[0, 1]` and never decreasing within a run.
    pub raw: f64,
    /// `raw` mapped through the run's easing curve.
    pub eased: f64,
    /// Sample time, clamped to the run's end.
    pub at: Duration,
}

/// One fixed-duration progress run on the presentation clock.
///
/// A run does not own a clock. Callers feed it sample times; boundaries are computed from
/// `start + duration` so that chaining runs end-to-end never accumulates drift.
#[derive(Clone, Debug)]
pub struct TimelineRun {
    start: Duration,
    duration: Duration,
    ease: Ease,
    raw: f64,
    status: RunStatus,
}

impl TimelineRun {
    /// Eased run starting at `start`.
    pub fn new(start: Duration, duration: Duration, ease: Ease) -> Self {
        Self {
            start,
            duration,
            ease,
            raw: 0.0,
            status: RunStatus::Running,
        }
    }

    /// Linear run used as a fixed-duration timer.
    pub fn timer(start: Duration, duration: Duration) -> Self {
        Self::new(start, duration, Ease::Linear)
    }

    /// Start time of the run.
    pub fn start(&self) -> Duration {
        self.start
    }

    /// Run length.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Boundary at which the run completes.
    pub fn end(&self) -> Duration {
        self.start + self.duration
    }

    /// Current status.
    pub fn status(&self) -> RunStatus {
        self.status
    }

    /// Last emitted raw progress.
    pub fn progress(&self) -> f64 {
        self.raw
    }

    /// Sample the run at `now`.
    ///
    /// Returns `None` once the run is completed or cancelled. The tick that reaches progress
    /// 1.0 is still returned and flips the status to [`RunStatus::Completed`].
    pub fn tick(&mut self, now: Duration) -> Option<Tick> {
        if self.status != RunStatus::Running {
            return None;
        }
        let elapsed = now.saturating_sub(self.start);
        let raw = if self.duration.is_zero() || elapsed >= self.duration {
            1.0
        } else {
            (elapsed.as_secs_f64() / self.duration.as_secs_f64()).clamp(0.0, 1.0)
        };
        self.raw = self.raw.max(raw);
        if self.raw >= 1.0 {
            self.status = RunStatus::Completed;
        }
        Some(Tick {
            raw: self.raw,
            eased: self.ease.apply(self.raw),
            at: now.clamp(self.start, self.end()),
        })
    }

    /// Stop emitting ticks. Returns `true` if the run was still active; repeated calls are no-ops.
    pub fn cancel(&mut self) -> bool {
        if self.status == RunStatus::Running {
            self.status = RunStatus::Cancelled;
            true
        } else {
            false
        }
    }
}

/// Drive a single run to completion against `ticks`, calling `on_tick` for every sample.
///
/// The next tick is only pulled after `on_tick` returns, so slow tick work defers the following
/// sample instead of queueing a backlog. `cancel` is checked before every sample; a cancelled
/// run returns without calling `on_tick` again. The run starts at the first tick time.
pub fn run<T, F>(
    duration: Duration,
    ease: Ease,
    ticks: &mut T,
    cancel: &CancelToken,
    mut on_tick: F,
) -> RunStatus
where
    T: TickSource + ?Sized,
    F: FnMut(Tick),
{
    let mut active: Option<TimelineRun> = None;
    loop {
        if cancel.is_cancelled() {
            if let Some(r) = active.as_mut() {
                r.cancel();
            }
            return RunStatus::Cancelled;
        }
        let Some(now) = ticks.next_tick() else {
            return active.map_or(RunStatus::Running, |r| r.status());
        };
        let r = active.get_or_insert_with(|| TimelineRun::new(now, duration, ease));
        if let Some(tick) = r.tick(now) {
            on_tick(tick);
        }
        if r.status() == RunStatus::Completed {
            return RunStatus::Completed;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/scheduler.rs"]
mod tests;
