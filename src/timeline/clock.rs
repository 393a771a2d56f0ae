use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::core::{Fps, FrameIndex};

/// External pacing for timeline runs: yields sample times on the presentation clock.
pub trait TickSource {
    /// Block until the next tick is due and return its time, or `None` when exhausted.
    fn next_tick(&mut self) -> Option<Duration>;
}

/// Exact frame times `k / fps`, with no wall-clock involvement.
#[derive(Clone, Debug)]
pub struct FrameTicks {
    fps: Fps,
    next: u64,
    limit: Option<u64>,
}

impl FrameTicks {
    /// Ticks at `fps`, starting at zero.
    pub fn new(fps: Fps) -> Self {
        Self {
            fps,
            next: 0,
            limit: None,
        }
    }

    /// Stop after `frames` ticks.
    pub fn with_limit(mut self, frames: u64) -> Self {
        self.limit = Some(frames);
        self
    }

    /// Index of the frame the next tick will report.
    pub fn next_frame(&self) -> FrameIndex {
        FrameIndex(self.next)
    }
}

impl TickSource for FrameTicks {
    fn next_tick(&mut self) -> Option<Duration> {
        if self.limit.is_some_and(|l| self.next >= l) {
            return None;
        }
        let t = self.fps.frame_time(FrameIndex(self.next));
        self.next += 1;
        Some(t)
    }
}

/// Wall-clock ticks on a fixed interval, measured from construction.
///
/// When tick work overruns one or more intervals, the missed boundaries are dropped and the
/// next tick fires immediately with the current time.
#[derive(Debug)]
pub struct RealtimeTicks {
    origin: Instant,
    interval: Duration,
    next: u64,
    skipped: u64,
}

impl RealtimeTicks {
    /// Wall-clock ticks every `interval`.
    pub fn new(interval: Duration) -> Self {
        Self {
            origin: Instant::now(),
            interval: interval.max(Duration::from_millis(1)),
            next: 0,
            skipped: 0,
        }
    }

    /// Pace to a display refresh rate.
    pub fn at_fps(fps: Fps) -> Self {
        Self::new(fps.frame_time(FrameIndex(1)))
    }

    /// Boundaries dropped so far because tick work overran.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl TickSource for RealtimeTicks {
    fn next_tick(&mut self) -> Option<Duration> {
        let step = self.interval.as_nanos();
        let boundary = Duration::from_nanos(
            u64::try_from(step * u128::from(self.next)).unwrap_or(u64::MAX),
        );
        let now = self.origin.elapsed();
        if now < boundary {
            std::thread::sleep(boundary - now);
            self.next += 1;
            return Some(self.origin.elapsed());
        }
        let current = u64::try_from(now.as_nanos() / step).unwrap_or(u64::MAX);
        self.skipped += current.saturating_sub(self.next);
        self.next = current.saturating_add(1);
        Some(now)
    }
}

impl TickSource for std::vec::IntoIter<Duration> {
    fn next_tick(&mut self) -> Option<Duration> {
        self.next()
    }
}

/// Shared stop flag observed at the next tick boundary.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// `true` once cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/timeline/clock.rs"]
mod tests;
