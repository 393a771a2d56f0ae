use std::time::Duration;

use crate::foundation::error::{PinpointError, PinpointResult};

pub use kurbo::{Affine, BezPath, Circle, Point, Rect, Vec2};

/// Absolute 0-based frame index in capture timeline space.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

/// Frames-per-second represented as a rational `num/den`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    /// Numerator (frames).
    pub num: u32,
    /// Denominator (seconds), must be non-zero.
    pub den: u32,
}

impl Fps {
    /// Create a validated FPS value.
    pub fn new(num: u32, den: u32) -> PinpointResult<Self> {
        if den == 0 {
            return Err(PinpointError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(PinpointError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    /// Whole-number frame rate, e.g. `Fps::whole(60)`.
    pub fn whole(num: u32) -> PinpointResult<Self> {
        Self::new(num, 1)
    }

    /// Convert to floating-point FPS.
    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Presentation time of frame `k`, floored to whole nanoseconds.
    ///
    /// Computed from the frame index alone so frame times never accumulate rounding error.
    pub fn frame_time(self, frame: FrameIndex) -> Duration {
        let nanos = u128::from(frame.0) * 1_000_000_000u128 * u128::from(self.den)
            / u128::from(self.num);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }

    /// Number of whole frames needed to cover `span` (ceil semantics).
    pub fn frames_covering(self, span: Duration) -> u64 {
        let num = span.as_nanos() * u128::from(self.num);
        let den = 1_000_000_000u128 * u128::from(self.den);
        u64::try_from(num.div_ceil(den)).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
