/// Progress curves applied to raw timeline progress.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Ease {
    /// Raw progress, used for timers and opacity.
    Linear,
    /// Cubic ease-in/out, used for every scale and position interpolation.
    #[default]
    InOutCubic,
}

impl Ease {
    /// Map normalized progress `t` (clamped to `[0, 1]`) through this curve.
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - ((-2.0 * t + 2.0).powi(3) / 2.0)
                }
            }
        }
    }
}

/// Raw progress sped up by `rate` and clamped to 1, so a coupled effect finishes early.
pub fn accelerated(progress: f64, rate: f64) -> f64 {
    (progress * rate).clamp(0.0, 1.0)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/ease.rs"]
mod tests;
