use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::foundation::error::{PinpointError, PinpointResult};
use crate::geometry::resolver::{DEFAULT_AREA_PADDING, DEFAULT_ZOOM_SCALE, GeometryResolver};
use crate::reveal::text::{RevealMode, TextReveal};

/// Presentation timing and framing options.
///
/// Keys are camelCase in JSON (`zoomScale`, `pointDisplayTimeMs`, ...); missing keys take their
/// defaults.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct PresentationConfig {
    /// Magnification for point annotations, `> 1`.
    pub zoom_scale: f64,
    /// Fraction of the view a framed area fills, `(0, 1]`.
    pub area_padding: f64,
    /// Zoom-in duration; zoom-out mirrors it.
    pub zoom_duration_ms: u64,
    /// Hold duration once an annotation is framed.
    pub point_display_time_ms: u64,
    /// Pause after the last annotation before the next lap.
    pub transition_delay_ms: u64,
    /// Typewriter character interval.
    pub type_writer_speed_ms: u64,
    /// Progress-coupled reveal speed relative to the zoom.
    pub text_reveal_rate: f64,
    /// Reveal strategy for the whole run.
    pub reveal_mode: RevealMode,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            zoom_scale: DEFAULT_ZOOM_SCALE,
            area_padding: DEFAULT_AREA_PADDING,
            zoom_duration_ms: 1000,
            point_display_time_ms: 4000,
            transition_delay_ms: 3000,
            type_writer_speed_ms: 50,
            text_reveal_rate: 1.5,
            reveal_mode: RevealMode::default(),
        }
    }
}

impl PresentationConfig {
    /// Parse from JSON text.
    pub fn from_json_str(s: &str) -> PinpointResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| PinpointError::serde(format!("presentation config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON config file.
    pub fn from_json_path(path: &Path) -> PinpointResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Durations and the reveal rate must be positive and the zoom settings resolvable.
    pub fn validate(&self) -> PinpointResult<()> {
        self.resolver()?;
        if self.zoom_duration_ms == 0 {
            return Err(PinpointError::validation("zoomDurationMs must be > 0"));
        }
        if self.point_display_time_ms == 0 {
            return Err(PinpointError::validation("pointDisplayTimeMs must be > 0"));
        }
        if self.type_writer_speed_ms == 0 {
            return Err(PinpointError::validation("typeWriterSpeedMs must be > 0"));
        }
        if !self.text_reveal_rate.is_finite() || self.text_reveal_rate <= 0.0 {
            return Err(PinpointError::validation("textRevealRate must be finite and > 0"));
        }
        Ok(())
    }

    pub(crate) fn resolver(&self) -> PinpointResult<GeometryResolver> {
        GeometryResolver::new(self.zoom_scale, self.area_padding)
    }

    pub(crate) fn text_reveal(&self) -> TextReveal {
        TextReveal::new(
            self.reveal_mode,
            self.text_reveal_rate,
            Duration::from_millis(self.type_writer_speed_ms),
        )
    }

    /// Zoom-in (and zoom-out) duration.
    pub fn zoom_duration(&self) -> Duration {
        Duration::from_millis(self.zoom_duration_ms)
    }

    /// Hold duration.
    pub fn hold_duration(&self) -> Duration {
        Duration::from_millis(self.point_display_time_ms)
    }

    /// Pause before wrapping back to the first item.
    pub fn transition_delay(&self) -> Duration {
        Duration::from_millis(self.transition_delay_ms)
    }

    /// One full lap over `items` playable annotations, including the wrap delay.
    pub fn lap_duration(&self, items: usize) -> Duration {
        let cycle = self.zoom_duration() * 2 + self.hold_duration();
        cycle * u32::try_from(items).unwrap_or(u32::MAX) + self.transition_delay()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/presentation/config.rs"]
mod tests;
