use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::foundation::core::Fps;
use crate::foundation::error::{PinpointError, PinpointResult};

/// Output resolution choice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resolution {
    /// 1920x1080.
    P1080,
    /// 2560x1440.
    P1440,
    /// 3840x2160.
    P2160,
    /// Explicit size, see [`Resolution::custom`].
    Custom {
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
}

impl Resolution {
    /// Narrowest custom width.
    pub const MIN_WIDTH: u32 = 1280;
    /// Widest custom width.
    pub const MAX_WIDTH: u32 = 7680;
    /// Shortest custom height.
    pub const MIN_HEIGHT: u32 = 720;
    /// Tallest custom height.
    pub const MAX_HEIGHT: u32 = 4320;

    /// Custom size clamped to the supported range and rounded down to even numbers.
    pub fn custom(width: u32, height: u32) -> Self {
        let width = width.clamp(Self::MIN_WIDTH, Self::MAX_WIDTH) & !1;
        let height = height.clamp(Self::MIN_HEIGHT, Self::MAX_HEIGHT) & !1;
        Self::Custom { width, height }
    }

    /// Output size in pixels.
    pub fn dimensions(self) -> (u32, u32) {
        match self {
            Self::P1080 => (1920, 1080),
            Self::P1440 => (2560, 1440),
            Self::P2160 => (3840, 2160),
            Self::Custom { width, height } => (width, height),
        }
    }
}

impl FromStr for Resolution {
    type Err = PinpointError;

    /// Accepts `1080p`, `1440p`, `4k`/`2160p`, or `WIDTHxHEIGHT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "1080p" => Ok(Self::P1080),
            "1440p" => Ok(Self::P1440),
            "4k" | "2160p" => Ok(Self::P2160),
            other => {
                let (w, h) = other.split_once('x').ok_or_else(|| {
                    PinpointError::validation(format!("unknown resolution '{s}'"))
                })?;
                let parse = |v: &str| {
                    v.trim().parse::<u32>().map_err(|e| {
                        PinpointError::validation(format!("invalid resolution '{s}': {e}"))
                    })
                };
                Ok(Self::custom(parse(w)?, parse(h)?))
            }
        }
    }
}

/// Encoder quality preset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Quality {
    /// 8 Mbit/s.
    #[default]
    High,
    /// 4 Mbit/s.
    Medium,
    /// 2 Mbit/s.
    Low,
}

impl Quality {
    /// Target bitrate in bits per second.
    pub fn bitrate(self) -> u64 {
        match self {
            Self::High => 8_000_000,
            Self::Medium => 4_000_000,
            Self::Low => 2_000_000,
        }
    }

    /// Lowercase name used in output file names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = PinpointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(PinpointError::validation(format!("unknown quality '{s}'"))),
        }
    }
}

/// Frame rates offered by the settings panel; any non-zero whole rate is accepted.
pub const FPS_PRESETS: [u32; 3] = [60, 30, 24];

/// Fixed output surface and encoder parameters for one recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderTarget {
    /// Surface width in pixels.
    pub width: u32,
    /// Surface height in pixels.
    pub height: u32,
    /// Output frame rate.
    pub fps: Fps,
    /// Bits per second.
    pub bitrate: u64,
}

impl RenderTarget {
    /// Validated target.
    pub fn new(width: u32, height: u32, fps: Fps, bitrate: u64) -> PinpointResult<Self> {
        let target = Self {
            width,
            height,
            fps,
            bitrate,
        };
        target.validate()?;
        Ok(target)
    }

    /// Sizes must be non-zero and fit in `u16`; fps and bitrate must be non-zero.
    pub fn validate(&self) -> PinpointResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(PinpointError::validation("render target size must be non-zero"));
        }
        if self.width > u32::from(u16::MAX) || self.height > u32::from(u16::MAX) {
            return Err(PinpointError::validation(
                "render target size must fit in u16",
            ));
        }
        if self.fps.num == 0 || self.fps.den == 0 {
            return Err(PinpointError::validation("render target fps must be non-zero"));
        }
        if self.bitrate == 0 {
            return Err(PinpointError::validation("render target bitrate must be > 0"));
        }
        Ok(())
    }
}

/// Threading and chunking controls for frame rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureThreading {
    /// Render chunks on a rayon pool when `true`.
    pub parallel: bool,
    /// Frames per chunk; also the stop-check granularity in parallel mode.
    pub chunk_size: usize,
    /// Optional explicit worker thread count.
    pub threads: Option<usize>,
    /// Reuse pixels for frames whose visual state is unchanged.
    pub static_frame_elision: bool,
}

impl Default for CaptureThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_size: 32,
            threads: None,
            static_frame_elision: true,
        }
    }
}

/// Everything fixed at the start of a recording.
#[derive(Clone, Debug)]
pub struct CaptureConfig {
    /// Output surface and encoder parameters.
    pub target: RenderTarget,
    /// Quality label used in the output file name.
    pub quality: Quality,
    /// Still frames before the first zoom.
    pub lead_in: Duration,
    /// Still frames after the last zoom-out.
    pub lead_out: Duration,
    /// Letterbox color (straight RGBA8).
    pub background: [u8; 4],
    /// Caption font (TTF/OTF bytes). Without it captions render as an empty band.
    pub font: Option<Arc<Vec<u8>>>,
    /// Rendering parallelism and frame elision.
    pub threading: CaptureThreading,
}

impl CaptureConfig {
    /// Build from settings-panel choices.
    pub fn new(resolution: Resolution, quality: Quality, fps: u32) -> PinpointResult<Self> {
        let (width, height) = resolution.dimensions();
        let target = RenderTarget::new(width, height, Fps::whole(fps)?, quality.bitrate())?;
        Ok(Self {
            quality,
            ..Self::with_target(target)
        })
    }

    /// Build around an explicit target of any size.
    pub fn with_target(target: RenderTarget) -> Self {
        Self {
            target,
            quality: Quality::default(),
            lead_in: Duration::from_millis(500),
            lead_out: Duration::from_millis(500),
            background: [0, 0, 0, 255],
            font: None,
            threading: CaptureThreading::default(),
        }
    }

    /// Check the target and threading options.
    pub fn validate(&self) -> PinpointResult<()> {
        self.target.validate()?;
        if self.threading.threads == Some(0) {
            return Err(PinpointError::validation(
                "capture threading 'threads' must be >= 1 when set",
            ));
        }
        Ok(())
    }

    /// Deterministic output name, e.g. `presentation_1920x1080_high_60fps.mp4`.
    pub fn file_name(&self) -> String {
        let fps = self.target.fps;
        let fps_label = if fps.den == 1 {
            fps.num.to_string()
        } else {
            format!("{:.2}", fps.as_f64())
        };
        format!(
            "presentation_{}x{}_{}_{}fps.mp4",
            self.target.width, self.target.height, self.quality, fps_label
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/config.rs"]
mod tests;
