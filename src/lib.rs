//! Pinpoint turns an annotated still image into a guided presentation.
//!
//! Annotations (points or rectangular areas, each with a description) are visited in order: the
//! view zooms into each one, reveals its description, holds, and zooms back out. The same
//! deterministic state machine drives:
//!
//! - live playback through a [`Stage`] (for example [`CssStage`]), paced by a [`TickSource`]
//! - offscreen capture through a [`CaptureSession`], streamed into a [`FrameSink`] such as
//!   [`FfmpegSink`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod assets;
mod foundation;

pub(crate) mod animation;
pub(crate) mod annotation;
pub(crate) mod capture;
/// Encoding sinks.
pub mod encode;
pub(crate) mod geometry;
pub(crate) mod presentation;
pub(crate) mod reveal;
pub(crate) mod timeline;

pub use crate::foundation::core::{Affine, BezPath, Fps, FrameIndex, Point, Rect, Vec2};
pub use crate::foundation::error::{PinpointError, PinpointResult};

pub use crate::animation::ease::{Ease, accelerated};
pub use crate::annotation::model::{
    Annotation, AnnotationId, Bounds, Draft, MIN_AREA_EXTENT_PCT, Shape,
};
pub use crate::annotation::store::{AnnotationSource, AnnotationStore};
pub use crate::assets::image::{ImageProvider, SourceImage, decode_image, load_image};
pub use crate::capture::config::{
    CaptureConfig, CaptureThreading, FPS_PRESETS, Quality, RenderTarget, Resolution,
};
pub use crate::capture::renderer::{
    CaptureRenderer, CaptureScene, FrameRGBA, FrameSnapshot, letterbox,
};
pub use crate::capture::session::{
    CaptureArtifact, CaptureSession, CaptureStats, CaptureStopHandle, PlannedFrame,
};
pub use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::geometry::resolver::{
    DEFAULT_AREA_PADDING, DEFAULT_ZOOM_SCALE, FocalTransform, FocusTarget, GeometryResolver,
};
pub use crate::presentation::config::PresentationConfig;
pub use crate::presentation::css::{CssStage, CssStyles};
pub use crate::presentation::presenter::{Caption, NullStage, Presenter, Stage, drive};
pub use crate::presentation::state::{Phase, PlaybackState};
pub use crate::reveal::text::{RevealMode, TextReveal, coupled_len, revealed_prefix};
pub use crate::timeline::clock::{CancelToken, FrameTicks, RealtimeTicks, TickSource};
pub use crate::timeline::scheduler::{RunStatus, Tick, TimelineRun, run};
