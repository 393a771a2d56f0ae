/// Convenience result type used across pinpoint.
pub type PinpointResult<T> = Result<T, PinpointError>;

/// Top-level error taxonomy used by engine APIs.
///
/// A cancelled timeline run is not an error; it is reported as
/// [`RunStatus::Cancelled`](crate::RunStatus::Cancelled).
#[derive(thiserror::Error, Debug)]
pub enum PinpointError {
    /// Invalid user-provided configuration or annotation data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A presentation or capture was requested with no playable annotations.
    #[error("annotation sequence is empty")]
    EmptySequence,

    /// An area annotation has no extent and cannot be framed.
    #[error("degenerate geometry: area {width}x{height} cannot be framed")]
    DegenerateGeometry {
        /// Area width in percent of the image width.
        width: f64,
        /// Area height in percent of the image height.
        height: f64,
    },

    /// No backing image was available.
    #[error("no image is loaded")]
    MissingImage,

    /// The encoding sink could not be configured; recording did not start.
    #[error("capture setup error: {0}")]
    CaptureSetup(String),

    /// Errors while rendering or encoding frames.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PinpointError {
    /// Build a [`PinpointError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PinpointError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }

    /// Build a [`PinpointError::CaptureSetup`] value.
    pub fn capture_setup(msg: impl Into<String>) -> Self {
        Self::CaptureSetup(msg.into())
    }

    /// Build a [`PinpointError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` for errors that only affect a single annotation and should be skipped over.
    pub fn is_item_local(&self) -> bool {
        matches!(self, Self::DegenerateGeometry { .. } | Self::MissingImage)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
