/// Convenience result type used across the viewer pipeline.
pub type ViewerResult<T> = Result<T, ViewerError>;

/// Top-level error taxonomy used by viewer render stages.
///
/// Render stages propagate these; [`crate::ViewerInstance::render`] folds them into a
/// [`crate::RenderStatus`] so callers never see an error for an aborted or failed frame.
#[derive(thiserror::Error, Debug)]
pub enum ViewerError {
    /// No active input, or its region of definition cannot be determined.
    #[error("region unavailable: {0}")]
    RegionUnavailable(String),

    /// The upstream graph returned no image for the requested region.
    #[error("upstream render failed: {0}")]
    UpstreamFailure(String),

    /// Cancellation observed at a checkpoint.
    #[error("render aborted at {0}")]
    Aborted(&'static str),

    /// Invalid options or parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors while reading or parsing configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ViewerError {
    /// Build a [`ViewerError::RegionUnavailable`] value.
    pub fn region_unavailable(msg: impl Into<String>) -> Self {
        Self::RegionUnavailable(msg.into())
    }

    /// Build a [`ViewerError::UpstreamFailure`] value.
    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamFailure(msg.into())
    }

    /// Build a [`ViewerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ViewerError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Return `true` for cancellation, which is never a user-facing failure.
    pub fn is_abort(&self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
