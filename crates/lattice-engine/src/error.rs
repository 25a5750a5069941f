use thiserror::Error;

use crate::config::ConfigError;

/// Errors produced by the instanced renderer.
///
/// Every variant names the stage it came from so a single log line is enough
/// to locate the failure.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Buffer, texture or pipeline allocation was rejected.
    #[error("{stage}: resource creation failed: {reason}")]
    ResourceCreation { stage: &'static str, reason: String },

    /// Shader source failed to parse or validate.
    #[error("{stage}: shader compilation failed:\n{diagnostic}")]
    ShaderCompile { stage: &'static str, diagnostic: String },

    /// Shader compiled but does not match the pipeline interface.
    #[error("{stage}: shader link failed: {diagnostic}")]
    ShaderLink { stage: &'static str, diagnostic: String },

    /// Instance write outside `[0, count)`.
    #[error("instance table: index {index} out of range (count {count})")]
    IndexOutOfRange { index: usize, count: usize },

    /// Device (or its surface) became unusable mid-loop.
    #[error("device lost: {reason}")]
    DeviceLost { reason: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl RenderError {
    pub(crate) fn resource(stage: &'static str, reason: impl Into<String>) -> Self {
        Self::ResourceCreation { stage, reason: reason.into() }
    }

    /// Returns true when the frame loop must stop.
    ///
    /// `IndexOutOfRange` is a programmer error local to one write; everything
    /// else leaves the renderer without a usable device or pipeline.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::IndexOutOfRange { .. })
    }
}

pub type Result<T, E = RenderError> = std::result::Result<T, E>;
