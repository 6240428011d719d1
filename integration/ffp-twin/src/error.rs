use ffp_twin_core::{ErrorCategory, PipeError};
use thiserror::Error;

use crate::config::StageKind;

/// Errors from configuring or running a whole pipeline.
#[derive(Debug, Error)]
pub enum TwinError {
    /// Invalid or unreadable configuration.
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid pipeline configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// Error while preparing memory or streams before any stage ran.
    #[error(transparent)]
    Setup(#[from] PipeError),

    /// A stage stopped with an error.
    #[error("{stage} stage failed: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: PipeError,
    },

    /// The display sink stopped with an error.
    #[error("display failed: {0}")]
    Display(#[source] PipeError),

    /// A stage thread panicked.
    #[error("{0} thread panicked")]
    Panicked(&'static str),
}

impl TwinError {
    /// Category of the underlying pipeline error, if there is one.
    pub fn category(&self) -> ErrorCategory {
        match self {
            TwinError::Config(_) | TwinError::Json(_) => ErrorCategory::Config,
            TwinError::Setup(e) | TwinError::Stage { source: e, .. } | TwinError::Display(e) => {
                e.category()
            }
            TwinError::Panicked(_) => ErrorCategory::Protocol,
        }
    }
}
