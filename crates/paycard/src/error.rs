// File: src/error.rs
// Purpose: Errors surfaced by the widget

use thiserror::Error;

pub use paycard_validation::mask::MaskError;

/// Errors surfaced by the widget to its host
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("widget is not mounted")]
    NotMounted,

    #[error("no form is rendered")]
    NotReady,

    #[error("a submission is already in progress")]
    SubmissionInProgress,

    #[error("failed to load form configuration: {0:#}")]
    Config(anyhow::Error),

    #[error("payment submission failed: {0:#}")]
    Payment(anyhow::Error),

    #[error("document error: {0}")]
    Document(String),

    #[error(transparent)]
    Mask(#[from] MaskError),
}

pub type Result<T, E = WidgetError> = std::result::Result<T, E>;
