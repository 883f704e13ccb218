//! Application-level errors

use ai_core::InferenceError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApplicationError {
    /// Device, loading or generation error
    #[error(transparent)]
    Inference(#[from] InferenceError),

    /// A generate command arrived while another generation is running
    #[error("generation already in progress")]
    GenerationInProgress,
}
