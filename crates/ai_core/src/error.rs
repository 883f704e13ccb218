//! Inference errors

use std::{fmt::Display, sync::Arc};

use thiserror::Error;

/// Errors that can occur while selecting a device, loading a pipeline or
/// generating text
///
/// Cloneable because a failed pipeline initialization is shared by every
/// caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InferenceError {
    /// No compute device satisfies any accepted power preference
    #[error("Compute device unavailable: no adapter found")]
    NoAdapterAvailable,

    /// Artifact fetch, parse or compile failed
    #[error("Model load failed: {0}")]
    ModelLoadFailure(String),

    /// Rendering, tokenization, generation or decoding failed
    #[error("Generation failed: {0}")]
    GenerationFailure(String),
}

impl InferenceError {
    /// Wrap an artifact loading cause
    pub fn model_load(cause: impl Display) -> Self {
        Self::ModelLoadFailure(cause.to_string())
    }

    /// Wrap a generation cause
    pub fn generation(cause: impl Display) -> Self {
        Self::GenerationFailure(cause.to_string())
    }
}

impl From<Arc<Self>> for InferenceError {
    fn from(err: Arc<Self>) -> Self {
        Arc::unwrap_or_clone(err)
    }
}
