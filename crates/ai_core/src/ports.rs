//! Port definitions for the inference engine
//!
//! The numerical work (tokenization, model execution, artifact download) is
//! delegated to an engine. These traits are the seams an engine implements.

use std::{fmt, pin::Pin, sync::Arc};

use async_trait::async_trait;
use domain::{ChatMessage, PowerPreference, ProgressEvent, SamplingParams, VariantProfile};
use futures::Stream;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::error::InferenceError;

/// A negotiated handle to a compute backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputeAdapter {
    /// Power tier actually granted
    pub preference: PowerPreference,
    /// Backend-specific description of the device
    pub name: String,
}

impl ComputeAdapter {
    /// Create an adapter description
    pub fn new(preference: PowerPreference, name: impl Into<String>) -> Self {
        Self {
            preference,
            name: name.into(),
        }
    }
}

impl fmt::Display for ComputeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.preference)
    }
}

/// Model-ready input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoding {
    /// Token ids
    pub input_ids: Vec<u32>,
    /// One entry per token, 1 for attended positions
    pub attention_mask: Vec<u32>,
}

impl Encoding {
    /// Create an encoding attending to every token
    #[must_use]
    pub fn new(input_ids: Vec<u32>) -> Self {
        let attention_mask = vec![1; input_ids.len()];
        Self {
            input_ids,
            attention_mask,
        }
    }

    /// Number of tokens
    #[must_use]
    pub fn len(&self) -> usize {
        self.input_ids.len()
    }

    /// Whether the encoding holds no tokens
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.input_ids.is_empty()
    }
}

/// Receiver of artifact progress events
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Progress callback that drops every event
#[must_use]
pub fn ignore_progress() -> ProgressCallback {
    Arc::new(|_| {})
}

/// Stream of newly generated token ids (prompt excluded)
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<u32, InferenceError>> + Send>>;

/// Port for compute device negotiation
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ComputeBackend: Send + Sync {
    /// Request an adapter for a power preference; `None` when none matches
    async fn request_adapter(&self, preference: PowerPreference) -> Option<ComputeAdapter>;
}

/// Port for resolving a variant into tokenizer and model handles
#[async_trait]
pub trait ArtifactLoader: Send + Sync {
    /// Obtain the tokenizer of a variant
    async fn load_tokenizer(
        &self,
        profile: &VariantProfile,
        progress: ProgressCallback,
    ) -> Result<Arc<dyn Tokenizer>, InferenceError>;

    /// Obtain the model of a variant, bound to an adapter
    async fn load_model(
        &self,
        profile: &VariantProfile,
        adapter: &ComputeAdapter,
        progress: ProgressCallback,
    ) -> Result<Arc<dyn CausalModel>, InferenceError>;
}

/// Port for text <-> token conversion
pub trait Tokenizer: Send + Sync {
    /// Render a conversation with the model's chat template
    fn apply_chat_template(
        &self,
        messages: &[ChatMessage],
        add_generation_prompt: bool,
    ) -> Result<Encoding, InferenceError>;

    /// Encode raw text
    fn encode(&self, text: &str) -> Result<Encoding, InferenceError>;

    /// Decode token ids
    fn decode(&self, ids: &[u32], skip_special_tokens: bool) -> Result<String, InferenceError>;
}

/// Port for autoregressive generation
#[async_trait]
pub trait CausalModel: Send + Sync {
    /// Start generating after `input`
    ///
    /// The returned stream yields one new token per item and ends on the
    /// end-of-sequence token or after `params.max_new_tokens` tokens.
    /// Dropping the stream stops generation.
    async fn generate(
        &self,
        input: &Encoding,
        params: &SamplingParams,
    ) -> Result<TokenStream, InferenceError>;
}
