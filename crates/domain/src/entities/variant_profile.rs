//! Static per-variant profile: artifact reference, precision and sampling

use serde::Serialize;

use crate::value_objects::Quantization;

/// Hard cap on newly generated tokens for every variant
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 1024;

/// Sampling policy of a variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingParams {
    /// Whether to sample (false = greedy decoding)
    pub do_sample: bool,
    /// Sampling temperature, only meaningful when sampling
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Restrict sampling to the k most likely candidates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    /// Maximum number of new tokens
    pub max_new_tokens: u32,
}

impl SamplingParams {
    /// Deterministic decoding
    #[must_use]
    pub const fn greedy() -> Self {
        Self {
            do_sample: false,
            temperature: None,
            top_k: None,
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }

    /// Temperature sampling over the `k` most likely tokens
    #[must_use]
    pub const fn top_k(temperature: f32, k: u32) -> Self {
        Self {
            do_sample: true,
            temperature: Some(temperature),
            top_k: Some(k),
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
        }
    }

    /// Override the new-token cap
    #[must_use]
    pub const fn with_max_new_tokens(mut self, max_new_tokens: u32) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self::greedy()
    }
}

/// Everything the artifact loader and the generation loop need to know about
/// a variant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariantProfile {
    /// Opaque pretrained-artifact reference
    pub model_id: &'static str,
    /// Weight precision
    pub quantization: Quantization,
    /// Whether weights live in external data files next to the graph
    pub use_external_data_format: bool,
    /// Sampling policy
    pub sampling: SamplingParams,
}
