//! Configuration for the inference core

use domain::{DEFAULT_MAX_NEW_TOKENS, PowerPreference};
use serde::{Deserialize, Serialize};

/// Configuration for device selection, warm-up and generation bounds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Power preferences to negotiate, in order
    #[serde(default = "default_adapter_preferences")]
    pub adapter_preferences: Vec<PowerPreference>,

    /// Hard cap on newly generated tokens per request
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Input of the one-token warm-up pass
    #[serde(default = "default_warm_up_prompt")]
    pub warm_up_prompt: String,
}

fn default_adapter_preferences() -> Vec<PowerPreference> {
    vec![PowerPreference::HighPerformance, PowerPreference::LowPower]
}

const fn default_max_new_tokens() -> u32 {
    DEFAULT_MAX_NEW_TOKENS
}

fn default_warm_up_prompt() -> String {
    "a".to_string()
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            adapter_preferences: default_adapter_preferences(),
            max_new_tokens: default_max_new_tokens(),
            warm_up_prompt: default_warm_up_prompt(),
        }
    }
}
