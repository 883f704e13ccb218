//! Loopback engine configuration

use domain::PowerPreference;
use serde::{Deserialize, Serialize};

/// Behavior of the loopback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// Power tiers the simulated backend grants; empty means no device
    #[serde(default = "default_adapters")]
    pub adapters: Vec<PowerPreference>,

    /// Name reported for granted adapters
    #[serde(default = "default_adapter_name")]
    pub adapter_name: String,

    /// Delay before each generated token, in milliseconds
    #[serde(default)]
    pub token_delay_ms: u64,

    /// Simulated artifact fetch time, in milliseconds
    #[serde(default)]
    pub load_delay_ms: u64,

    /// Text put in front of the echoed user message
    #[serde(default = "default_reply_prefix")]
    pub reply_prefix: String,
}

fn default_adapters() -> Vec<PowerPreference> {
    vec![PowerPreference::HighPerformance, PowerPreference::LowPower]
}

fn default_adapter_name() -> String {
    "Loopback Adapter".to_string()
}

fn default_reply_prefix() -> String {
    "You said: ".to_string()
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            adapters: default_adapters(),
            adapter_name: default_adapter_name(),
            token_delay_ms: 0,
            load_delay_ms: 0,
            reply_prefix: default_reply_prefix(),
        }
    }
}

impl LoopbackConfig {
    /// Configuration whose backend grants no adapter
    #[must_use]
    pub fn without_adapters() -> Self {
        Self {
            adapters: Vec::new(),
            ..Self::default()
        }
    }

    /// Configuration that grants only the given tiers
    #[must_use]
    pub fn with_adapters(adapters: Vec<PowerPreference>) -> Self {
        Self {
            adapters,
            ..Self::default()
        }
    }

    /// Set the per-token delay
    #[must_use]
    pub const fn with_token_delay_ms(mut self, token_delay_ms: u64) -> Self {
        self.token_delay_ms = token_delay_ms;
        self
    }
}
