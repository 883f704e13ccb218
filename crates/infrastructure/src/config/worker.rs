//! Worker process settings

use domain::ModelVariant;
use serde::{Deserialize, Serialize};

/// Settings of the command loop and its channels
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Variant used when a command carries no `model_type`
    #[serde(default)]
    pub default_variant: ModelVariant,

    /// Capacity of the command channel between reader and router
    #[serde(default = "default_command_buffer_size")]
    pub command_buffer_size: usize,

    /// Capacity of the event channel between router and writer
    #[serde(default = "default_event_buffer_size")]
    pub event_buffer_size: usize,
}

const fn default_command_buffer_size() -> usize {
    64
}

const fn default_event_buffer_size() -> usize {
    256
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            default_variant: ModelVariant::default(),
            command_buffer_size: default_command_buffer_size(),
            event_buffer_size: default_event_buffer_size(),
        }
    }
}
