//! Host commands - Strongly typed representation of the worker protocol
//!
//! Every command arrives as a JSON object tagged by `type`, e.g.
//! `{"type":"generate","data":[{"role":"user","content":"Hi"}],"model_type":"phi"}`.

use serde::{Deserialize, Serialize};

use crate::{entities::ChatMessage, errors::DomainError, value_objects::ModelVariant};

/// All commands the worker accepts from its host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerCommand {
    /// Probe compute device availability
    Check,

    /// Load, cache and warm up the pipeline of a variant
    Load {
        /// Variant to load (worker default when absent)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_type: Option<ModelVariant>,
    },

    /// Run one generation session over a conversation
    Generate {
        /// Conversation messages
        data: Vec<ChatMessage>,
        /// Variant to generate with (worker default when absent)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        model_type: Option<ModelVariant>,
    },

    /// Cooperatively cancel the active generation
    Interrupt,

    /// Clear the cancellation state
    Reset,
}

impl WorkerCommand {
    /// Decode a command from one JSON document
    pub fn from_json(text: &str) -> Result<Self, DomainError> {
        serde_json::from_str(text).map_err(|e| DomainError::InvalidCommand(e.to_string()))
    }

    /// Protocol name of the command
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Load { .. } => "load",
            Self::Generate { .. } => "generate",
            Self::Interrupt => "interrupt",
            Self::Reset => "reset",
        }
    }

    /// Variant named by the command, if any
    #[must_use]
    pub const fn model_type(&self) -> Option<ModelVariant> {
        match self {
            Self::Load { model_type } | Self::Generate { model_type, .. } => *model_type,
            Self::Check | Self::Interrupt | Self::Reset => None,
        }
    }
}
