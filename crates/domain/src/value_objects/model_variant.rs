//! Model variant - Identifies which pretrained model/tokenizer pair to run

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{
    entities::{SamplingParams, VariantProfile},
    errors::DomainError,
    value_objects::Quantization,
};

/// Supported model variants
///
/// The table of variants is fixed at build time. Each variant resolves to a
/// static [`VariantProfile`] through [`ModelVariant::profile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ModelVariant {
    /// Llama 3.2 1B Instruct, greedy decoding
    #[default]
    Llama,
    /// Phi-3.5 mini Instruct, low-temperature top-k sampling
    Phi,
    /// DeepSeek R1 distilled into Qwen 1.5B, greedy decoding
    DeepSeek,
}

impl ModelVariant {
    /// All variants in table order
    pub const ALL: [Self; 3] = [Self::Llama, Self::Phi, Self::DeepSeek];

    /// Get the config key for this variant
    #[must_use]
    pub const fn config_key(&self) -> &'static str {
        match self {
            Self::Llama => "llama",
            Self::Phi => "phi",
            Self::DeepSeek => "deepseek",
        }
    }

    /// Get the display name for this variant
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Llama => "Llama 3.2",
            Self::Phi => "Phi-3.5",
            Self::DeepSeek => "DeepSeek R1",
        }
    }

    /// Parse from config string (case-insensitive, `default` maps to Llama)
    #[must_use]
    pub fn from_config(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "llama" | "default" => Some(Self::Llama),
            "phi" => Some(Self::Phi),
            "deepseek" | "deepseek-r1" => Some(Self::DeepSeek),
            _ => None,
        }
    }

    /// Static profile of this variant
    #[must_use]
    pub const fn profile(&self) -> VariantProfile {
        match self {
            Self::Llama => VariantProfile {
                model_id: "onnx-community/Llama-3.2-1B-Instruct-q4f16",
                quantization: Quantization::Q4F16,
                use_external_data_format: false,
                sampling: SamplingParams::greedy(),
            },
            Self::Phi => VariantProfile {
                model_id: "onnx-community/Phi-3.5-mini-instruct-onnx-web",
                quantization: Quantization::Q4F16,
                use_external_data_format: true,
                sampling: SamplingParams::top_k(0.2, 3),
            },
            Self::DeepSeek => VariantProfile {
                model_id: "onnx-community/DeepSeek-R1-Distill-Qwen-1.5B-ONNX",
                quantization: Quantization::Q4F16,
                use_external_data_format: false,
                sampling: SamplingParams::greedy(),
            },
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.config_key())
    }
}

impl FromStr for ModelVariant {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_config(s).ok_or_else(|| DomainError::UnknownVariant(s.to_string()))
    }
}

impl TryFrom<String> for ModelVariant {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}
