//! Weight precision tag passed to the artifact loader

use std::fmt;

use serde::{Deserialize, Serialize};

/// Quantization / precision of model weights
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantization {
    /// 4-bit weights with fp16 activations
    Q4F16,
    /// 4-bit weights
    Q4,
    /// Half precision
    Fp16,
    /// Full precision
    Fp32,
}

impl Quantization {
    /// Tag understood by artifact loaders
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Q4F16 => "q4f16",
            Self::Q4 => "q4",
            Self::Fp16 => "fp16",
            Self::Fp32 => "fp32",
        }
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_matches_tag() {
        for quant in [
            Quantization::Q4F16,
            Quantization::Q4,
            Quantization::Fp16,
            Quantization::Fp32,
        ] {
            let json = serde_json::to_string(&quant).unwrap();
            assert_eq!(json, format!("\"{}\"", quant.as_str()));
        }
    }
}
