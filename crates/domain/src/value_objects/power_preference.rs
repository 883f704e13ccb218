//! Power preference hint used when negotiating a compute adapter

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Power tier requested from (and granted by) the compute backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerPreference {
    /// Discrete or otherwise fastest available device
    HighPerformance,
    /// Integrated or battery-friendly device
    LowPower,
}

impl PowerPreference {
    /// Wire name of the preference
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::HighPerformance => "high-performance",
            Self::LowPower => "low-power",
        }
    }
}

impl fmt::Display for PowerPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PowerPreference {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high-performance" | "high_performance" => Ok(Self::HighPerformance),
            "low-power" | "low_power" => Ok(Self::LowPower),
            _ => Err(DomainError::InvalidPowerPreference(s.to_string())),
        }
    }
}
