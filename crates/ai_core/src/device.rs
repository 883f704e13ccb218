//! Compute device selection with power-preference fallback

use std::{fmt, sync::Arc};

use domain::PowerPreference;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::InferenceError,
    ports::{ComputeAdapter, ComputeBackend},
};

/// Negotiates a compute adapter, walking an ordered list of power preferences
///
/// No capability probing is done beyond availability: the first preference
/// for which the backend hands out an adapter wins.
pub struct DeviceSelector {
    backend: Arc<dyn ComputeBackend>,
    preferences: Vec<PowerPreference>,
}

impl fmt::Debug for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceSelector")
            .field("preferences", &self.preferences)
            .finish_non_exhaustive()
    }
}

impl DeviceSelector {
    /// Create a selector with an explicit preference order
    pub fn new(backend: Arc<dyn ComputeBackend>, preferences: Vec<PowerPreference>) -> Self {
        Self {
            backend,
            preferences,
        }
    }

    /// Create a selector trying high-performance, then low-power
    pub fn with_defaults(backend: Arc<dyn ComputeBackend>) -> Self {
        Self::new(
            backend,
            vec![PowerPreference::HighPerformance, PowerPreference::LowPower],
        )
    }

    /// Preference order
    #[must_use]
    pub fn preferences(&self) -> &[PowerPreference] {
        &self.preferences
    }

    /// Negotiate an adapter
    #[instrument(skip(self))]
    pub async fn select_adapter(&self) -> Result<ComputeAdapter, InferenceError> {
        for (attempt, preference) in self.preferences.iter().enumerate() {
            let Some(adapter) = self.backend.request_adapter(*preference).await else {
                debug!(preference = %preference, "No adapter for preference");
                continue;
            };

            if attempt > 0 {
                warn!(
                    preferred = %self.preferences[0],
                    granted = %adapter.preference,
                    "Preferred adapter not available, falling back"
                );
            }
            info!(adapter = %adapter, "Compute adapter selected");
            return Ok(adapter);
        }

        warn!(tried = ?self.preferences, "No compute adapter available");
        Err(InferenceError::NoAdapterAvailable)
    }
}
