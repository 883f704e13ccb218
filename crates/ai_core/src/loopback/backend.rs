//! Simulated compute backend

use async_trait::async_trait;
use domain::PowerPreference;
use tracing::trace;

use super::LoopbackConfig;
use crate::ports::{ComputeAdapter, ComputeBackend};

/// Grants an adapter for every configured power tier
#[derive(Debug, Clone)]
pub struct LoopbackBackend {
    available: Vec<PowerPreference>,
    adapter_name: String,
}

impl LoopbackBackend {
    pub fn new(config: &LoopbackConfig) -> Self {
        Self {
            available: config.adapters.clone(),
            adapter_name: config.adapter_name.clone(),
        }
    }
}

#[async_trait]
impl ComputeBackend for LoopbackBackend {
    async fn request_adapter(&self, preference: PowerPreference) -> Option<ComputeAdapter> {
        trace!(preference = %preference, "Adapter requested");
        self.available
            .contains(&preference)
            .then(|| ComputeAdapter::new(preference, self.adapter_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn grants_only_configured_tiers() {
        let backend =
            LoopbackBackend::new(&LoopbackConfig::with_adapters(vec![PowerPreference::LowPower]));

        assert!(
            backend
                .request_adapter(PowerPreference::HighPerformance)
                .await
                .is_none()
        );
        let adapter = backend
            .request_adapter(PowerPreference::LowPower)
            .await
            .unwrap();
        assert_eq!(adapter.preference, PowerPreference::LowPower);
        assert_eq!(adapter.name, "Loopback Adapter");
    }
}
