//! Application configuration
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! TOML file, then `LLM_WORKER_*` environment variables (`__` separates
//! sections, e.g. `LLM_WORKER_WORKER__DEFAULT_VARIANT=phi`).

mod worker;

use std::{collections::HashMap, path::Path};

use ai_core::{InferenceConfig, loopback::LoopbackConfig};
use application::RouterConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::telemetry::TelemetryConfig;

pub use worker::WorkerConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "LLM_WORKER";

/// Default configuration file name, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Values were read but are not usable
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Command loop settings
    #[serde(default)]
    pub worker: WorkerConfig,

    /// Device selection, warm-up and token limit
    #[serde(default)]
    pub inference: InferenceConfig,

    /// Loopback engine behavior
    #[serde(default)]
    pub loopback: LoopbackConfig,

    /// Log output
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load from `config.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None, None)
    }

    /// Load from an explicit file (which must exist) and the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Self::build(Some(path), None)
    }

    fn build(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let builder = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        debug!(default_variant = %config.worker.default_variant, "Configuration loaded");
        Ok(config)
    }

    /// Reject values the worker cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.inference.adapter_preferences.is_empty() {
            return Err(ConfigError::Invalid(
                "inference.adapter_preferences must not be empty".to_string(),
            ));
        }
        if self.inference.max_new_tokens == 0 {
            return Err(ConfigError::Invalid(
                "inference.max_new_tokens must be greater than 0".to_string(),
            ));
        }
        if self.worker.command_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "worker.command_buffer_size must be greater than 0".to_string(),
            ));
        }
        if self.worker.event_buffer_size == 0 {
            return Err(ConfigError::Invalid(
                "worker.event_buffer_size must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Settings handed to the command router
    pub fn router_config(&self) -> RouterConfig {
        RouterConfig {
            default_variant: self.worker.default_variant,
            inference: self.inference.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use domain::{ModelVariant, PowerPreference};

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        )
    }

    fn toml_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.worker.default_variant, ModelVariant::Llama);
        assert_eq!(config.inference.max_new_tokens, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_sources_yield_defaults() {
        let config = AppConfig::build(None, env(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn file_values_override_defaults() {
        let file = toml_file(
            r#"
            [worker]
            default_variant = "deepseek"
            event_buffer_size = 32

            [inference]
            adapter_preferences = ["low-power"]

            [loopback]
            token_delay_ms = 15
            "#,
        );

        let config = AppConfig::build(Some(file.path()), env(&[])).unwrap();

        assert_eq!(config.worker.default_variant, ModelVariant::DeepSeek);
        assert_eq!(config.worker.event_buffer_size, 32);
        assert_eq!(config.worker.command_buffer_size, 64);
        assert_eq!(
            config.inference.adapter_preferences,
            vec![PowerPreference::LowPower]
        );
        assert_eq!(config.loopback.token_delay_ms, 15);
    }

    #[test]
    fn environment_overrides_file() {
        let file = toml_file("[worker]\ndefault_variant = \"deepseek\"\n");

        let config = AppConfig::build(
            Some(file.path()),
            env(&[
                ("LLM_WORKER_WORKER__DEFAULT_VARIANT", "phi"),
                ("LLM_WORKER_TELEMETRY__JSON", "true"),
            ]),
        )
        .unwrap();

        assert_eq!(config.worker.default_variant, ModelVariant::Phi);
        assert!(config.telemetry.json);
    }

    #[test]
    fn explicit_file_must_exist() {
        let result = AppConfig::load_from(Path::new("/nonexistent/llm-worker.toml"));
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn unknown_variant_is_a_load_error() {
        let result = AppConfig::build(
            None,
            env(&[("LLM_WORKER_WORKER__DEFAULT_VARIANT", "gpt")]),
        );
        assert!(matches!(result, Err(ConfigError::Load(_))));
    }

    #[test]
    fn validation_rejects_empty_preferences() {
        let mut config = AppConfig::default();
        config.inference.adapter_preferences.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("adapter_preferences"));
    }

    #[test]
    fn validation_rejects_zero_sizes() {
        let mut config = AppConfig::default();
        config.worker.event_buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.worker.command_buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.inference.max_new_tokens = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn router_config_carries_variant_and_inference() {
        let mut config = AppConfig::default();
        config.worker.default_variant = ModelVariant::Phi;
        config.inference.warm_up_prompt = "hi".to_string();

        let router = config.router_config();

        assert_eq!(router.default_variant, ModelVariant::Phi);
        assert_eq!(router.inference.warm_up_prompt, "hi");
    }
}
