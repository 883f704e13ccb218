//! Infrastructure layer - Adapters for the host process
//!
//! Configuration loading, log subscriber setup, the newline-delimited JSON
//! channel over stdio and the wiring that connects them to the router.

pub mod adapters;
pub mod config;
pub mod runtime;
pub mod telemetry;

pub use adapters::{ChannelError, read_commands, write_events};
pub use config::{AppConfig, ConfigError, WorkerConfig};
pub use runtime::{build_pipeline_cache, serve};
pub use telemetry::{TelemetryConfig, TelemetryError, init_telemetry};
