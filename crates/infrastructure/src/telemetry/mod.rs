//! Log subscriber setup
//!
//! Stdout carries the protocol, so every log line goes to stderr.

mod subscriber;

pub use subscriber::{TelemetryConfig, TelemetryError, init_telemetry, verbosity_filter};
