//! Application layer - Command routing and orchestration
//!
//! Turns host commands into pipeline loads and generation sessions and
//! streams the resulting events back through a bounded channel.

pub mod error;
pub mod services;

pub use error::ApplicationError;
pub use services::*;
