//! Domain layer for the LLM worker
//!
//! Contains the ubiquitous language shared by every other crate: model
//! variants and their static profiles, chat messages, the host command
//! protocol and the status events reported back to the host.
//! This layer has no runtime dependencies beyond serde.

pub mod commands;
pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use commands::WorkerCommand;
pub use entities::*;
pub use errors::DomainError;
pub use events::{ProgressEvent, StatusEvent, StreamingUpdate, WorkerEvent};
pub use value_objects::*;
