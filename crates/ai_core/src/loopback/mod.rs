//! In-process loopback engine
//!
//! Implements every engine port without touching a GPU or the network: the
//! backend grants simulated adapters, the loader reports synthetic artifact
//! progress, and the model echoes the last user message back one byte per
//! token. Output is deterministic, which makes it the engine behind host
//! development and the end-to-end tests.

mod backend;
mod config;
mod loader;
mod model;
mod tokenizer;

pub use backend::LoopbackBackend;
pub use config::LoopbackConfig;
pub use loader::LoopbackLoader;
pub use model::LoopbackModel;
pub use tokenizer::{LoopbackTokenizer, SpecialToken};
