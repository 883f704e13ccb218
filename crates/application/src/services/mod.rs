//! Application services - Use case implementations

mod command_router;
mod event_emitter;

pub use command_router::{CommandRouter, LOADING_MODEL, RouterConfig, WARMING_UP, WorkerState};
pub use event_emitter::EventEmitter;
