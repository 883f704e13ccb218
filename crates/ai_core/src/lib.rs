//! AI Core - Device selection, pipeline caching and streamed generation
//!
//! The numerical engine sits behind the traits in [`ports`]. This crate
//! negotiates a compute adapter, caches one warmed-up pipeline per model
//! variant and drives token-by-token generation with cooperative
//! cancellation. The [`loopback`] engine implements the ports in-process.

pub mod cancellation;
pub mod config;
pub mod device;
pub mod error;
pub mod loopback;
pub mod pipeline;
pub mod ports;
pub mod session;
pub mod streamer;

pub use cancellation::CancellationToken;
pub use config::InferenceConfig;
pub use device::DeviceSelector;
pub use error::InferenceError;
pub use pipeline::{Pipeline, PipelineCache};
pub use ports::{
    ArtifactLoader, CausalModel, ComputeAdapter, ComputeBackend, Encoding, ProgressCallback,
    TokenStream, Tokenizer,
};
pub use session::{GenerationOutcome, GenerationSession, ThroughputMeter, TokenSink};
pub use streamer::TextStreamer;
