//! Domain entities

mod chat_message;
mod generation_request;
mod variant_profile;

pub use chat_message::{ChatMessage, MessageRole};
pub use generation_request::GenerationRequest;
pub use variant_profile::{DEFAULT_MAX_NEW_TOKENS, SamplingParams, VariantProfile};
