//! Value Objects - Immutable, identity-less domain primitives

mod model_variant;
mod power_preference;
mod quantization;

pub use model_variant::ModelVariant;
pub use power_preference::PowerPreference;
pub use quantization::Quantization;
