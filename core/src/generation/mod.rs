mod request;
mod validate;

pub use request::{GenerationMode, GenerationParams, GenerationRequest, ProviderKind};
pub use validate::{GenerationDraft, ValidationError};
