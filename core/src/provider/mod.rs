mod traits;
mod types;

pub use traits::ProviderClient;
pub use types::{AudioPayload, ProviderStatus, ProviderStyle, ResultLocator, Submission};
