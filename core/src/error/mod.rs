#[allow(clippy::module_inception)]
pub mod error;
pub mod provider;
pub mod store;

pub use error::CliError;
pub use provider::{ProviderError, TransportKind};
pub use store::StoreError;
