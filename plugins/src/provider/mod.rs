pub(crate) mod http;
pub mod inline;
pub mod suno;

pub use inline::InlineClient;
pub use suno::SunoClient;
