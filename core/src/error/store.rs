use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("invalid artifact name: {0}")]
    InvalidName(String),
    #[error("artifact io error on {name}: {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },
    #[error("mirror upload failed for {key}: {message}")]
    Mirror { key: String, message: String },
}

impl StoreError {
    pub fn io(name: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            name: name.into(),
            source,
        }
    }
}
