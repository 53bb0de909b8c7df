use async_trait::async_trait;

use crate::error::StoreError;
use crate::provider::AudioPayload;

/// Durable remote copy of stored artifacts.
#[async_trait]
pub trait ArtifactMirror: Send + Sync {
    fn name(&self) -> &str;

    /// Upload `payload` for the local artifact `name`; returns the remote key.
    async fn put(&self, name: &str, payload: &AudioPayload) -> Result<String, StoreError>;
}
