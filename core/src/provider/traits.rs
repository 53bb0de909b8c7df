use async_trait::async_trait;

use super::types::{AudioPayload, ProviderStatus, ProviderStyle, ResultLocator, Submission};
use crate::error::ProviderError;
use crate::generation::{GenerationRequest, ProviderKind};

#[async_trait]
pub trait ProviderClient: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn style(&self) -> ProviderStyle;

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError>;

    async fn fetch_status(&self, _task_id: &str) -> Result<ProviderStatus, ProviderError> {
        Err(ProviderError::Unsupported(self.kind().as_str()))
    }

    async fn fetch_audio(&self, _locator: &ResultLocator) -> Result<AudioPayload, ProviderError> {
        Err(ProviderError::Unsupported(self.kind().as_str()))
    }
}
