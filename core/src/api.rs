//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `songbridge_core::api` instead of reaching into internal modules.

pub use crate::config::{
    apply_env_overrides, load_default, load_from_file, AppConfig, AuthConfig, DownloadConfig,
    InlineProviderConfig, KeepaliveConfig, LoggingConfig, MirrorConfig, PollingConfig, ProvidersConfig,
    RegistryConfig, ServerConfig, StorageConfig, SunoProviderConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::error::{CliError, ProviderError, StoreError, TransportKind};
pub use crate::generation::{
    GenerationDraft, GenerationMode, GenerationParams, GenerationRequest, ProviderKind,
    ValidationError,
};
pub use crate::provider::{
    AudioPayload, ProviderClient, ProviderStatus, ProviderStyle, ResultLocator, Submission,
};
pub use crate::store::{ArtifactMirror, ArtifactStore, ArtifactStream, StoredArtifact};
pub use crate::task::{
    BackoffPolicy, PersistencePolicy, ReportState, StatusReport, Task, TaskRegistry, TaskState,
    TaskTracker, TrackerError,
};
