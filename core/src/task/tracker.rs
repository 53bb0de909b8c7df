use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use super::backoff::BackoffPolicy;
use super::id_gen::TimestampIdGenerator;
use super::registry::TaskRegistry;
use super::types::{Task, TaskState};
use crate::config::AppConfig;
use crate::error::ProviderError;
use crate::generation::{GenerationMode, GenerationRequest, ProviderKind};
use crate::provider::{ProviderClient, ProviderStatus, ProviderStyle, ResultLocator, Submission};
use crate::store::naming::{artifact_name, artifact_stem, inline_artifact_name};
use crate::store::{ArtifactStore, StoredArtifact};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("provider {0} is not configured")]
    ProviderUnavailable(&'static str),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}

/// Which outputs of a successful task get downloaded into the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistencePolicy {
    pub auto_save: bool,
    pub max_auto_save: usize,
}

impl Default for PersistencePolicy {
    fn default() -> Self {
        Self {
            auto_save: true,
            max_auto_save: 2,
        }
    }
}

/// Client-facing status, collapsed to three values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportState {
    Processing,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub task_id: String,
    pub status: ReportState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub result_locators: Vec<ResultLocator>,
    /// Names of artifacts held by the local store.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub artifacts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusReport {
    fn processing(task_id: &str) -> Self {
        Self {
            task_id: task_id.to_string(),
            status: ReportState::Processing,
            result_locators: Vec::new(),
            artifacts: Vec::new(),
            message: None,
        }
    }

    fn from_task(task: &Task) -> Self {
        let (status, message) = match task.state {
            TaskState::Submitted | TaskState::Processing => (ReportState::Processing, None),
            TaskState::Success => (ReportState::Success, None),
            TaskState::Failure => (ReportState::Failure, task.error.clone()),
            TaskState::Timeout => (
                ReportState::Failure,
                Some(
                    task.error
                        .clone()
                        .unwrap_or_else(|| "generation timed out".to_string()),
                ),
            ),
        };
        Self {
            task_id: task.id.clone(),
            status,
            result_locators: task.result_locators.clone(),
            artifacts: task.artifacts.iter().map(|a| a.name.clone()).collect(),
            message,
        }
    }
}

/// Owns every generation lifecycle, from submit to terminal state.
///
/// Polling tasks run in their own spawned loop; synchronous providers are
/// resolved by one detached call whose result lands in the store.
#[derive(Clone)]
pub struct TaskTracker {
    inner: Arc<TrackerInner>,
}

struct TrackerInner {
    providers: HashMap<ProviderKind, Arc<dyn ProviderClient>>,
    store: ArtifactStore,
    registry: TaskRegistry,
    backoff: BackoffPolicy,
    persistence: PersistencePolicy,
    ids: TimestampIdGenerator,
}

impl TaskTracker {
    pub fn new(
        providers: Vec<Arc<dyn ProviderClient>>,
        store: ArtifactStore,
        registry: TaskRegistry,
        backoff: BackoffPolicy,
        persistence: PersistencePolicy,
    ) -> Self {
        let providers = providers.into_iter().map(|p| (p.kind(), p)).collect();
        Self {
            inner: Arc::new(TrackerInner {
                providers,
                store,
                registry,
                backoff,
                persistence,
                ids: TimestampIdGenerator::new(),
            }),
        }
    }

    pub fn from_config(
        cfg: &AppConfig,
        providers: Vec<Arc<dyn ProviderClient>>,
        store: ArtifactStore,
    ) -> Self {
        Self::new(
            providers,
            store,
            TaskRegistry::new(Duration::from_secs(cfg.registry.ttl_secs)),
            BackoffPolicy::from(&cfg.polling),
            PersistencePolicy {
                auto_save: cfg.storage.auto_save,
                max_auto_save: cfg.storage.max_auto_save,
            },
        )
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.inner.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.inner.store
    }

    pub fn backoff(&self) -> &BackoffPolicy {
        &self.inner.backoff
    }

    pub fn has_provider(&self, kind: ProviderKind) -> bool {
        self.inner.providers.contains_key(&kind)
    }

    fn provider(&self, kind: ProviderKind) -> Result<Arc<dyn ProviderClient>, TrackerError> {
        self.inner
            .providers
            .get(&kind)
            .cloned()
            .ok_or(TrackerError::ProviderUnavailable(kind.as_str()))
    }

    /// Hand `request` to its provider and return the task id without waiting
    /// for the job to finish.
    ///
    /// Polling providers are contacted before returning so submit failures
    /// reach the caller. Synchronous providers get a locally issued id and
    /// run in the background.
    pub async fn submit(&self, request: GenerationRequest) -> Result<String, TrackerError> {
        let provider = self.provider(request.provider)?;

        match provider.style() {
            ProviderStyle::Polling => {
                let task_id = match provider.submit(&request).await? {
                    Submission::Accepted { task_id } if !task_id.trim().is_empty() => task_id,
                    Submission::Accepted { .. } => {
                        return Err(ProviderError::Malformed("empty task id".into()).into())
                    }
                    Submission::Completed { .. } => {
                        return Err(ProviderError::Malformed(
                            "polling provider returned audio inline".into(),
                        )
                        .into())
                    }
                };

                let task = Task::new(task_id.clone(), request.provider, request.mode);
                if !self.inner.registry.insert(task).await {
                    tracing::warn!(
                        target: "songbridge.tracker",
                        task_id = %task_id,
                        "Provider reused a tracked task id; keeping the existing poller"
                    );
                    return Ok(task_id);
                }

                tracing::info!(
                    target: "songbridge.tracker",
                    task_id = %task_id,
                    provider = %request.provider.as_str(),
                    mode = %request.mode.as_str(),
                    "Task submitted"
                );

                let inner = self.inner.clone();
                let id = task_id.clone();
                let keep = usize::from(request.params.count);
                tokio::spawn(async move {
                    inner.poll_until_terminal(provider, id, request.mode, keep).await;
                });
                Ok(task_id)
            }
            ProviderStyle::Synchronous => {
                let prefix = request.provider.task_prefix().unwrap_or(request.provider.as_str());
                let task_id = self.inner.ids.next(prefix);

                tracing::info!(
                    target: "songbridge.tracker",
                    task_id = %task_id,
                    provider = %request.provider.as_str(),
                    "Synchronous generation started"
                );

                let inner = self.inner.clone();
                let id = task_id.clone();
                tokio::spawn(async move {
                    inner.resolve_synchronous(provider, id, request).await;
                });
                Ok(task_id)
            }
        }
    }

    /// Normalized status for `task_id`, routed by its provider namespace.
    pub async fn status(&self, task_id: &str) -> Result<StatusReport, TrackerError> {
        let kind = ProviderKind::from_task_id(task_id);
        if kind.task_prefix().is_some() {
            return Ok(self.stored_status(task_id).await);
        }

        let tracked = self.inner.registry.get(task_id).await;
        if let Some(task) = tracked.as_ref().filter(|t| t.is_terminal()) {
            return Ok(StatusReport::from_task(task));
        }

        let provider = self.provider(kind)?;
        let upstream = match provider.fetch_status(task_id).await {
            Ok(status) => status,
            // The poll loop retries these too; answer from what it has seen.
            Err(e) if e.is_transient() => match tracked {
                Some(task) => {
                    tracing::debug!(
                        target: "songbridge.tracker",
                        task_id = %task_id,
                        error = %e,
                        "Live status unavailable; reporting tracked state"
                    );
                    return Ok(StatusReport::from_task(&task));
                }
                None => return Err(e.into()),
            },
            Err(e) => return Err(e.into()),
        };
        let report = match upstream {
            ProviderStatus::Pending => StatusReport::processing(task_id),
            ProviderStatus::Success { locators } => StatusReport {
                task_id: task_id.to_string(),
                status: ReportState::Success,
                result_locators: locators,
                artifacts: Vec::new(),
                message: None,
            },
            ProviderStatus::Failure { detail } => StatusReport {
                task_id: task_id.to_string(),
                status: ReportState::Failure,
                result_locators: Vec::new(),
                artifacts: Vec::new(),
                message: Some(detail),
            },
        };
        Ok(report)
    }

    /// Resolve a download key to the name of a stored artifact.
    ///
    /// `key` may be a full artifact name, a name without its extension, or a
    /// task id. A task id resolves to the first output stored for that task.
    pub async fn locate_artifact(&self, key: &str) -> Option<String> {
        let store = &self.inner.store;
        if store.exists(key).await {
            return Some(key.to_string());
        }
        if let Some(name) = store.locate(key).await {
            return Some(name);
        }
        if ProviderKind::from_task_id(key).task_prefix().is_some() {
            return None;
        }

        if let Some(task) = self.inner.registry.get(key).await {
            if let Some(first) = task.artifacts.first() {
                return Some(first.name.clone());
            }
            return store.locate(&artifact_stem(task.mode, key, 0)).await;
        }

        // Evicted or issued before a restart: the mode is no longer known.
        for mode in GenerationMode::ALL {
            if let Some(name) = store.locate(&artifact_stem(mode, key, 0)).await {
                return Some(name);
            }
        }
        None
    }

    /// Store lookup for locally resolved tasks. There is no failure answer:
    /// an absent artifact means the job has not landed yet.
    async fn stored_status(&self, task_id: &str) -> StatusReport {
        match self.inner.store.locate(task_id).await {
            Some(name) => StatusReport {
                task_id: task_id.to_string(),
                status: ReportState::Success,
                result_locators: Vec::new(),
                artifacts: vec![name],
                message: None,
            },
            None => StatusReport::processing(task_id),
        }
    }
}

impl TrackerInner {
    async fn poll_until_terminal(
        &self,
        provider: Arc<dyn ProviderClient>,
        task_id: String,
        mode: GenerationMode,
        keep: usize,
    ) {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let Some(delay) = self.backoff.next_delay(attempt) else {
                let detail = format!(
                    "no terminal state after {} attempts",
                    self.backoff.max_attempts
                );
                tracing::warn!(target: "songbridge.tracker", task_id = %task_id, "{}", detail);
                self.finish(&task_id, TaskState::Timeout, Some(detail), Vec::new(), Vec::new())
                    .await;
                return;
            };
            tokio::time::sleep(delay).await;

            let entered = self
                .registry
                .update(&task_id, |t| t.begin_attempt(attempt))
                .await;
            match entered {
                Some(Ok(())) => {}
                Some(Err(e)) => {
                    tracing::error!(target: "songbridge.tracker", task_id = %task_id, error = %e, "Poll loop stopped");
                    return;
                }
                None => {
                    tracing::error!(target: "songbridge.tracker", task_id = %task_id, "Task vanished from registry");
                    return;
                }
            }

            match provider.fetch_status(&task_id).await {
                Ok(ProviderStatus::Pending) => {
                    tracing::debug!(
                        target: "songbridge.tracker",
                        task_id = %task_id,
                        attempt,
                        next_delay_ms = self.backoff.delay_for(attempt + 1).as_millis() as u64,
                        "Still processing"
                    );
                }
                Ok(ProviderStatus::Success { mut locators }) => {
                    locators.truncate(keep.max(1));
                    let artifacts = self
                        .persist_outputs(provider.as_ref(), &task_id, mode, &locators)
                        .await;
                    self.finish(&task_id, TaskState::Success, None, locators, artifacts)
                        .await;
                    return;
                }
                Ok(ProviderStatus::Failure { detail }) => {
                    self.finish(&task_id, TaskState::Failure, Some(detail), Vec::new(), Vec::new())
                        .await;
                    return;
                }
                Err(e) if e.is_transient() => {
                    tracing::warn!(
                        target: "songbridge.tracker",
                        task_id = %task_id,
                        attempt,
                        error = %e,
                        "Status poll failed; retrying"
                    );
                }
                Err(e) => {
                    self.finish(
                        &task_id,
                        TaskState::Failure,
                        Some(e.to_string()),
                        Vec::new(),
                        Vec::new(),
                    )
                    .await;
                    return;
                }
            }
        }
    }

    /// Download and store up to `max_auto_save` outputs. Each (task, index)
    /// pair is attempted at most once; one failure does not stop the rest.
    async fn persist_outputs(
        &self,
        provider: &dyn ProviderClient,
        task_id: &str,
        mode: GenerationMode,
        locators: &[ResultLocator],
    ) -> Vec<StoredArtifact> {
        let mut saved = Vec::new();
        if !self.persistence.auto_save {
            return saved;
        }

        for (index, locator) in locators
            .iter()
            .enumerate()
            .take(self.persistence.max_auto_save)
        {
            let claimed = self
                .registry
                .update(task_id, |t| t.claim_output(index))
                .await
                .unwrap_or(false);
            if !claimed {
                continue;
            }

            let audio = match provider.fetch_audio(locator).await {
                Ok(audio) => audio,
                Err(e) => {
                    tracing::warn!(
                        target: "songbridge.tracker",
                        task_id = %task_id,
                        index,
                        url = %locator.url,
                        error = %e,
                        "Artifact download failed"
                    );
                    continue;
                }
            };

            let name = artifact_name(mode, task_id, index, &audio.content_type);
            match self.store.save(&name, task_id, &audio).await {
                Ok(artifact) => saved.push(artifact),
                Err(e) => tracing::warn!(
                    target: "songbridge.tracker",
                    task_id = %task_id,
                    name = %name,
                    error = %e,
                    "Artifact save failed"
                ),
            }
        }
        saved
    }

    async fn finish(
        &self,
        task_id: &str,
        state: TaskState,
        error: Option<String>,
        locators: Vec<ResultLocator>,
        artifacts: Vec<StoredArtifact>,
    ) {
        let stored = artifacts.len();
        let result = self
            .registry
            .update(task_id, |t| {
                t.transition(state)?;
                t.error = error.clone();
                t.result_locators = locators;
                t.artifacts = artifacts;
                Ok::<u32, super::transitions::TransitionError>(t.attempts)
            })
            .await;

        match result {
            Some(Ok(attempts)) => match state {
                TaskState::Success => tracing::info!(
                    target: "songbridge.tracker",
                    task_id = %task_id,
                    attempts,
                    artifacts = stored,
                    "Task succeeded"
                ),
                _ => tracing::warn!(
                    target: "songbridge.tracker",
                    task_id = %task_id,
                    attempts,
                    state = %state.as_str(),
                    error = ?error,
                    "Task ended without output"
                ),
            },
            Some(Err(e)) => tracing::error!(
                target: "songbridge.tracker",
                task_id = %task_id,
                error = %e,
                "Refused terminal transition"
            ),
            None => tracing::error!(
                target: "songbridge.tracker",
                task_id = %task_id,
                "Task vanished from registry"
            ),
        }
    }

    async fn resolve_synchronous(
        &self,
        provider: Arc<dyn ProviderClient>,
        task_id: String,
        request: GenerationRequest,
    ) {
        let audio = match provider.submit(&request).await {
            Ok(Submission::Completed { audio }) => audio,
            Ok(Submission::Accepted { task_id: upstream }) => {
                tracing::error!(
                    target: "songbridge.tracker",
                    task_id = %task_id,
                    upstream = %upstream,
                    "Synchronous provider answered with a task id"
                );
                return;
            }
            Err(e) => {
                tracing::error!(
                    target: "songbridge.tracker",
                    task_id = %task_id,
                    error = %e,
                    "Synchronous generation failed"
                );
                return;
            }
        };

        let name = inline_artifact_name(&task_id, &audio.content_type);
        if let Err(e) = self.store.save(&name, &task_id, &audio).await {
            tracing::error!(
                target: "songbridge.tracker",
                task_id = %task_id,
                name = %name,
                error = %e,
                "Failed to store synchronous result"
            );
        }
    }
}
