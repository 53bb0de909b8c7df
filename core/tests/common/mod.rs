#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use songbridge_core::api::{
    ArtifactStore, AudioPayload, BackoffPolicy, GenerationMode, GenerationParams,
    GenerationRequest, PersistencePolicy, ProviderClient, ProviderError, ProviderKind,
    ProviderStatus, ProviderStyle, ResultLocator, StatusReport, Submission, TaskRegistry,
    TaskTracker, TransportKind,
};

/// Provider double whose answers are queued up front.
///
/// Once the status script is exhausted every poll answers `Pending`.
pub struct ScriptedProvider {
    kind: ProviderKind,
    style: ProviderStyle,
    submission: Mutex<Option<Result<Submission, ProviderError>>>,
    statuses: Mutex<VecDeque<Result<ProviderStatus, ProviderError>>>,
    broken_urls: HashSet<String>,
    pub status_calls: AtomicUsize,
    pub audio_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn polling(task_id: &str) -> Self {
        Self::new(
            ProviderKind::Suno,
            ProviderStyle::Polling,
            Ok(Submission::Accepted {
                task_id: task_id.to_string(),
            }),
        )
    }

    pub fn synchronous(result: Result<Submission, ProviderError>) -> Self {
        Self::new(ProviderKind::Inline, ProviderStyle::Synchronous, result)
    }

    pub fn new(
        kind: ProviderKind,
        style: ProviderStyle,
        submission: Result<Submission, ProviderError>,
    ) -> Self {
        Self {
            kind,
            style,
            submission: Mutex::new(Some(submission)),
            statuses: Mutex::new(VecDeque::new()),
            broken_urls: HashSet::new(),
            status_calls: AtomicUsize::new(0),
            audio_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_statuses(
        self,
        statuses: impl IntoIterator<Item = Result<ProviderStatus, ProviderError>>,
    ) -> Self {
        self.statuses.lock().unwrap().extend(statuses);
        self
    }

    pub fn with_broken_url(mut self, url: &str) -> Self {
        self.broken_urls.insert(url.to_string());
        self
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn audio_calls(&self) -> usize {
        self.audio_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderClient for ScriptedProvider {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    fn style(&self) -> ProviderStyle {
        self.style
    }

    async fn submit(&self, _request: &GenerationRequest) -> Result<Submission, ProviderError> {
        self.submission
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Err(ProviderError::Malformed("submit called twice".into())))
    }

    async fn fetch_status(&self, _task_id: &str) -> Result<ProviderStatus, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ProviderStatus::Pending))
    }

    async fn fetch_audio(&self, locator: &ResultLocator) -> Result<AudioPayload, ProviderError> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        if self.broken_urls.contains(&locator.url) {
            return Err(ProviderError::Status {
                status: 404,
                url: locator.url.clone(),
                body: "gone".into(),
            });
        }
        Ok(AudioPayload::new(
            format!("audio from {}", locator.url).into_bytes(),
            "audio/mpeg",
        ))
    }
}

pub fn success(urls: &[&str]) -> Result<ProviderStatus, ProviderError> {
    Ok(ProviderStatus::Success {
        locators: urls.iter().map(|u| ResultLocator::new(*u)).collect(),
    })
}

pub fn transport_timeout() -> ProviderError {
    ProviderError::Transport {
        kind: TransportKind::Timeout,
        url: "http://upstream/record-info".into(),
        message: "operation timed out".into(),
    }
}

pub fn request(mode: GenerationMode, provider: ProviderKind, count: u8) -> GenerationRequest {
    GenerationRequest {
        mode,
        provider,
        prompt: Some("a calm song about the sea".into()),
        lyrics: None,
        tags: vec!["ambient".into()],
        title: None,
        negative_tags: None,
        model: None,
        params: GenerationParams {
            count,
            ..GenerationParams::default()
        },
    }
}

/// Millisecond-scale backoff so polling tests finish quickly.
pub fn fast_backoff(max_attempts: u32) -> BackoffPolicy {
    BackoffPolicy::new(
        Duration::from_millis(5),
        1.2,
        Duration::from_millis(20),
        max_attempts,
    )
}

pub async fn tracker(
    dir: &std::path::Path,
    providers: &[Arc<ScriptedProvider>],
    max_attempts: u32,
    persistence: PersistencePolicy,
) -> TaskTracker {
    let store = ArtifactStore::open(dir).await.unwrap();
    let providers = providers
        .iter()
        .map(|p| p.clone() as Arc<dyn ProviderClient>)
        .collect();
    TaskTracker::new(
        providers,
        store,
        TaskRegistry::new(Duration::from_secs(3600)),
        fast_backoff(max_attempts),
        persistence,
    )
}

/// Tracker whose poll loops sleep for a minute before the first attempt, so
/// status queries are the only callers of `fetch_status`.
pub async fn idle_tracker(dir: &std::path::Path, providers: &[Arc<ScriptedProvider>]) -> TaskTracker {
    let store = ArtifactStore::open(dir).await.unwrap();
    let providers = providers
        .iter()
        .map(|p| p.clone() as Arc<dyn ProviderClient>)
        .collect();
    TaskTracker::new(
        providers,
        store,
        TaskRegistry::new(Duration::from_secs(3600)),
        BackoffPolicy::new(Duration::from_secs(60), 1.0, Duration::from_secs(60), 1),
        PersistencePolicy::default(),
    )
}

/// Poll the registry until `task_id` reaches a terminal state.
pub async fn wait_terminal(tracker: &TaskTracker, task_id: &str) -> StatusReport {
    for _ in 0..400 {
        if let Some(task) = tracker.registry().get(task_id).await {
            if task.is_terminal() {
                return tracker.status(task_id).await.unwrap();
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("task {task_id} never reached a terminal state");
}

/// Poll the tracker until the report stops saying PROCESSING.
pub async fn wait_reported(tracker: &TaskTracker, task_id: &str) -> StatusReport {
    let mut last = tracker.status(task_id).await.unwrap();
    for _ in 0..400 {
        if last.status != songbridge_core::api::ReportState::Processing {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        last = tracker.status(task_id).await.unwrap();
    }
    last
}
