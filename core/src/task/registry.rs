use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::types::Task;

/// In-memory map of tracked tasks.
///
/// Each polling loop only writes its own entry. Terminal tasks stay readable
/// for `ttl` after they finish and are then evicted by [`TaskRegistry::prune_expired`].
#[derive(Clone)]
pub struct TaskRegistry {
    tasks: Arc<RwLock<HashMap<String, Task>>>,
    ttl: Duration,
}

impl TaskRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns false if a task with the same id is already tracked.
    pub async fn insert(&self, task: Task) -> bool {
        let mut tasks = self.tasks.write().await;
        if tasks.contains_key(&task.id) {
            return false;
        }
        tasks.insert(task.id.clone(), task);
        true
    }

    pub async fn get(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().await.get(task_id).cloned()
    }

    pub async fn update<F, R>(&self, task_id: &str, f: F) -> Option<R>
    where
        F: FnOnce(&mut Task) -> R,
    {
        let mut tasks = self.tasks.write().await;
        tasks.get_mut(task_id).map(f)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    pub async fn active_count(&self) -> usize {
        self.tasks
            .read()
            .await
            .values()
            .filter(|t| !t.is_terminal())
            .count()
    }

    /// Drop terminal tasks that finished more than `ttl` before `now`.
    pub async fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let ttl = chrono::Duration::from_std(self.ttl)
            .unwrap_or_else(|_| chrono::Duration::weeks(52 * 100));
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|_, t| match t.finished_at {
            Some(done) if t.is_terminal() => now.signed_duration_since(done) <= ttl,
            _ => true,
        });
        before - tasks.len()
    }

    pub fn spawn_sweeper(&self, every: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every.max(Duration::from_secs(1)));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let evicted = registry.prune_expired(Utc::now()).await;
                if evicted > 0 {
                    tracing::debug!(
                        target: "songbridge.tracker",
                        evicted,
                        "Evicted expired tasks"
                    );
                }
            }
        })
    }
}
