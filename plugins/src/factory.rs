use std::sync::Arc;

use anyhow::Result;

use songbridge_core::api::{AppConfig, ArtifactMirror, ArtifactStore, ProviderClient, TaskTracker};

use crate::mirror::HttpMirror;
use crate::provider::{InlineClient, SunoClient};

/// Providers enabled by `cfg`. The polling provider is always present; the
/// inline one only when `providers.inline.enabled` is set.
pub fn build_providers(cfg: &AppConfig) -> Result<Vec<Arc<dyn ProviderClient>>> {
    let mut providers: Vec<Arc<dyn ProviderClient>> =
        vec![Arc::new(SunoClient::new(&cfg.providers.suno)?)];
    if cfg.providers.inline.enabled {
        providers.push(Arc::new(InlineClient::new(&cfg.providers.inline)?));
    }
    Ok(providers)
}

pub fn build_mirror(cfg: &AppConfig) -> Result<Option<Arc<dyn ArtifactMirror>>> {
    match &cfg.storage.mirror {
        Some(m) if !m.base_url.trim().is_empty() => Ok(Some(Arc::new(HttpMirror::new(m)?))),
        _ => Ok(None),
    }
}

pub async fn build_store(cfg: &AppConfig) -> Result<ArtifactStore> {
    let store = ArtifactStore::open(&cfg.storage.dir).await?;
    Ok(match build_mirror(cfg)? {
        Some(mirror) => store.with_mirror(mirror),
        None => store,
    })
}

pub async fn build_tracker(cfg: &AppConfig) -> Result<TaskTracker> {
    let providers = build_providers(cfg)?;
    let store = build_store(cfg).await?;
    Ok(TaskTracker::from_config(cfg, providers, store))
}

#[cfg(test)]
mod tests {
    use super::*;
    use songbridge_core::api::{MirrorConfig, ProviderKind};

    #[tokio::test]
    async fn inline_provider_is_opt_in() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.storage.dir = dir.path().display().to_string();

        let tracker = build_tracker(&cfg).await.unwrap();
        assert!(tracker.has_provider(ProviderKind::Suno));
        assert!(!tracker.has_provider(ProviderKind::Inline));

        cfg.providers.inline.enabled = true;
        let tracker = build_tracker(&cfg).await.unwrap();
        assert!(tracker.has_provider(ProviderKind::Inline));
    }

    #[tokio::test]
    async fn mirror_attaches_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = AppConfig::default();
        cfg.storage.dir = dir.path().join("nested").display().to_string();
        assert!(!build_store(&cfg).await.unwrap().has_mirror());

        cfg.storage.mirror = Some(MirrorConfig {
            base_url: "http://127.0.0.1:9".into(),
            token: String::new(),
            key_prefix: "songs".into(),
            timeout_ms: 1_000,
        });
        let store = build_store(&cfg).await.unwrap();
        assert!(store.has_mirror());
        assert!(dir.path().join("nested").is_dir());
    }
}
