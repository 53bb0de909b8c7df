//! ServicesFactory implementation: builds the tracker, providers and store from config for the CLI.
use async_trait::async_trait;
use songbridge_core::api::{AppConfig, CliError, Services, ServicesFactory};

use crate::factory;

#[derive(Default)]
pub struct PluginServicesFactory;

#[async_trait]
impl ServicesFactory for PluginServicesFactory {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError> {
        let tracker = factory::build_tracker(cfg).await?;
        tracing::info!(
            target: "songbridge.startup",
            output_dir = %tracker.store().root().display(),
            auto_save = cfg.storage.auto_save,
            max_auto_save = cfg.storage.max_auto_save,
            mirror = tracker.store().has_mirror(),
            poll_budget_secs = tracker.backoff().total_budget().as_secs(),
            registry_ttl_secs = tracker.registry().ttl().as_secs(),
            "Services ready"
        );
        Ok(Services { tracker })
    }
}
