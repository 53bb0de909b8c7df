use std::sync::Arc;

use crate::config::AppConfig;
use crate::error::CliError;
use crate::task::TaskTracker;

/// Runtime services shared by every request handler.
#[derive(Clone)]
pub struct Services {
    pub tracker: TaskTracker,
}

/// Builds [`Services`] from configuration. Implemented by the plugins crate,
/// which owns the concrete provider and mirror clients.
#[async_trait::async_trait]
pub trait ServicesFactory: Send + Sync {
    async fn build_services(&self, cfg: &AppConfig) -> Result<Services, CliError>;
}

#[derive(Clone)]
pub struct AppContext {
    cfg: AppConfig,
    services_factory: Option<Arc<dyn ServicesFactory>>,
}

impl AppContext {
    pub fn new(cfg: AppConfig, services_factory: Option<Arc<dyn ServicesFactory>>) -> Self {
        Self {
            cfg,
            services_factory,
        }
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.cfg
    }

    pub fn with_config(&self, cfg: AppConfig) -> Self {
        Self {
            cfg,
            services_factory: self.services_factory.clone(),
        }
    }

    pub async fn build_services(&self) -> Result<Services, CliError> {
        let Some(factory) = self.services_factory.as_ref() else {
            return Err(CliError::Config(
                "services_factory missing (cannot build providers/store)".into(),
            ));
        };
        factory.build_services(&self.cfg).await
    }
}
