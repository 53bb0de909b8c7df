//! HTTP服务器状态管理

use chrono::{DateTime, Local};
use songbridge_core::api::{AppConfig, Services, TaskTracker};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// 应用状态（在所有handlers间共享）
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<Services>,
    pub config: Arc<AppConfig>,
    pub stats: Arc<ServerStats>,
    /// 代理外部下载使用的HTTP客户端
    pub download_client: reqwest::Client,
    pub shutdown_tx: broadcast::Sender<()>,
}

impl AppState {
    pub fn new(
        services: Services,
        config: AppConfig,
        shutdown_tx: broadcast::Sender<()>,
    ) -> anyhow::Result<Self> {
        // 流式代理不设整体超时，只限制连接与单次读取
        let io_timeout = Duration::from_millis(config.download.timeout_ms);
        let download_client = reqwest::Client::builder()
            .connect_timeout(io_timeout)
            .read_timeout(io_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            services: Arc::new(services),
            config: Arc::new(config),
            stats: Arc::new(ServerStats::new()),
            download_client,
            shutdown_tx,
        })
    }

    pub fn tracker(&self) -> &TaskTracker {
        &self.services.tracker
    }

    pub fn record_request(&self, endpoint: Endpoint) {
        self.stats.hit(endpoint);
    }

    pub fn record_error(&self) {
        self.stats.errors.fetch_add(1, Ordering::Relaxed);
    }
}

/// 统计用的路由分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Generate,
    Status,
    Download,
    Health,
}

impl Endpoint {
    const ALL: [Endpoint; 4] = [
        Endpoint::Generate,
        Endpoint::Status,
        Endpoint::Download,
        Endpoint::Health,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

/// 服务器统计信息（无锁计数）
pub struct ServerStats {
    by_endpoint: [AtomicU64; 4],
    errors: AtomicU64,
    started_at: DateTime<Local>,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            by_endpoint: Default::default(),
            errors: AtomicU64::new(0),
            started_at: Local::now(),
        }
    }

    fn hit(&self, endpoint: Endpoint) {
        self.by_endpoint[endpoint.slot()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn requests(&self, endpoint: Endpoint) -> u64 {
        self.by_endpoint[endpoint.slot()].load(Ordering::Relaxed)
    }

    pub fn requests_total(&self) -> u64 {
        Endpoint::ALL.iter().map(|e| self.requests(*e)).sum()
    }

    pub fn errors_total(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn uptime_seconds(&self) -> f64 {
        (Local::now() - self.started_at).num_milliseconds() as f64 / 1000.0
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}
