//! HTTP服务器生命周期管理

use super::{
    middleware::{create_timeout_layer, request_logger},
    routes::create_router,
    AppState,
};
use crate::commands::cli::ServeArgs;
use crate::keepalive::spawn_keepalive;
use axum::middleware;
use songbridge_core::api::{AppContext, CliError};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// HTTP服务器配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            request_timeout_secs: 120,
        }
    }
}

/// 处理 serve 命令
pub async fn handle_serve(args: ServeArgs, ctx: &AppContext) -> Result<(), CliError> {
    // 合并配置：CLI 参数优先，配置文件作为默认值
    let mut cfg = ctx.cfg().clone();
    if let Some(host) = args.host {
        cfg.server.host = host;
    }
    if let Some(port) = args.port {
        cfg.server.port = port;
    }
    if let Some(dir) = args.output_dir {
        cfg.storage.dir = dir;
    }
    let ctx = ctx.with_config(cfg);
    let cfg = ctx.cfg();

    let services = ctx.build_services().await?;

    // 后台任务：注册表过期清理、保活
    let sweeper = services
        .tracker
        .registry()
        .spawn_sweeper(Duration::from_secs(cfg.registry.sweep_secs));
    let keepalive = spawn_keepalive(&cfg.keepalive);

    let (shutdown_tx, _) = broadcast::channel(1);
    let state = AppState::new(services, cfg.clone(), shutdown_tx)?;

    let config = ServerConfig {
        host: cfg.server.host.clone(),
        port: cfg.server.port,
        request_timeout_secs: cfg.server.request_timeout_secs,
    };
    let result = start_server_with_config(config, state)
        .await
        .map_err(|e: Box<dyn std::error::Error + Send + Sync>| CliError::Server(e.to_string()));

    sweeper.abort();
    if let Some(handle) = keepalive {
        handle.abort();
    }
    result
}

/// 使用自定义配置启动HTTP服务器
pub async fn start_server_with_config(
    config: ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let router = create_router(state.clone());

    let app = router
        .layer(middleware::from_fn(request_logger))
        .layer(create_timeout_layer(config.request_timeout_secs));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        target: "songbridge.http",
        "HTTP server listening on http://{}",
        addr
    );

    let mut shutdown_rx = state.shutdown_tx.subscribe();

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::select! {
                _ = signal::ctrl_c() => {
                    info!(target: "songbridge.http", "Received Ctrl+C signal");
                }
                _ = shutdown_rx.recv() => {
                    info!(target: "songbridge.http", "Received shutdown signal");
                }
                _ = wait_for_sigterm() => {
                    info!(target: "songbridge.http", "Received SIGTERM signal");
                }
            }

            info!(target: "songbridge.http", "Starting graceful shutdown...");
        })
        .await?;

    info!(target: "songbridge.http", "Server shutdown complete");
    Ok(())
}

/// 等待 SIGTERM 信号（Unix系统）
#[cfg(unix)]
async fn wait_for_sigterm() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(target: "songbridge.http", error = %e, "Failed to install SIGTERM handler");
            std::future::pending::<()>().await
        }
    }
}

/// Windows 系统不支持 SIGTERM，使用空操作
#[cfg(not(unix))]
async fn wait_for_sigterm() {
    std::future::pending::<()>().await
}
