//! HTTP路由handlers

use axum::{
    body::Body,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;
use futures::TryStreamExt;
use songbridge_core::api::{GenerationDraft, StoreError, TrackerError};

use crate::http::{
    middleware::require_shared_secret,
    models::*,
    state::{AppState, Endpoint},
    validation::{validate_artifact_name, validate_download_url, validate_task_id},
};

/// 创建所有路由
pub fn create_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/generate", post(generate_handler))
        .route("/status/:task_id", get(status_handler))
        .route("/download", get(proxy_download_handler))
        .route("/download/:key", get(download_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_shared_secret,
        ));

    Router::new()
        .merge(protected)
        .route("/health", get(health_handler))
        .with_state(state)
}

fn tracker_error(state: &AppState, err: TrackerError) -> HttpServerError {
    state.record_error();
    match err {
        TrackerError::ProviderUnavailable(kind) => {
            HttpServerError::InvalidRequest(format!("Provider {kind} is not configured"))
        }
        TrackerError::Provider(e) => HttpServerError::Upstream(e.to_string()),
    }
}

/// POST /generate - 提交生成任务
async fn generate_handler(
    State(state): State<AppState>,
    body: Result<Json<GenerationDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerateResponse>), HttpServerError> {
    state.record_request(Endpoint::Generate);

    let Json(draft) = body.map_err(|e| {
        state.record_error();
        HttpServerError::InvalidRequest(e.body_text())
    })?;

    let request = draft.validate().map_err(|e| {
        state.record_error();
        HttpServerError::InvalidRequest(e.to_string())
    })?;

    let mode = request.mode;
    let provider = request.provider;
    let task_id = state
        .tracker()
        .submit(request)
        .await
        .map_err(|e| tracker_error(&state, e))?;

    tracing::info!(
        target: "songbridge.http",
        task_id = %task_id,
        mode = %mode.as_str(),
        provider = %provider.as_str(),
        "Generation accepted"
    );
    Ok((StatusCode::ACCEPTED, Json(GenerateResponse::submitted(task_id))))
}

/// GET /status/:task_id - 查询任务状态
async fn status_handler(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> Result<Json<StatusResponse>, HttpServerError> {
    state.record_request(Endpoint::Status);
    validate_task_id(&task_id)?;

    let report = state
        .tracker()
        .status(&task_id)
        .await
        .map_err(|e| tracker_error(&state, e))?;
    Ok(Json(report.into()))
}

/// GET /download/:key - 下载本地存储的音频
///
/// key 可以是文件名、省略扩展名的文件名或任务ID（返回该任务的第一个输出）
async fn download_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Response, HttpServerError> {
    state.record_request(Endpoint::Download);
    validate_artifact_name(&key)?;

    let Some(resolved) = state.tracker().locate_artifact(&key).await else {
        return Err(HttpServerError::NotFound(format!("Artifact not found: {key}")));
    };

    let store = state.tracker().store();
    let artifact = store.open_stream(&resolved).await.map_err(|e| match e {
        StoreError::NotFound(n) => HttpServerError::NotFound(format!("Artifact not found: {n}")),
        other => {
            state.record_error();
            HttpServerError::Internal(other.to_string())
        }
    })?;

    let disposition = format!("inline; filename=\"{}\"", artifact.name);
    let mut resp = Body::from_stream(artifact.body).into_response();
    let headers = resp.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(artifact.content_type),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(artifact.len));
    if let Ok(v) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, v);
    }
    Ok(resp)
}

/// GET /download?url= - 代理白名单主机上的外部音频
async fn proxy_download_handler(
    State(state): State<AppState>,
    query: Result<Query<ProxyDownloadQuery>, QueryRejection>,
) -> Result<Response, HttpServerError> {
    state.record_request(Endpoint::Download);

    let Query(query) = query.map_err(|e| {
        state.record_error();
        HttpServerError::InvalidRequest(e.body_text())
    })?;

    // 白名单校验必须在任何外部请求之前完成
    let url = validate_download_url(&query.url, &state.config.download.allowed_hosts).map_err(
        |e| {
            tracing::warn!(
                target: "songbridge.http",
                url = %query.url,
                "Rejected proxy download"
            );
            state.record_error();
            e
        },
    )?;

    let upstream = state
        .download_client
        .get(url.clone())
        .send()
        .await
        .map_err(|e| {
            state.record_error();
            HttpServerError::Upstream(format!("Download failed: {e}"))
        })?;

    let status = upstream.status();
    if !status.is_success() {
        state.record_error();
        return Err(HttpServerError::Upstream(format!(
            "Upstream returned {} for {}",
            status.as_u16(),
            url
        )));
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("audio/mpeg"));
    let content_length = upstream.content_length();

    let stream = upstream.bytes_stream().map_err(std::io::Error::other);
    let mut resp = Body::from_stream(stream).into_response();
    let headers = resp.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    if let Some(len) = content_length {
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    }
    Ok(resp)
}

/// GET /health - 健康检查
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    state.record_request(Endpoint::Health);
    let active_tasks = state.tracker().registry().active_count().await;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_seconds: state.stats.uptime_seconds(),
        requests_handled: state.stats.requests_total(),
        errors: state.stats.errors_total(),
        active_tasks,
        timestamp: Local::now().to_rfc3339(),
    })
}
