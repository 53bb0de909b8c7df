//! HTTP API数据模型

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use songbridge_core::api::{ReportState, ResultLocator, StatusReport};

// ============= Generate =============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub status: &'static str,
    pub task_id: String,
}

impl GenerateResponse {
    pub fn submitted(task_id: String) -> Self {
        Self {
            status: "SUBMITTED",
            task_id,
        }
    }
}

// ============= Status =============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: ReportState,
    pub task_id: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub result_locators: Vec<ResultLocator>,
    /// 本地存储的下载路径
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub downloads: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<StatusReport> for StatusResponse {
    fn from(report: StatusReport) -> Self {
        Self {
            status: report.status,
            task_id: report.task_id,
            result_locators: report.result_locators,
            downloads: report
                .artifacts
                .iter()
                .map(|name| format!("/download/{name}"))
                .collect(),
            message: report.message,
        }
    }
}

// ============= Download =============

#[derive(Debug, Deserialize)]
pub struct ProxyDownloadQuery {
    pub url: String,
}

// ============= Health =============

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    pub requests_handled: u64,
    pub errors: u64,
    pub active_tasks: usize,
    pub timestamp: String,
}

// ============= Error =============

#[derive(Debug)]
pub enum HttpServerError {
    InvalidRequest(String),
    Unauthorized,
    NotFound(String),
    Upstream(String),
    Internal(String),
}

impl HttpServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, message) = match self {
            Self::InvalidRequest(msg) => ("INVALID_REQUEST", msg),
            Self::Unauthorized => ("UNAUTHORIZED", "Missing or invalid x-api-key".to_string()),
            Self::NotFound(msg) => ("NOT_FOUND", msg),
            Self::Upstream(msg) => ("UPSTREAM_ERROR", msg),
            Self::Internal(msg) => ("INTERNAL_ERROR", msg),
        };

        let body = serde_json::json!({
            "status": "ERROR",
            "message": message,
            "error_code": error_code,
        });

        (status, Json(body)).into_response()
    }
}
