//! Shared reqwest plumbing for provider and mirror clients.

use std::time::Duration;

use serde_json::Value;
use songbridge_core::api::{AudioPayload, ProviderError, TransportKind};

const BODY_PREVIEW_LIMIT: usize = 512;

pub(crate) const DEFAULT_AUDIO_TYPE: &str = "audio/mpeg";

pub(crate) fn build_client(timeout_ms: u64) -> anyhow::Result<reqwest::Client> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_millis(timeout_ms))
        .build()?;
    Ok(http)
}

pub(crate) fn with_bearer(req: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
    if token.trim().is_empty() {
        req
    } else {
        req.bearer_auth(token)
    }
}

pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> ProviderError {
    let kind = if err.is_timeout() {
        TransportKind::Timeout
    } else if err.is_connect() {
        TransportKind::Connect
    } else if err.is_request() {
        TransportKind::Request
    } else if err.is_body() {
        TransportKind::Body
    } else if err.is_decode() {
        TransportKind::Decode
    } else {
        TransportKind::Unknown
    };
    ProviderError::Transport {
        kind,
        url: url.to_string(),
        message: err.to_string(),
    }
}

pub(crate) fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }

    let mut out = String::new();
    let mut truncated = false;
    for (idx, ch) in trimmed.chars().enumerate() {
        if idx >= BODY_PREVIEW_LIMIT {
            truncated = true;
            break;
        }
        out.push(ch);
    }

    if truncated {
        out.push_str("...");
    }

    out
}

/// Read a JSON body. Non-2xx answers become [`ProviderError::Status`]; a 2xx
/// body that is not JSON is returned as `{"raw": <text>}`.
pub(crate) async fn parse_json_response(resp: reqwest::Response) -> Result<Value, ProviderError> {
    let status = resp.status();
    let url = resp.url().to_string();
    let body = resp.text().await.map_err(|err| from_reqwest(err, &url))?;

    if !status.is_success() {
        return Err(ProviderError::Status {
            status: status.as_u16(),
            url,
            body: preview_body(&body),
        });
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str::<Value>(&body)
        .unwrap_or_else(|_| serde_json::json!({ "raw": body })))
}

/// Fetch a binary body, keeping the upstream content type.
pub(crate) async fn fetch_bytes(
    http: &reqwest::Client,
    url: &str,
) -> Result<AudioPayload, ProviderError> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|err| from_reqwest(err, url))?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ProviderError::Status {
            status: status.as_u16(),
            url: url.to_string(),
            body: preview_body(&body),
        });
    }

    let content_type = resp
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(DEFAULT_AUDIO_TYPE)
        .to_string();
    let bytes = resp.bytes().await.map_err(|err| from_reqwest(err, url))?;
    Ok(AudioPayload::new(bytes, content_type))
}

pub(crate) fn str_field<'a>(v: &'a Value, key: &str) -> Option<&'a str> {
    v.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_bodies() {
        let body = "x".repeat(BODY_PREVIEW_LIMIT + 10);
        let preview = preview_body(&body);
        assert!(preview.ends_with("..."));
        assert_eq!(preview.len(), BODY_PREVIEW_LIMIT + 3);
        assert_eq!(preview_body("   "), "<empty body>");
    }

    #[tokio::test]
    async fn non_json_success_body_is_wrapped() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/plain")
            .with_status(200)
            .with_body("upstream says hi")
            .create_async()
            .await;

        let resp = reqwest::get(format!("{}/plain", server.url())).await.unwrap();
        let v = parse_json_response(resp).await.unwrap();
        assert_eq!(v, serde_json::json!({ "raw": "upstream says hi" }));
    }

    #[tokio::test]
    async fn error_status_keeps_body_preview() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/boom")
            .with_status(503)
            .with_body("overloaded")
            .create_async()
            .await;

        let resp = reqwest::get(format!("{}/boom", server.url())).await.unwrap();
        let err = parse_json_response(resp).await.unwrap_err();
        match err {
            ProviderError::Status { status, body, .. } => {
                assert_eq!(status, 503);
                assert_eq!(body, "overloaded");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_bytes_keeps_content_type() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/song")
            .with_status(200)
            .with_header("content-type", "audio/wav")
            .with_body(vec![1u8, 2, 3])
            .create_async()
            .await;

        let http = build_client(5_000).unwrap();
        let audio = fetch_bytes(&http, &format!("{}/song", server.url()))
            .await
            .unwrap();
        assert_eq!(audio.bytes.as_ref(), &[1u8, 2, 3]);
        assert_eq!(audio.content_type, "audio/wav");
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        let http = build_client(2_000).unwrap();
        let err = fetch_bytes(&http, "http://127.0.0.1:9/none")
            .await
            .unwrap_err();
        assert!(err.is_transient());
        assert_eq!(err.kind(), "transport");
    }
}
