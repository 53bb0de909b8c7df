use async_trait::async_trait;
use songbridge_core::api::{ArtifactMirror, AudioPayload, MirrorConfig, StoreError};

use crate::provider::http::{build_client, preview_body, with_bearer};

/// Copies artifacts to an object store that accepts
/// `PUT {base_url}/{key_prefix}/{name}` with a bearer token.
#[derive(Clone)]
pub struct HttpMirror {
    http: reqwest::Client,
    base_url: String,
    token: String,
    key_prefix: String,
}

impl HttpMirror {
    pub fn new(cfg: &MirrorConfig) -> anyhow::Result<Self> {
        Ok(Self {
            http: build_client(cfg.timeout_ms)?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            token: cfg.token.clone(),
            key_prefix: cfg.key_prefix.trim_matches('/').to_string(),
        })
    }

    pub fn key_for(&self, name: &str) -> String {
        if self.key_prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.key_prefix, name)
        }
    }
}

#[async_trait]
impl ArtifactMirror for HttpMirror {
    fn name(&self) -> &str {
        "http"
    }

    async fn put(&self, name: &str, payload: &AudioPayload) -> Result<String, StoreError> {
        let key = self.key_for(name);
        let url = format!("{}/{}", self.base_url, key);
        let req = self
            .http
            .put(&url)
            .header(reqwest::header::CONTENT_TYPE, payload.content_type.as_str())
            .body(payload.bytes.clone());

        let resp = with_bearer(req, &self.token)
            .send()
            .await
            .map_err(|err| StoreError::Mirror {
                key: key.clone(),
                message: err.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(StoreError::Mirror {
                key,
                message: format!("status={} body={}", status.as_u16(), preview_body(&body)),
            });
        }

        tracing::debug!(
            target: "songbridge.store",
            key = %key,
            bytes = payload.bytes.len(),
            "Mirrored artifact"
        );
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mirror(base: &str) -> HttpMirror {
        HttpMirror::new(&MirrorConfig {
            base_url: format!("{base}/"),
            token: "tok".into(),
            key_prefix: "/songs/".into(),
            timeout_ms: 5_000,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn put_uploads_under_prefix() {
        let mut server = mockito::Server::new_async().await;
        let m = server
            .mock("PUT", "/songs/song-T1-0.mp3")
            .match_header("authorization", "Bearer tok")
            .match_header("content-type", "audio/mpeg")
            .match_body(vec![9u8, 8, 7])
            .with_status(201)
            .create_async()
            .await;

        let key = mirror(&server.url())
            .put("song-T1-0.mp3", &AudioPayload::new(vec![9u8, 8, 7], "audio/mpeg"))
            .await
            .unwrap();
        assert_eq!(key, "songs/song-T1-0.mp3");
        m.assert_async().await;
    }

    #[tokio::test]
    async fn rejected_upload_is_mirror_error() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("PUT", "/songs/a.mp3")
            .with_status(403)
            .with_body("denied")
            .create_async()
            .await;

        let err = mirror(&server.url())
            .put("a.mp3", &AudioPayload::new(vec![1u8], "audio/mpeg"))
            .await
            .unwrap_err();
        match err {
            StoreError::Mirror { key, message } => {
                assert_eq!(key, "songs/a.mp3");
                assert!(message.contains("403"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
