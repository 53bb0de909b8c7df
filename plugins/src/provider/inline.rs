use async_trait::async_trait;
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use songbridge_core::api::{
    AudioPayload, GenerationRequest, InlineProviderConfig, ProviderClient, ProviderError,
    ProviderKind, ProviderStyle, Submission,
};

use super::http::{build_client, from_reqwest, parse_json_response, str_field, with_bearer, DEFAULT_AUDIO_TYPE};

#[derive(Debug, Serialize)]
struct MusicBody<'a> {
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lyrics: Option<&'a str>,
    tags: &'a [String],
    instrumental: bool,
    duration_seconds: u32,
}

/// Client for services that answer a generation request with the audio
/// itself, base64 encoded in the JSON body.
#[derive(Clone)]
pub struct InlineClient {
    http: reqwest::Client,
    api_key: String,
    url_music: String,
}

impl InlineClient {
    pub fn new(cfg: &InlineProviderConfig) -> anyhow::Result<Self> {
        let http = build_client(cfg.timeout_ms)?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            url_music: format!("{}/v1/music", normalized),
        })
    }
}

#[async_trait]
impl ProviderClient for InlineClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Inline
    }

    fn style(&self) -> ProviderStyle {
        ProviderStyle::Synchronous
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let url = &self.url_music;
        let body = MusicBody {
            prompt: request.prompt.as_deref().unwrap_or_default(),
            lyrics: request.lyrics.as_deref(),
            tags: &request.tags,
            instrumental: request.is_instrumental(),
            duration_seconds: request.params.duration_secs,
        };
        tracing::debug!(
            target: "songbridge.provider",
            stage = "inline.music.in",
            url = %url,
            duration_secs = body.duration_seconds,
        );

        let req = self.http.post(url).json(&body);
        let resp = with_bearer(req, &self.api_key)
            .send()
            .await
            .map_err(|err| from_reqwest(err, url))?;
        let v = parse_json_response(resp).await?;
        let audio = decode_audio(&v)?;

        tracing::debug!(
            target: "songbridge.provider",
            stage = "inline.music.out",
            bytes = audio.bytes.len(),
            content_type = %audio.content_type,
        );
        Ok(Submission::Completed { audio })
    }
}

/// Pull the audio out of a `/v1/music` answer. Accepts `audio_base64` or
/// `audio`, either plain base64 or a `data:<mime>;base64,` URL.
pub(crate) fn decode_audio(v: &Value) -> Result<AudioPayload, ProviderError> {
    if let Some(err) = v.get("error").filter(|e| !e.is_null()) {
        let message = err
            .as_str()
            .or_else(|| str_field(err, "message"))
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return Err(ProviderError::Business {
            code: None,
            message,
        });
    }

    let encoded = str_field(v, "audio_base64")
        .or_else(|| str_field(v, "audio"))
        .ok_or_else(|| ProviderError::Malformed("music response carries no audio".into()))?;

    let declared = str_field(v, "content_type").or_else(|| str_field(v, "mime_type"));
    let (data_mime, payload) = split_data_url(encoded);
    let content_type = declared.or(data_mime).unwrap_or(DEFAULT_AUDIO_TYPE);

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| ProviderError::Malformed(format!("invalid base64 audio: {e}")))?;
    if bytes.is_empty() {
        return Err(ProviderError::Malformed("music response audio is empty".into()));
    }
    Ok(AudioPayload::new(bytes, content_type))
}

fn split_data_url(s: &str) -> (Option<&str>, &str) {
    let Some(rest) = s.strip_prefix("data:") else {
        return (None, s);
    };
    match rest.split_once(',') {
        Some((meta, payload)) => {
            let mime = meta.split(';').next().filter(|m| !m.is_empty());
            (mime, payload)
        }
        None => (None, s),
    }
}
