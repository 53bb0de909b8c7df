use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use songbridge_core::api::{
    AudioPayload, GenerationMode, GenerationRequest, ProviderClient, ProviderError, ProviderKind,
    ProviderStatus, ProviderStyle, ResultLocator, Submission, SunoProviderConfig,
};

use super::http::{build_client, fetch_bytes, from_reqwest, parse_json_response, str_field, with_bearer};

const OK_CODE: i64 = 200;
const FAILURE_SUFFIXES: [&str; 3] = ["_FAILED", "_ERROR", "_EXCEPTION"];
const UNTITLED: &str = "Untitled";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateBody<'a> {
    prompt: &'a str,
    style: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    custom_mode: bool,
    instrumental: bool,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_tags: Option<&'a str>,
    style_weight: f32,
    weirdness_constraint: f32,
    audio_weight: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    call_back_url: Option<&'a str>,
}

/// Client for Suno-compatible task APIs: submit returns a task id which is
/// then polled through `record-info`.
#[derive(Clone)]
pub struct SunoClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    callback_url: Option<String>,
    url_generate: String,
    url_record_info: String,
}

impl SunoClient {
    pub fn new(cfg: &SunoProviderConfig) -> anyhow::Result<Self> {
        let http = build_client(cfg.timeout_ms)?;
        let normalized = cfg.base_url.trim_end_matches('/');
        Ok(Self {
            http,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
            callback_url: cfg.callback_url.clone().filter(|u| !u.trim().is_empty()),
            url_generate: format!("{}/api/v1/generate", normalized),
            url_record_info: format!("{}/api/v1/generate/record-info", normalized),
        })
    }

    fn body<'a>(&'a self, request: &'a GenerationRequest, style: &'a str) -> GenerateBody<'a> {
        let custom_mode = match request.mode {
            GenerationMode::Custom => true,
            GenerationMode::Instrumental => !style.is_empty(),
            GenerationMode::Prompt => false,
        };
        // In custom mode the upstream `prompt` field carries the lyrics.
        let prompt = match request.mode {
            GenerationMode::Custom => request.lyrics.as_deref(),
            _ => request.prompt.as_deref(),
        }
        .unwrap_or_default();
        let title = if custom_mode {
            Some(request.title.as_deref().unwrap_or(UNTITLED))
        } else {
            request.title.as_deref()
        };

        GenerateBody {
            prompt,
            style,
            title,
            custom_mode,
            instrumental: request.is_instrumental(),
            model: request.model.as_deref().unwrap_or(&self.model),
            negative_tags: request.negative_tags.as_deref(),
            style_weight: request.params.style_weight,
            weirdness_constraint: request.params.weirdness,
            audio_weight: request.params.audio_weight,
            call_back_url: self.callback_url.as_deref(),
        }
    }
}

#[async_trait]
impl ProviderClient for SunoClient {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Suno
    }

    fn style(&self) -> ProviderStyle {
        ProviderStyle::Polling
    }

    async fn submit(&self, request: &GenerationRequest) -> Result<Submission, ProviderError> {
        let url = &self.url_generate;
        let style = request.style();
        let body = self.body(request, &style);
        tracing::debug!(
            target: "songbridge.provider",
            stage = "suno.generate.in",
            url = %url,
            mode = %request.mode.as_str(),
            custom_mode = body.custom_mode,
            prompt_len = body.prompt.len(),
        );

        let req = self.http.post(url).json(&body);
        let resp = with_bearer(req, &self.api_key)
            .send()
            .await
            .map_err(|err| from_reqwest(err, url))?;
        let v = parse_json_response(resp).await?;
        ensure_ok_code(&v)?;

        let task_id = v
            .get("data")
            .and_then(|d| str_field(d, "taskId"))
            .ok_or_else(|| ProviderError::Malformed("generate response missing data.taskId".into()))?;

        tracing::debug!(
            target: "songbridge.provider",
            stage = "suno.generate.out",
            task_id = %task_id
        );
        Ok(Submission::Accepted {
            task_id: task_id.to_string(),
        })
    }

    async fn fetch_status(&self, task_id: &str) -> Result<ProviderStatus, ProviderError> {
        let url = &self.url_record_info;
        let req = self.http.get(url).query(&[("taskId", task_id)]);
        let resp = with_bearer(req, &self.api_key)
            .send()
            .await
            .map_err(|err| from_reqwest(err, url))?;
        let v = parse_json_response(resp).await?;
        let status = normalize_record(&v);

        tracing::debug!(
            target: "songbridge.provider",
            stage = "suno.record_info.out",
            task_id = %task_id,
            upstream_status = str_field(&v["data"], "status").unwrap_or("<none>"),
            terminal = status.is_terminal(),
        );
        Ok(status)
    }

    async fn fetch_audio(&self, locator: &ResultLocator) -> Result<AudioPayload, ProviderError> {
        fetch_bytes(&self.http, &locator.url).await
    }
}

fn ensure_ok_code(v: &Value) -> Result<(), ProviderError> {
    match v.get("code").and_then(Value::as_i64) {
        Some(OK_CODE) => Ok(()),
        Some(code) => Err(ProviderError::Business {
            code: Some(code),
            message: str_field(v, "msg").unwrap_or("upstream rejected the request").to_string(),
        }),
        None => Err(ProviderError::Malformed(format!(
            "response without code: {}",
            super::http::preview_body(&v.to_string())
        ))),
    }
}

/// Map a `record-info` body to [`ProviderStatus`]. Success wins over failure;
/// anything unrecognised keeps polling.
pub(crate) fn normalize_record(v: &Value) -> ProviderStatus {
    let data = &v["data"];
    let status = str_field(data, "status").unwrap_or_default();
    let locators = locators(data);

    if status == "SUCCESS" && !locators.is_empty() {
        return ProviderStatus::Success { locators };
    }

    let code = v.get("code").and_then(Value::as_i64);
    if let Some(code) = code.filter(|c| *c != OK_CODE) {
        let msg = str_field(v, "msg").unwrap_or("upstream error");
        return ProviderStatus::Failure {
            detail: format!("{msg} (code {code})"),
        };
    }

    if FAILURE_SUFFIXES.iter().any(|s| status.ends_with(s)) {
        let detail = str_field(data, "errorMessage").unwrap_or(status);
        return ProviderStatus::Failure {
            detail: detail.to_string(),
        };
    }

    ProviderStatus::Pending
}

fn locators(data: &Value) -> Vec<ResultLocator> {
    let Some(items) = data
        .get("response")
        .and_then(|r| r.get("sunoData"))
        .and_then(Value::as_array)
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| {
            let url = str_field(item, "audioUrl")?;
            Some(ResultLocator {
                url: url.to_string(),
                stream_url: str_field(item, "streamAudioUrl").map(str::to_string),
                title: str_field(item, "title").map(str::to_string),
                duration_secs: item.get("duration").and_then(Value::as_f64),
            })
        })
        .collect()
}
