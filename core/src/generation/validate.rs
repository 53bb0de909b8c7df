use serde::{Deserialize, Deserializer};
use thiserror::Error;

use super::request::{GenerationMode, GenerationParams, GenerationRequest, ProviderKind};

const MAX_PROMPT_CHARS: usize = 3_000;
const MAX_LYRICS_CHARS: usize = 5_000;
const MAX_TITLE_CHARS: usize = 100;
const MAX_STYLE_CHARS: usize = 1_000;
const MAX_COUNT: u32 = 4;
const MIN_DURATION_SECS: u32 = 5;
const MAX_DURATION_SECS: u32 = 300;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing mode: expected one of custom, prompt, instrumental")]
    MissingMode,
    #[error("unknown mode '{0}': expected one of custom, prompt, instrumental")]
    UnknownMode(String),
    #[error("unknown provider '{0}': expected suno or inline")]
    UnknownProvider(String),
    #[error("lyrics are required in custom mode")]
    MissingLyrics,
    #[error("prompt is required in prompt mode")]
    MissingPrompt,
    #[error("{field} too long ({len} chars, max {max})")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
}

/// Generation request as received from a client, before any checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationDraft {
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default, deserialize_with = "deserialize_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "negativeTags")]
    pub negative_tags: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default, alias = "styleWeight")]
    pub style_weight: Option<f64>,
    #[serde(default, alias = "weirdnessConstraint")]
    pub weirdness: Option<f64>,
    #[serde(default, alias = "audioWeight")]
    pub audio_weight: Option<f64>,
    #[serde(default, alias = "duration")]
    pub duration_secs: Option<u32>,
}

/// Tags arrive either as a list or as one comma-separated string.
fn deserialize_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Tags {
        List(Vec<String>),
        Joined(String),
    }

    let raw = Option::<Tags>::deserialize(deserializer)?;
    let tags = match raw {
        None => Vec::new(),
        Some(Tags::List(list)) => list,
        Some(Tags::Joined(s)) => s.split(',').map(str::to_string).collect(),
    };
    Ok(tags
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_len(field: &'static str, value: Option<&str>, max: usize) -> Result<(), ValidationError> {
    if let Some(v) = value {
        let len = v.chars().count();
        if len > max {
            return Err(ValidationError::TooLong { field, len, max });
        }
    }
    Ok(())
}

fn unit_interval(field: &'static str, value: Option<f64>, default: f32) -> Result<f32, ValidationError> {
    match value {
        None => Ok(default),
        Some(v) if (0.0..=1.0).contains(&v) => Ok(v as f32),
        Some(_) => Err(ValidationError::OutOfRange {
            field,
            min: 0.0,
            max: 1.0,
        }),
    }
}

impl GenerationDraft {
    /// Check the mode invariants and fill in parameter defaults.
    pub fn validate(self) -> Result<GenerationRequest, ValidationError> {
        let mode_raw = non_blank(self.mode).ok_or(ValidationError::MissingMode)?;
        let mode = GenerationMode::parse(&mode_raw)
            .ok_or_else(|| ValidationError::UnknownMode(mode_raw.clone()))?;

        let provider = match non_blank(self.provider) {
            None => ProviderKind::Suno,
            Some(p) => ProviderKind::parse(&p).ok_or(ValidationError::UnknownProvider(p))?,
        };

        let prompt = non_blank(self.prompt);
        let lyrics = non_blank(self.lyrics);
        match mode {
            GenerationMode::Custom if lyrics.is_none() => {
                return Err(ValidationError::MissingLyrics)
            }
            GenerationMode::Prompt if prompt.is_none() => {
                return Err(ValidationError::MissingPrompt)
            }
            _ => {}
        }

        let title = non_blank(self.title);
        check_len("prompt", prompt.as_deref(), MAX_PROMPT_CHARS)?;
        check_len("lyrics", lyrics.as_deref(), MAX_LYRICS_CHARS)?;
        check_len("title", title.as_deref(), MAX_TITLE_CHARS)?;
        let style = self.tags.join(", ");
        check_len("tags", Some(style.as_str()), MAX_STYLE_CHARS)?;

        let defaults = GenerationParams::default();
        let count = match self.count {
            None => defaults.count,
            Some(c) if (1..=MAX_COUNT).contains(&c) => c as u8,
            Some(_) => {
                return Err(ValidationError::OutOfRange {
                    field: "count",
                    min: 1.0,
                    max: MAX_COUNT as f64,
                })
            }
        };
        let duration_secs = match self.duration_secs {
            None => defaults.duration_secs,
            Some(d) if (MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&d) => d,
            Some(_) => {
                return Err(ValidationError::OutOfRange {
                    field: "duration_secs",
                    min: MIN_DURATION_SECS as f64,
                    max: MAX_DURATION_SECS as f64,
                })
            }
        };

        let params = GenerationParams {
            count,
            style_weight: unit_interval("style_weight", self.style_weight, defaults.style_weight)?,
            weirdness: unit_interval("weirdness", self.weirdness, defaults.weirdness)?,
            audio_weight: unit_interval("audio_weight", self.audio_weight, defaults.audio_weight)?,
            duration_secs,
        };

        Ok(GenerationRequest {
            mode,
            provider,
            prompt,
            lyrics,
            tags: self.tags,
            title,
            negative_tags: non_blank(self.negative_tags),
            model: non_blank(self.model),
            params,
        })
    }
}
