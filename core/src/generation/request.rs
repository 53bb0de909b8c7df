use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationMode {
    /// User supplies lyrics; tags become the style.
    Custom,
    /// Provider writes lyrics from a free-text description.
    Prompt,
    /// No vocals; prompt is optional.
    Instrumental,
}

impl GenerationMode {
    pub const ALL: [GenerationMode; 3] = [Self::Custom, Self::Prompt, Self::Instrumental];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Prompt => "prompt",
            Self::Instrumental => "instrumental",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "custom" => Some(Self::Custom),
            "prompt" => Some(Self::Prompt),
            "instrumental" => Some(Self::Instrumental),
            _ => None,
        }
    }

    /// Leading segment of artifact file names produced in this mode.
    pub fn artifact_prefix(self) -> &'static str {
        match self {
            Self::Custom => "song",
            Self::Prompt => "prompt",
            Self::Instrumental => "instrumental",
        }
    }
}

/// Which upstream service handles a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Returns a task id and must be polled.
    Suno,
    /// Answers with the encoded audio in a single round trip.
    Inline,
}

impl ProviderKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Suno => "suno",
            Self::Inline => "inline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "suno" => Some(Self::Suno),
            "inline" => Some(Self::Inline),
            _ => None,
        }
    }

    /// Prefix of task ids synthesized locally. Polling providers hand out
    /// their own ids and have none.
    pub fn task_prefix(self) -> Option<&'static str> {
        match self {
            Self::Suno => None,
            Self::Inline => Some("inline"),
        }
    }

    /// Route a task id back to the provider that issued it.
    pub fn from_task_id(task_id: &str) -> Self {
        let inline_prefix = Self::Inline.task_prefix().unwrap_or_default();
        match task_id.strip_prefix(inline_prefix) {
            Some(rest) if rest.starts_with('-') => Self::Inline,
            _ => Self::Suno,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    /// Number of outputs kept from the provider result.
    pub count: u8,
    pub style_weight: f32,
    pub weirdness: f32,
    pub audio_weight: f32,
    /// Only honored by synchronous providers.
    pub duration_secs: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            count: 1,
            style_weight: 0.65,
            weirdness: 0.5,
            audio_weight: 0.65,
            duration_secs: 30,
        }
    }
}

/// A request that passed validation. Build it with [`super::GenerationDraft::validate`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub provider: ProviderKind,
    pub prompt: Option<String>,
    pub lyrics: Option<String>,
    pub tags: Vec<String>,
    pub title: Option<String>,
    pub negative_tags: Option<String>,
    pub model: Option<String>,
    pub params: GenerationParams,
}

impl GenerationRequest {
    /// Tags joined the way providers expect a style string.
    pub fn style(&self) -> String {
        self.tags.join(", ")
    }

    pub fn is_instrumental(&self) -> bool {
        self.mode == GenerationMode::Instrumental
    }
}
