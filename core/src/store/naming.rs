use crate::error::StoreError;
use crate::generation::GenerationMode;

const MAX_NAME_LEN: usize = 200;

/// Extensions probed when a lookup only knows the stem.
pub const KNOWN_EXTENSIONS: [&str; 5] = ["mp3", "wav", "ogg", "flac", "m4a"];

pub fn extension_for(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => "wav",
        "audio/ogg" | "application/ogg" => "ogg",
        "audio/flac" | "audio/x-flac" => "flac",
        "audio/mp4" | "audio/aac" | "audio/x-m4a" => "m4a",
        _ => "mp3",
    }
}

pub fn content_type_for(name: &str) -> &'static str {
    let ext = name.rsplit_once('.').map(|(_, e)| e).unwrap_or_default();
    match ext.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "m4a" => "audio/mp4",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// `<mode prefix>-<task id>-<index>.<ext>`, unique per task output.
pub fn artifact_name(mode: GenerationMode, task_id: &str, index: usize, content_type: &str) -> String {
    format!(
        "{}-{}-{}.{}",
        mode.artifact_prefix(),
        task_id,
        index,
        extension_for(content_type)
    )
}

/// Stem of [`artifact_name`], for lookups before the content type is known.
pub fn artifact_stem(mode: GenerationMode, task_id: &str, index: usize) -> String {
    format!("{}-{}-{}", mode.artifact_prefix(), task_id, index)
}

/// Synchronous-provider artifacts are keyed by the task id alone.
pub fn inline_artifact_name(task_id: &str, content_type: &str) -> String {
    format!("{}.{}", task_id, extension_for(content_type))
}

/// Reject anything that could resolve outside the storage directory.
pub fn validate_name(name: &str) -> Result<(), StoreError> {
    let ok = !name.is_empty()
        && name.len() <= MAX_NAME_LEN
        && !name.starts_with('.')
        && !name.contains("..")
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidName(name.to_string()))
    }
}
