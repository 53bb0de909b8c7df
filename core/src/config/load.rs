use std::path::{Path, PathBuf};

use super::types::{AppConfig, MirrorConfig};

const CONFIG_FILE_NAME: &str = "songbridge.toml";

/// Resolve the config file: `$SONGBRIDGE_CONFIG` first, then `./songbridge.toml`.
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(v) = std::env::var("SONGBRIDGE_CONFIG") {
        if !v.trim().is_empty() {
            return Some(PathBuf::from(v));
        }
    }

    let local = Path::new(CONFIG_FILE_NAME);
    local.exists().then(|| local.to_path_buf())
}

pub fn load_from_file(path: &Path) -> anyhow::Result<AppConfig> {
    let s = std::fs::read_to_string(path)?;
    Ok(toml::from_str::<AppConfig>(&s)?)
}

pub fn load_default() -> anyhow::Result<AppConfig> {
    let mut cfg = match config_file_path() {
        Some(path) => load_from_file(&path)?,
        None => AppConfig::default(),
    };

    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok());
    Ok(cfg)
}

/// Environment variable overrides (highest priority). Blank values are ignored.
pub fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("SUNO_API_KEY") {
        cfg.providers.suno.api_key = v;
    }
    if let Some(v) = get("SUNO_BASE_URL") {
        cfg.providers.suno.base_url = v;
    }
    if let Some(v) = get("INLINE_API_KEY") {
        cfg.providers.inline.api_key = v;
    }
    if let Some(v) = get("INLINE_BASE_URL") {
        cfg.providers.inline.base_url = v;
        cfg.providers.inline.enabled = true;
    }
    if let Some(v) = get("SONGBRIDGE_SHARED_SECRET") {
        cfg.auth.shared_secret = Some(v);
    }
    if let Some(v) = get("SONGBRIDGE_AUTO_SAVE") {
        cfg.storage.auto_save = matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes");
    }
    if let Some(v) = get("SONGBRIDGE_OUTPUT_DIR") {
        cfg.storage.dir = v;
    }
    if let Some(v) = get("SONGBRIDGE_MIRROR_URL") {
        match cfg.storage.mirror.as_mut() {
            Some(mirror) => mirror.base_url = v,
            None => {
                cfg.storage.mirror = Some(MirrorConfig {
                    base_url: v,
                    token: String::new(),
                    key_prefix: "songs".to_string(),
                    timeout_ms: 30_000,
                })
            }
        }
    }
    if let Some(v) = get("SONGBRIDGE_MIRROR_TOKEN") {
        if let Some(mirror) = cfg.storage.mirror.as_mut() {
            mirror.token = v;
        }
    }
    if let Some(v) = get("SONGBRIDGE_KEEPALIVE_URL") {
        cfg.keepalive.url = Some(v);
    }
    if let Some(v) = get("SONGBRIDGE_HOST") {
        cfg.server.host = v;
    }
    if let Some(port) = get("SONGBRIDGE_PORT").and_then(|v| v.trim().parse::<u16>().ok()) {
        cfg.server.port = port;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn env_overrides_credentials_and_toggles() {
        let vars = env(&[
            ("SUNO_API_KEY", "sk-test"),
            ("SONGBRIDGE_AUTO_SAVE", "false"),
            ("SONGBRIDGE_SHARED_SECRET", "s3cret"),
            ("SONGBRIDGE_PORT", "9091"),
        ]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| vars.get(k).cloned());

        assert_eq!(cfg.providers.suno.api_key, "sk-test");
        assert!(!cfg.storage.auto_save);
        assert_eq!(cfg.auth.shared_secret.as_deref(), Some("s3cret"));
        assert_eq!(cfg.server.port, 9091);
    }

    #[test]
    fn blank_and_invalid_values_are_ignored() {
        let vars = env(&[("SUNO_API_KEY", "   "), ("SONGBRIDGE_PORT", "not-a-port")]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| vars.get(k).cloned());

        assert!(cfg.providers.suno.api_key.is_empty());
        assert_eq!(cfg.server.port, 8080);
    }

    #[test]
    fn mirror_url_creates_mirror_section_and_token_follows() {
        let vars = env(&[
            ("SONGBRIDGE_MIRROR_URL", "https://objects.example.com/b"),
            ("SONGBRIDGE_MIRROR_TOKEN", "tok"),
        ]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| vars.get(k).cloned());

        let mirror = cfg.storage.mirror.unwrap();
        assert_eq!(mirror.base_url, "https://objects.example.com/b");
        assert_eq!(mirror.token, "tok");
    }

    #[test]
    fn inline_base_url_enables_inline_provider() {
        let vars = env(&[("INLINE_BASE_URL", "http://gen.local")]);
        let mut cfg = AppConfig::default();
        apply_env_overrides(&mut cfg, |k| vars.get(k).cloned());
        assert!(cfg.providers.inline.enabled);
    }

    #[test]
    fn load_from_file_parses_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 7000\n[registry]\nttl_secs = 30").unwrap();
        let cfg = load_from_file(file.path()).unwrap();
        assert_eq!(cfg.server.port, 7000);
        assert_eq!(cfg.registry.ttl_secs, 30);
    }
}
