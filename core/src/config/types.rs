use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub polling: PollingConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub download: DownloadConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub keepalive: KeepaliveConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,

    #[serde(default = "default_server_port")]
    pub port: u16,

    /// Per-request timeout applied by the HTTP middleware stack.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_server_host() -> String {
    "127.0.0.1".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_server_host(),
            port: default_server_port(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_enabled")]
    pub enabled: bool,

    /// If true, log to stderr.
    #[serde(default = "default_logging_console")]
    pub console: bool,

    /// If true, log to a file under `directory` (or OS temp dir if unset).
    #[serde(default)]
    pub file: bool,

    /// EnvFilter string, e.g. "info" or "songbridge_core=debug".
    #[serde(default = "default_logging_level")]
    pub level: String,

    /// Optional directory for log files. If empty or unset, uses OS temp dir.
    #[serde(default)]
    pub directory: Option<String>,
}

fn default_logging_enabled() -> bool {
    true
}

fn default_logging_console() -> bool {
    true
}

fn default_logging_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: default_logging_enabled(),
            console: default_logging_console(),
            file: false,
            level: default_logging_level(),
            directory: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub suno: SunoProviderConfig,

    #[serde(default)]
    pub inline: InlineProviderConfig,
}

/// Polling-style provider speaking the Suno-compatible task API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SunoProviderConfig {
    #[serde(default = "default_suno_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    #[serde(default = "default_suno_model")]
    pub model: String,

    /// Forwarded as `callBackUrl` when set.
    #[serde(default)]
    pub callback_url: Option<String>,

    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_suno_base_url() -> String {
    "https://api.sunoapi.org".to_string()
}

fn default_suno_model() -> String {
    "V4_5".to_string()
}

fn default_provider_timeout_ms() -> u64 {
    30_000
}

impl Default for SunoProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_suno_base_url(),
            api_key: String::new(),
            model: default_suno_model(),
            callback_url: None,
            timeout_ms: default_provider_timeout_ms(),
        }
    }
}

/// Synchronous provider returning base64 audio in the response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineProviderConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_inline_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub api_key: String,

    /// Generation happens within a single request, so this is much longer
    /// than the polling provider's timeout.
    #[serde(default = "default_inline_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_inline_base_url() -> String {
    "http://127.0.0.1:9000".to_string()
}

fn default_inline_timeout_ms() -> u64 {
    600_000
}

impl Default for InlineProviderConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_inline_base_url(),
            api_key: String::new(),
            timeout_ms: default_inline_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "default_backoff_factor")]
    pub factor: f64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

fn default_base_delay_ms() -> u64 {
    4_000
}

fn default_backoff_factor() -> f64 {
    1.2
}

fn default_max_delay_ms() -> u64 {
    20_000
}

fn default_max_attempts() -> u32 {
    60
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: default_base_delay_ms(),
            factor: default_backoff_factor(),
            max_delay_ms: default_max_delay_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_storage_dir")]
    pub dir: String,

    /// When false, successful tasks keep only the upstream locators.
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,

    /// Upper bound on outputs retrieved per task.
    #[serde(default = "default_max_auto_save")]
    pub max_auto_save: usize,

    #[serde(default)]
    pub mirror: Option<MirrorConfig>,
}

fn default_storage_dir() -> String {
    "./output".to_string()
}

fn default_auto_save() -> bool {
    true
}

fn default_max_auto_save() -> usize {
    2
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: default_storage_dir(),
            auto_save: default_auto_save(),
            max_auto_save: default_max_auto_save(),
            mirror: None,
        }
    }
}

/// Remote object storage reached with authenticated `PUT {base_url}/{key}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    pub base_url: String,

    #[serde(default)]
    pub token: String,

    #[serde(default = "default_mirror_key_prefix")]
    pub key_prefix: String,

    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_mirror_key_prefix() -> String {
    "songs".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// How long a terminal task stays queryable before eviction.
    #[serde(default = "default_registry_ttl_secs")]
    pub ttl_secs: u64,

    #[serde(default = "default_registry_sweep_secs")]
    pub sweep_secs: u64,
}

fn default_registry_ttl_secs() -> u64 {
    3_600
}

fn default_registry_sweep_secs() -> u64 {
    60
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_registry_ttl_secs(),
            sweep_secs: default_registry_sweep_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Hosts (and their subdomains) that `/download?url=` may fetch from.
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Connect and per-read limit. A proxied stream has no overall deadline.
    #[serde(default = "default_provider_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_allowed_hosts() -> Vec<String> {
    vec![
        "sunoapi.org".to_string(),
        "suno.ai".to_string(),
        "suno.com".to_string(),
    ]
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: default_allowed_hosts(),
            timeout_ms: default_provider_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Expected value of the `x-api-key` header. Unset disables the check.
    #[serde(default)]
    pub shared_secret: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepaliveConfig {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default = "default_keepalive_interval_secs")]
    pub interval_secs: u64,

    #[serde(default = "default_keepalive_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_keepalive_interval_secs() -> u64 {
    600
}

fn default_keepalive_timeout_secs() -> u64 {
    10
}

impl Default for KeepaliveConfig {
    fn default() -> Self {
        Self {
            url: None,
            interval_secs: default_keepalive_interval_secs(),
            timeout_secs: default_keepalive_timeout_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let cfg: AppConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.polling.base_delay_ms, 4_000);
        assert_eq!(cfg.polling.max_delay_ms, 20_000);
        assert_eq!(cfg.polling.max_attempts, 60);
        assert!((cfg.polling.factor - 1.2).abs() < f64::EPSILON);
        assert!(cfg.storage.auto_save);
        assert!(cfg.storage.mirror.is_none());
        assert!(cfg.auth.shared_secret.is_none());
    }

    #[test]
    fn partial_sections_keep_field_defaults() {
        let cfg: AppConfig = toml::from_str(
            r#"
            [polling]
            max_attempts = 5

            [storage]
            auto_save = false

            [storage.mirror]
            base_url = "https://objects.example.com/bucket"
            "#,
        )
        .unwrap();
        assert_eq!(cfg.polling.max_attempts, 5);
        assert_eq!(cfg.polling.base_delay_ms, 4_000);
        assert!(!cfg.storage.auto_save);
        let mirror = cfg.storage.mirror.unwrap();
        assert_eq!(mirror.key_prefix, "songs");
        assert!(mirror.token.is_empty());
    }
}
