//! 基础请求验证逻辑

use reqwest::Url;
use songbridge_core::store::naming::validate_name;

use super::models::HttpServerError;

const MAX_TASK_ID_LEN: usize = 128;

/// 验证task_id格式（仅允许字母数字、下划线、连字符）
pub fn validate_task_id(task_id: &str) -> Result<(), HttpServerError> {
    if task_id.is_empty() {
        return Err(HttpServerError::InvalidRequest(
            "Task ID cannot be empty".to_string(),
        ));
    }

    if task_id.len() > MAX_TASK_ID_LEN {
        return Err(HttpServerError::InvalidRequest(format!(
            "Task ID too long ({} chars, max {})",
            task_id.len(),
            MAX_TASK_ID_LEN
        )));
    }

    if !task_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(HttpServerError::InvalidRequest(
            "Task ID can only contain alphanumeric, underscore, and hyphen characters".to_string(),
        ));
    }

    Ok(())
}

/// 验证产物文件名，防止路径穿越
pub fn validate_artifact_name(name: &str) -> Result<(), HttpServerError> {
    validate_name(name).map_err(|e| HttpServerError::InvalidRequest(e.to_string()))
}

/// 验证外部下载地址：仅允许 http/https，且主机必须在白名单内（精确匹配或子域名）
pub fn validate_download_url(raw: &str, allowed_hosts: &[String]) -> Result<Url, HttpServerError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| HttpServerError::InvalidRequest(format!("Invalid download url: {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(HttpServerError::InvalidRequest(format!(
            "Unsupported url scheme: {}",
            url.scheme()
        )));
    }

    let host = url
        .host_str()
        .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
        .filter(|h| !h.is_empty())
        .ok_or_else(|| HttpServerError::InvalidRequest("Download url has no host".to_string()))?;

    if !host_allowed(&host, allowed_hosts) {
        return Err(HttpServerError::InvalidRequest(format!(
            "Host not allowed: {host}"
        )));
    }

    Ok(url)
}

fn host_allowed(host: &str, allowed_hosts: &[String]) -> bool {
    allowed_hosts.iter().any(|allowed| {
        let allowed = allowed.trim().trim_end_matches('.').to_ascii_lowercase();
        !allowed.is_empty()
            && (host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.')))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn allowed() -> Vec<String> {
        vec!["sunoapi.org".into(), "suno.ai".into()]
    }

    #[test]
    fn test_validate_task_id() {
        assert!(validate_task_id("5c79c0e3a7b1").is_ok());
        assert!(validate_task_id("inline-1700000000000").is_ok());
        assert!(validate_task_id("").is_err());
        assert!(validate_task_id("a/b").is_err());
        assert!(validate_task_id(&"x".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_artifact_name() {
        assert!(validate_artifact_name("song-T1-0.mp3").is_ok());
        assert!(validate_artifact_name("inline-1").is_ok());
        assert!(validate_artifact_name("../etc/passwd").is_err());
        assert!(validate_artifact_name("a/b.mp3").is_err());
        assert!(validate_artifact_name(".hidden").is_err());
    }

    #[test]
    fn test_exact_and_subdomain_hosts_allowed() {
        assert!(validate_download_url("https://sunoapi.org/a.mp3", &allowed()).is_ok());
        assert!(validate_download_url("https://cdn1.suno.ai/a.mp3", &allowed()).is_ok());
        assert!(validate_download_url("https://CDN1.Suno.AI./a.mp3", &allowed()).is_ok());
    }

    #[test]
    fn test_lookalike_hosts_rejected() {
        for url in [
            "https://evilsuno.ai/a.mp3",
            "https://suno.ai.evil.com/a.mp3",
            "https://169.254.169.254/latest/meta-data",
            "http://localhost:8080/health",
        ] {
            assert!(validate_download_url(url, &allowed()).is_err(), "{url}");
        }
    }

    #[test]
    fn test_non_http_schemes_rejected() {
        assert!(validate_download_url("file:///etc/passwd", &allowed()).is_err());
        assert!(validate_download_url("ftp://suno.ai/a.mp3", &allowed()).is_err());
        assert!(validate_download_url("not a url", &allowed()).is_err());
    }

    #[test]
    fn test_empty_allow_list_rejects_everything() {
        assert!(validate_download_url("https://suno.ai/a.mp3", &[]).is_err());
        assert!(validate_download_url("https://suno.ai/a.mp3", &[String::new()]).is_err());
    }
}
