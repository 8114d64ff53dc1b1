use std::collections::BTreeMap;

/// Environment variable holding the API base URL.
pub const BASE_URL_ENV: &str = "API_BASE_URL";

/// Base URL used when [`BASE_URL_ENV`] is unset or blank.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

/// Configures timeout, retry behavior and per-call defaults.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Retries after the initial attempt, unless a call overrides it.
    pub max_retries: usize,
    /// Backoff unit in milliseconds; retry `n` waits `unit * 2^n`.
    pub retry_backoff_ms: u64,
    /// Headers sent with every request. Per-call headers win on conflict.
    pub default_headers: BTreeMap<String, String>,
    /// Target handed to the session-expired handler on `401`.
    pub login_path: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 10_000,
            max_retries: 1,
            retry_backoff_ms: 1_000,
            default_headers: BTreeMap::from([(
                "content-type".to_owned(),
                "application/json".to_owned(),
            )]),
            login_path: "/login".to_owned(),
        }
    }
}

/// Picks the configured base URL, falling back to [`DEFAULT_BASE_URL`].
pub fn resolve_base_url(configured: Option<String>) -> String {
    configured
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
}

/// Joins a base URL and a request path with exactly one `/` between them.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        return base.to_owned();
    }
    format!("{base}/{}", path.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::{join_url, resolve_base_url, ClientOptions, DEFAULT_BASE_URL};

    #[test]
    fn defaults_match_documented_policy() {
        let opts = ClientOptions::default();
        assert_eq!(opts.timeout_ms, 10_000);
        assert_eq!(opts.max_retries, 1);
        assert_eq!(opts.retry_backoff_ms, 1_000);
        assert_eq!(
            opts.default_headers.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(opts.login_path, "/login");
    }

    #[test]
    fn base_url_falls_back_when_missing_or_blank() {
        assert_eq!(resolve_base_url(None), DEFAULT_BASE_URL);
        assert_eq!(resolve_base_url(Some("   ".to_owned())), DEFAULT_BASE_URL);
        assert_eq!(
            resolve_base_url(Some(" https://api.school.test ".to_owned())),
            "https://api.school.test"
        );
    }

    #[test]
    fn join_url_normalizes_slashes() {
        assert_eq!(join_url("http://h/api/", "/students"), "http://h/api/students");
        assert_eq!(join_url("http://h/api", "students/5"), "http://h/api/students/5");
        assert_eq!(join_url("http://h/api/", ""), "http://h/api");
    }
}
