//! Client configuration and API key discovery.

use std::path::Path;
use std::time::Duration;
use sync_core::{Error, Result};

/// Server used when none is configured.
pub const DEFAULT_SERVER: &str = "https://api.getgrist.com";

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GRIST_API_KEY";

/// File in the home directory holding the API key.
pub const API_KEY_FILE: &str = ".grist-api-key";

/// How often and how long to wait before retrying a request that failed
/// with transient lock contention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Pause before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    /// Never retry.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            delay: Duration::ZERO,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            delay: Duration::from_secs(2),
        }
    }
}

/// Connection settings for one document.
#[derive(Debug, Clone)]
pub struct GristConfig {
    /// Server base URL, e.g. `https://api.getgrist.com`
    pub server: String,
    /// Document id (the part of the document URL after `/doc/`)
    pub doc_id: String,
    /// API key; discovered with [`resolve_api_key`] when `None`
    pub api_key: Option<String>,
    /// Log and skip every non-GET request
    pub dry_run: bool,
    pub retry: RetryPolicy,
    /// Timeout of a single HTTP request
    pub timeout: Duration,
}

impl GristConfig {
    pub fn new(doc_id: impl Into<String>) -> Self {
        Self {
            server: DEFAULT_SERVER.to_string(),
            doc_id: doc_id.into(),
            api_key: None,
            dry_run: false,
            retry: RetryPolicy::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_server(mut self, server: impl Into<String>) -> Self {
        self.server = server.into();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Full URL of a document endpoint: `<server>/api/docs/<doc_id>/<path>`.
    pub fn doc_url(&self, path: &str) -> String {
        format!(
            "{}/api/docs/{}/{}",
            self.server.trim_end_matches('/'),
            self.doc_id,
            path
        )
    }
}

/// Find the API key: `explicit` if given, else the `GRIST_API_KEY`
/// environment variable, else the contents of `~/.grist-api-key`.
pub fn resolve_api_key(explicit: Option<&str>) -> Result<String> {
    let env_key = std::env::var(API_KEY_ENV).ok();
    let key_path = dirs::home_dir().map(|home| home.join(API_KEY_FILE));
    api_key_from(explicit, env_key, key_path.as_deref())
}

/// [`resolve_api_key`] with the environment value and key file location
/// passed in.
pub fn api_key_from(
    explicit: Option<&str>,
    env_key: Option<String>,
    key_path: Option<&Path>,
) -> Result<String> {
    if let Some(key) = explicit.filter(|k| !k.is_empty()) {
        return Ok(key.to_string());
    }
    if let Some(key) = env_key.filter(|k| !k.is_empty()) {
        return Ok(key);
    }

    let shown_path = key_path.map_or_else(
        || format!("~/{API_KEY_FILE}"),
        |p| p.display().to_string(),
    );
    if let Some(path) = key_path.filter(|p| p.exists()) {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read API key file {shown_path}: {e}"))
        })?;
        return Ok(contents.trim().to_string());
    }

    Err(Error::Configuration(format!(
        "Grist API key not found in {API_KEY_ENV} env, nor in {shown_path}"
    )))
}
