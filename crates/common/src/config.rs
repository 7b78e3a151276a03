//! Client configuration types and loading
//!
//! Endpoint URLs and the request deadline live in an explicit `ApiConfig`
//! handed to each client at construction, so tests and multi-tenant callers
//! never share mutable globals. The app secret is read from
//! `app_secret_file`, never stored in the TOML directly.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::secret::Secret;

/// Production API root; every request path is appended to this verbatim
pub const DEFAULT_BASE_URL: &str = "https://open.feishu.cn/open-apis";

/// Path of the tenant-level token exchange, relative to the base URL
pub const TENANT_ACCESS_TOKEN_PATH: &str = "/auth/v3/tenant_access_token/internal";

/// Client-wide deadline for one request, connection setup included
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Root configuration
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub app: Option<AppConfig>,
}

/// Endpoint and transport settings
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Token exchange URL override. Defaults to `base_url` + `TENANT_ACCESS_TOKEN_PATH`.
    #[serde(default)]
    pub token_url: Option<String>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// App identity. `app_secret` is filled from `app_secret_file` at load time.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    pub app_id: String,
    pub app_secret_file: PathBuf,
    #[serde(skip)]
    pub app_secret: Secret,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ApiConfig {
    /// Config pointing at a different API root (a mock server, a private deployment).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    /// Builder-style timeout override.
    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Resolved token exchange URL.
    pub fn token_url(&self) -> String {
        match &self.token_url {
            Some(url) => url.clone(),
            None => format!(
                "{}{}",
                self.base_url.trim_end_matches('/'),
                TENANT_ACCESS_TOKEN_PATH
            ),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check URL schemes and the deadline.
    pub fn validate(&self) -> Result<()> {
        check_http_url("base_url", &self.base_url)?;
        if let Some(ref url) = self.token_url {
            check_http_url("token_url", url)?;
        }
        if self.timeout_secs == 0 {
            return Err(Error::Invalid("timeout_secs must be greater than 0".into()));
        }
        Ok(())
    }
}

fn check_http_url(field: &str, url: &str) -> Result<()> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(Error::Invalid(format!(
            "{field} must start with http:// or https://, got: {url}"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::read(path, e))?;
        Self::from_toml_str(&contents)
    }

    /// Parse, resolve the app secret file, and validate.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: Config = toml::from_str(contents)?;
        config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();
        config.api.validate()?;

        if let Some(ref mut app) = config.app {
            if app.app_id.trim().is_empty() {
                return Err(Error::Invalid("app_id must not be empty".into()));
            }
            let secret = std::fs::read_to_string(&app.app_secret_file)
                .map_err(|e| Error::read(&app.app_secret_file, e))?;
            let secret = secret.trim();
            if secret.is_empty() {
                return Err(Error::Invalid(format!(
                    "app_secret_file {} is empty",
                    app.app_secret_file.display()
                )));
            }
            app.app_secret = Secret::new(secret);
        }

        Ok(config)
    }
}
