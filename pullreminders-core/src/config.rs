//! Settings for pullreminders
//!
//! Settings are resolved with the following priority (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (PULLREMINDERS_*)
//! 3. Settings file (~/.config/pullreminders/settings.toml)
//! 4. Default values
//!
//! The OAuth client id and secret default to values injected at build time
//! through the same environment variable names.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::credentials::DEFAULT_CREDENTIALS_PATH;
use crate::{Error, Result};

/// Environment variable for the OAuth client id
pub const ENV_CLIENT_ID: &str = "PULLREMINDERS_CLIENT_ID";
/// Environment variable for the OAuth client secret
pub const ENV_CLIENT_SECRET: &str = "PULLREMINDERS_CLIENT_SECRET";
/// Environment variable for the OAuth host
pub const ENV_OAUTH_HOST: &str = "PULLREMINDERS_OAUTH_HOST";
/// Environment variable for the GraphQL endpoint
pub const ENV_API_URL: &str = "PULLREMINDERS_API_URL";
/// Environment variable for the credential file path
pub const ENV_CONFIG: &str = "PULLREMINDERS_CONFIG";

const DEFAULT_OAUTH_HOST: &str = "github.com";
/// GraphQL endpoint for github.com
pub const DEFAULT_API_URL: &str = "https://api.github.com/graphql";
/// How long the login waits for the browser redirect by default
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Root settings structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Host serving the OAuth authorize and token endpoints
    pub oauth_host: String,

    /// GraphQL endpoint
    pub api_url: String,

    /// OAuth app client id
    pub client_id: Option<String>,

    /// OAuth app client secret
    #[serde(skip_serializing)]
    pub client_secret: Option<String>,

    /// Where the credential file lives
    pub credentials_path: String,

    /// How long to wait for the browser to come back to the local listener
    #[serde(with = "humantime_serde")]
    pub callback_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            oauth_host: DEFAULT_OAUTH_HOST.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            client_id: option_env!("PULLREMINDERS_CLIENT_ID").map(str::to_string),
            client_secret: option_env!("PULLREMINDERS_CLIENT_SECRET").map(str::to_string),
            credentials_path: DEFAULT_CREDENTIALS_PATH.to_string(),
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
        }
    }
}

/// Values passed on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub oauth_host: Option<String>,
    pub api_url: Option<String>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub credentials_path: Option<String>,
}

impl Settings {
    /// Load settings from the default settings file location
    ///
    /// Returns defaults if the file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = Self::default_settings_path() {
            if path.exists() {
                return Self::load_from_file(&path);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading settings");
        let contents = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents).map_err(|e| Error::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the default settings file path
    ///
    /// Returns `~/.config/pullreminders/settings.toml` on Linux
    pub fn default_settings_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("pullreminders").join("settings.toml"))
    }

    /// Apply environment variable overrides
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(host) = lookup(ENV_OAUTH_HOST) {
            self.oauth_host = host;
        }
        if let Some(url) = lookup(ENV_API_URL) {
            self.api_url = url;
        }
        if let Some(id) = lookup(ENV_CLIENT_ID) {
            self.client_id = Some(id);
        }
        if let Some(secret) = lookup(ENV_CLIENT_SECRET) {
            self.client_secret = Some(secret);
        }
        if let Some(path) = lookup(ENV_CONFIG) {
            self.credentials_path = path;
        }

        self
    }

    /// Apply CLI flag overrides
    pub fn with_cli_overrides(mut self, cli: CliOverrides) -> Self {
        if let Some(host) = cli.oauth_host {
            self.oauth_host = host;
        }
        if let Some(url) = cli.api_url {
            self.api_url = url;
        }
        if let Some(id) = cli.client_id {
            self.client_id = Some(id);
        }
        if let Some(secret) = cli.client_secret {
            self.client_secret = Some(secret);
        }
        if let Some(path) = cli.credentials_path {
            self.credentials_path = path;
        }

        self
    }

    /// Load settings with all overrides applied
    ///
    /// Priority: CLI > env > settings file > defaults
    pub fn load_with_overrides(cli: CliOverrides) -> Result<Self> {
        Ok(Self::load()?.with_env_overrides().with_cli_overrides(cli))
    }

    /// The OAuth client id and secret, required only for the login flow
    pub fn oauth_credentials(&self) -> Result<(&str, &str)> {
        let id = self
            .client_id
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("OAuth client id not set ({})", ENV_CLIENT_ID)))?;
        let secret = self
            .client_secret
            .as_deref()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                Error::Config(format!("OAuth client secret not set ({})", ENV_CLIENT_SECRET))
            })?;
        Ok((id, secret))
    }
}
