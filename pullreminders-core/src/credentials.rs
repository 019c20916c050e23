//! Credential storage
//!
//! The GitHub credential is kept in a small YAML file with two keys, `login`
//! and `token`. The key names match files written by earlier releases and
//! must not change.

use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Error, Result};

/// Default location of the credential file
pub const DEFAULT_CREDENTIALS_PATH: &str = "~/.config/pullreminders/config.yml";

/// The persisted (account, access token) pair
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Credential {
    /// GitHub login of the account that owns the token
    #[serde(rename = "login")]
    pub account: String,
    /// OAuth access token
    pub token: String,
}

impl Credential {
    /// Build a credential, rejecting empty fields
    pub fn new(account: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let credential = Self {
            account: account.into(),
            token: token.into(),
        };
        credential.validate().map_err(Error::InvalidCredential)?;
        Ok(credential)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.account.trim().is_empty() {
            return Err("login is empty".to_string());
        }
        if self.token.trim().is_empty() {
            return Err("token is empty".to_string());
        }
        Ok(())
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("account", &self.account)
            .finish_non_exhaustive()
    }
}

/// Reads and writes the credential file
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: String,
}

impl CredentialStore {
    /// Create a store for the given path
    ///
    /// A leading `~` is expanded to the home directory when the file is
    /// accessed, not here.
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }

    /// The path as configured, before expansion
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The absolute path of the credential file
    pub fn resolved_path(&self) -> Result<PathBuf> {
        let expanded = expand_path(&self.path)?;
        std::path::absolute(&expanded).map_err(|source| Error::Io {
            path: expanded,
            source,
        })
    }

    /// Load the stored credential
    ///
    /// Returns [`Error::NotFound`] when the file does not exist so callers can
    /// start the login flow instead of failing.
    pub fn load(&self) -> Result<Credential> {
        let path = self.resolved_path()?;
        debug!(path = %path.display(), "Loading credential");

        let contents = fs::read_to_string(&path).map_err(|e| Error::on_read(&path, e))?;

        let credential: Credential =
            serde_yaml::from_str(&contents).map_err(|e| Error::Parse {
                path: path.clone(),
                message: e.to_string(),
            })?;

        credential
            .validate()
            .map_err(|message| Error::Parse { path, message })?;

        Ok(credential)
    }

    /// Persist a credential, replacing any existing file
    ///
    /// Missing parent directories are created. The file is written to a
    /// temporary sibling and renamed into place.
    pub fn save(&self, account: &str, token: &str) -> Result<Credential> {
        let credential = Credential::new(account, token)?;
        let data = serde_yaml::to_string(&credential)
            .map_err(|e| Error::Config(format!("Failed to serialize credential: {}", e)))?;

        let path = self.resolved_path()?;
        let dir = path.parent().ok_or_else(|| {
            Error::Config(format!(
                "Credential path {} has no parent directory",
                path.display()
            ))
        })?;

        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|source| Error::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            debug!(dir = %dir.display(), "Created credential directory");
        }

        write_file(&path, dir, data.as_bytes())?;

        info!(path = %path.display(), account = %credential.account, "Stored credential");
        Ok(credential)
    }
}

fn write_file(path: &Path, dir: &Path, data: &[u8]) -> Result<()> {
    let io_err = |source: std::io::Error| Error::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(data).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(file.path(), fs::Permissions::from_mode(0o644)).map_err(io_err)?;
    }

    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

/// Expand a leading `~` against the given home directory
///
/// Only `~` on its own and a `~/` prefix are expanded. A `~` anywhere else,
/// as in `/a/~/b` or `~user`, is left alone.
pub fn expand_path_with(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}

/// Expand a leading `~` against the current user's home directory
pub fn expand_path(path: &str) -> Result<PathBuf> {
    if path != "~" && !path.starts_with("~/") {
        return Ok(PathBuf::from(path));
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
    Ok(expand_path_with(path, &home))
}
