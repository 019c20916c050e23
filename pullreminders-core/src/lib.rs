//! Pullreminders Core - credential storage and settings for pullreminders
//!
//! This crate owns everything that touches the local filesystem: the
//! persisted GitHub credential and the optional settings file.

pub mod config;
pub mod credentials;
pub mod error;

pub use config::{CliOverrides, Settings, DEFAULT_API_URL, DEFAULT_CALLBACK_TIMEOUT};
pub use credentials::{expand_path, expand_path_with, Credential, CredentialStore};
pub use error::{Error, Result};
