//! Error types for GitHub operations

use thiserror::Error;

/// Result type for GitHub operations
pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur during GitHub operations
#[derive(Error, Debug)]
pub enum Error {
    /// OAuth flow failed or the token was rejected
    #[error("GitHub authentication failed: {message}")]
    Auth {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Transport error talking to the API
    #[error("GitHub request failed")]
    Http(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("GitHub API returned status {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    /// GraphQL-level errors in an otherwise successful response
    #[error("GraphQL errors: {}", .0.join(", "))]
    GraphQl(Vec<String>),

    /// Response did not match the expected schema
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing or invalid configuration
    #[error(transparent)]
    Config(#[from] pullreminders_core::Error),
}

impl Error {
    /// Authentication failure without an underlying cause
    pub fn auth(message: impl Into<String>) -> Self {
        Error::Auth {
            message: message.into(),
            source: None,
        }
    }

    /// Authentication failure caused by another error
    pub fn auth_caused_by(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Error::Auth {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_auth_keeps_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "no callback");
        let err = Error::auth_caused_by("browser never returned", cause);

        assert_eq!(
            err.to_string(),
            "GitHub authentication failed: browser never returned"
        );
        assert_eq!(err.source().unwrap().to_string(), "no callback");
    }

    #[test]
    fn test_config_keeps_io_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = Error::from(pullreminders_core::Error::Io {
            path: "/etc/pullreminders/settings.toml".into(),
            source: cause,
        });

        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("settings.toml"));
        assert_eq!(err.source().unwrap().to_string(), "denied");
    }

    #[test]
    fn test_graphql_message_joins() {
        let err = Error::GraphQl(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(err.to_string(), "GraphQL errors: a, b");
    }
}
