//! GitHub API client

use async_trait::async_trait;
use pullreminders_core::{Settings, DEFAULT_API_URL};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::graphql::ViewerData;
use crate::{Error, PullRequest, Result};


const USER_AGENT: &str = concat!("pullreminders/", env!("CARGO_PKG_VERSION"));

const VIEWER_QUERY: &str = r#"
    query {
        viewer {
            login
        }
    }
"#;

/// The account that owns a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// GitHub login
    pub username: String,
}

/// Queries the pull request reminder needs from GitHub
#[async_trait]
pub trait ReviewApi: Send + Sync {
    /// Get the account that owns the credential
    async fn get_account(&self) -> Result<Account>;

    /// Get open pull requests where `account` is a requested reviewer
    async fn get_pulls_pending_for_review(&self, account: &str) -> Result<Vec<PullRequest>>;
}

/// GitHub GraphQL client authenticated with a bearer token
pub struct GitHubClient {
    http: reqwest::Client,
    token: String,
    api_url: String,
}

impl GitHubClient {
    /// Create a client for github.com
    pub fn new(token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(Error::auth("access token is empty"));
        }

        let http = reqwest::Client::builder().user_agent(USER_AGENT).build()?;

        Ok(Self {
            http,
            token,
            api_url: DEFAULT_API_URL.to_string(),
        })
    }

    /// Create a client using the endpoint from settings
    pub fn from_settings(token: impl Into<String>, settings: &Settings) -> Result<Self> {
        Ok(Self::new(token)?.with_api_url(settings.api_url.clone()))
    }

    /// Point the client at a different GraphQL endpoint (GitHub Enterprise, tests)
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    /// The GraphQL endpoint in use
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Get the account that owns this client's token
    pub async fn get_account(&self) -> Result<Account> {
        debug!("Fetching authenticated account");

        let data: ViewerData = self.graphql_query(VIEWER_QUERY, &json!({})).await?;

        if data.viewer.login.is_empty() {
            return Err(Error::Parse("viewer login is empty".to_string()));
        }

        info!(login = %data.viewer.login, "Fetched authenticated account");
        Ok(Account {
            username: data.viewer.login,
        })
    }
}

#[async_trait]
impl ReviewApi for GitHubClient {
    async fn get_account(&self) -> Result<Account> {
        GitHubClient::get_account(self).await
    }

    async fn get_pulls_pending_for_review(&self, account: &str) -> Result<Vec<PullRequest>> {
        GitHubClient::get_pulls_pending_for_review(self, account).await
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}
