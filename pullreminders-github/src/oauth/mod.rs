//! Interactive OAuth login
//!
//! Runs GitHub's authorization-code flow for a registered OAuth app: wait for
//! the user to press Enter, open the consent page in a browser, catch the
//! redirect on a local listener and exchange the code for an access token.

mod browser;
mod callback;

use std::io::Write;
use std::time::Duration;

use async_trait::async_trait;
use oauth2::basic::BasicClient;
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, Scope, TokenResponse, TokenUrl,
};
use pullreminders_core::{Settings, DEFAULT_CALLBACK_TIMEOUT};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info, warn};
use url::Url;

use crate::{Error, Result};
use callback::CallbackServer;

/// Scopes requested from GitHub
pub const DEFAULT_SCOPES: &[&str] = &["repo"];

type GitHubOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Launches the consent page for a URL
pub type BrowserOpener = fn(&str) -> std::io::Result<()>;

/// Something that can produce a fresh access token
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Run the login flow and return the access token
    async fn obtain_access_token(&self) -> Result<String>;
}

/// OAuth endpoints of a GitHub host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorize_url: String,
    pub token_url: String,
}

impl OAuthEndpoints {
    /// Endpoints for `github.com` or a GitHub Enterprise host
    pub fn for_host(host: &str) -> Self {
        Self {
            authorize_url: format!("https://{}/login/oauth/authorize", host),
            token_url: format!("https://{}/login/oauth/access_token", host),
        }
    }
}

/// Browser-based OAuth login against a GitHub host
pub struct OAuthFlow {
    host: String,
    client_id: String,
    client_secret: String,
    endpoints: OAuthEndpoints,
    scopes: Vec<String>,
    callback_timeout: Duration,
    opener: BrowserOpener,
    http: reqwest::Client,
}

impl OAuthFlow {
    /// Create a flow for the given host and OAuth app
    pub fn new(
        host: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let host = host.into();

        // The token endpoint must not be followed through redirects
        let http = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self {
            endpoints: OAuthEndpoints::for_host(&host),
            host,
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            scopes: DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect(),
            callback_timeout: DEFAULT_CALLBACK_TIMEOUT,
            opener: browser::open,
            http,
        })
    }

    /// Create a flow from resolved settings
    ///
    /// Fails with a configuration error when the client id or secret is missing.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let (client_id, client_secret) = settings.oauth_credentials()?;
        Ok(Self::new(&settings.oauth_host, client_id, client_secret)?
            .with_callback_timeout(settings.callback_timeout))
    }

    /// Override the authorize and token endpoints
    pub fn with_endpoints(mut self, endpoints: OAuthEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Bound the wait for the browser redirect
    pub fn with_callback_timeout(mut self, timeout: Duration) -> Self {
        self.callback_timeout = timeout;
        self
    }

    /// Replace the system browser launcher
    pub fn with_opener(mut self, opener: BrowserOpener) -> Self {
        self.opener = opener;
        self
    }

    /// The host the user is sent to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Run the whole flow, prompting on `output` and reading the
    /// acknowledgement from `input`
    pub async fn login<R, W>(&self, input: R, mut output: W) -> Result<String>
    where
        R: AsyncBufRead + Unpin + Send,
        W: Write + Send,
    {
        write!(output, "Press Enter to open {} in your browser... ", self.host)
            .and_then(|_| output.flush())
            .map_err(|e| Error::auth_caused_by("failed to write prompt", e))?;
        wait_for_enter(input).await?;

        let csrf = CsrfToken::new_random();
        let server = CallbackServer::bind(csrf.secret()).await?;
        let redirect_uri = server.redirect_uri().to_string();
        let auth_url = self.authorization_url(&redirect_uri, &csrf)?;

        if let Err(e) = (self.opener)(auth_url.as_str()) {
            warn!(error = %e, "Failed to open browser");
            writeln!(
                output,
                "\nOpen this URL in your browser to continue:\n  {}",
                auth_url
            )
            .map_err(|e| Error::auth_caused_by("failed to write prompt", e))?;
        }

        let code = server.wait(self.callback_timeout).await?;
        debug!("Received authorization code");

        let token = self.exchange_code(code, &redirect_uri).await?;
        info!(host = %self.host, "Obtained access token");
        Ok(token)
    }

    fn oauth_client(&self, redirect_uri: &str) -> Result<GitHubOAuthClient> {
        let auth_url = AuthUrl::new(self.endpoints.authorize_url.clone())
            .map_err(|e| Error::auth_caused_by("invalid authorize URL", e))?;
        let token_url = TokenUrl::new(self.endpoints.token_url.clone())
            .map_err(|e| Error::auth_caused_by("invalid token URL", e))?;
        let redirect_url = RedirectUrl::new(redirect_uri.to_string())
            .map_err(|e| Error::auth_caused_by("invalid redirect URI", e))?;

        Ok(BasicClient::new(ClientId::new(self.client_id.clone()))
            .set_client_secret(ClientSecret::new(self.client_secret.clone()))
            .set_auth_type(AuthType::RequestBody)
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url))
    }

    /// Consent page URL carrying the client id, scopes, redirect URI and state
    fn authorization_url(&self, redirect_uri: &str, csrf: &CsrfToken) -> Result<Url> {
        let client = self.oauth_client(redirect_uri)?;
        let csrf = csrf.clone();

        let mut request = client.authorize_url(move || csrf);
        for scope in &self.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let (url, _) = request.url();
        Ok(url)
    }

    /// Trade an authorization code for an access token
    async fn exchange_code(&self, code: String, redirect_uri: &str) -> Result<String> {
        let client = self.oauth_client(redirect_uri)?;

        let response = client
            .exchange_code(AuthorizationCode::new(code))
            .request_async(&self.http)
            .await
            .map_err(|e| Error::auth_caused_by("failed to exchange authorization code", e))?;

        let token = response.access_token().secret().to_string();
        if token.trim().is_empty() {
            return Err(Error::auth("GitHub returned an empty access token"));
        }

        Ok(token)
    }
}

#[async_trait]
impl Authenticator for OAuthFlow {
    async fn obtain_access_token(&self) -> Result<String> {
        self.login(BufReader::new(tokio::io::stdin()), std::io::stdout())
            .await
    }
}

impl std::fmt::Debug for OAuthFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthFlow")
            .field("host", &self.host)
            .field("client_id", &self.client_id)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// Block until one line (or EOF) is read; the content is ignored
async fn wait_for_enter<R: AsyncBufRead + Unpin>(mut input: R) -> Result<()> {
    let mut line = Vec::new();
    input
        .read_until(b'\n', &mut line)
        .await
        .map_err(|e| Error::auth_caused_by("failed to read from stdin", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const REDIRECT: &str = "http://127.0.0.1:8765/callback";

    fn flow() -> OAuthFlow {
        OAuthFlow::new("github.com", "client-123", "secret-456").unwrap()
    }

    fn flow_against(server: &MockServer) -> OAuthFlow {
        flow().with_endpoints(OAuthEndpoints {
            authorize_url: format!("{}/login/oauth/authorize", server.uri()),
            token_url: format!("{}/login/oauth/access_token", server.uri()),
        })
    }

    #[test]
    fn test_endpoints_for_host() {
        let endpoints = OAuthEndpoints::for_host("github.example.com");
        assert_eq!(
            endpoints.authorize_url,
            "https://github.example.com/login/oauth/authorize"
        );
        assert_eq!(
            endpoints.token_url,
            "https://github.example.com/login/oauth/access_token"
        );
    }

    #[test]
    fn test_from_settings_requires_client_id() {
        let settings = Settings {
            client_id: None,
            client_secret: Some("secret".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            OAuthFlow::from_settings(&settings),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_default_callback_timeout_matches_settings() {
        assert_eq!(flow().callback_timeout, Settings::default().callback_timeout);
    }

    #[test]
    fn test_from_settings() {
        let settings = Settings {
            oauth_host: "github.example.com".to_string(),
            client_id: Some("id".to_string()),
            client_secret: Some("secret".to_string()),
            callback_timeout: Duration::from_secs(30),
            ..Default::default()
        };
        let flow = OAuthFlow::from_settings(&settings).unwrap();
        assert_eq!(flow.host(), "github.example.com");
        assert_eq!(flow.callback_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_authorization_url() {
        let csrf = CsrfToken::new("state-abc".to_string());
        let url = flow().authorization_url(REDIRECT, &csrf).unwrap();

        assert_eq!(url.host_str(), Some("github.com"));
        assert_eq!(url.path(), "/login/oauth/authorize");

        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(query["client_id"], "client-123");
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["scope"], "repo");
        assert_eq!(query["state"], "state-abc");
        assert_eq!(query["redirect_uri"], REDIRECT);
        assert!(!query.contains_key("client_secret"));
    }

    #[test]
    fn test_debug_hides_secret() {
        assert!(!format!("{:?}", flow()).contains("secret-456"));
    }

    #[tokio::test]
    async fn test_wait_for_enter() {
        wait_for_enter(&b"anything\n"[..]).await.unwrap();
        // EOF counts as acknowledgement
        wait_for_enter(&b""[..]).await.unwrap();
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_string_contains("code=the-code"))
            .and(body_string_contains("client_secret=secret-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "T",
                "token_type": "bearer",
                "scope": "repo"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let token = flow_against(&server)
            .exchange_code("the-code".to_string(), REDIRECT)
            .await
            .unwrap();
        assert_eq!(token, "T");
    }

    /// Plays the browser: follows the consent page straight back to the
    /// local listener with the state it was given
    fn approve_in_background(url: &str) -> std::io::Result<()> {
        let url = Url::parse(url).map_err(std::io::Error::other)?;
        let query: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        let callback = format!(
            "{}?code=the-code&state={}",
            query["redirect_uri"], query["state"]
        );

        tokio::spawn(async move {
            reqwest::Client::builder()
                .no_proxy()
                .build()
                .unwrap()
                .get(callback)
                .send()
                .await
                .unwrap();
        });
        Ok(())
    }

    fn refuse_to_open(_url: &str) -> std::io::Result<()> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no browser"))
    }

    async fn mock_token_endpoint() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_string_contains("code=the-code"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "T",
                "token_type": "bearer",
                "scope": "repo"
            })))
            .expect(1)
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_login_end_to_end() {
        let server = mock_token_endpoint().await;
        let flow = flow_against(&server).with_opener(approve_in_background);

        let mut output = Vec::new();
        let token = flow.login(&b"\n"[..], &mut output).await.unwrap();

        assert_eq!(token, "T");
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Press Enter to open github.com in your browser... "));
    }

    #[tokio::test]
    async fn test_login_continues_on_eof() {
        let server = mock_token_endpoint().await;
        let flow = flow_against(&server).with_opener(approve_in_background);

        let token = flow.login(&b""[..], Vec::new()).await.unwrap();
        assert_eq!(token, "T");
    }

    #[tokio::test]
    async fn test_login_prints_url_when_browser_fails() {
        let server = MockServer::start().await;
        let flow = flow_against(&server)
            .with_opener(refuse_to_open)
            .with_callback_timeout(Duration::from_millis(50));

        let mut output = Vec::new();
        let err = flow.login(&b"\n"[..], &mut output).await.unwrap_err();

        assert!(err.to_string().contains("no response from the browser"));
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Open this URL in your browser"));
        assert!(output.contains("/login/oauth/authorize?"));
    }

    #[tokio::test]
    async fn test_exchange_code_empty_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "",
                "token_type": "bearer"
            })))
            .mount(&server)
            .await;

        let err = flow_against(&server)
            .exchange_code("the-code".to_string(), REDIRECT)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty access token"));
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "The code passed is incorrect or expired."
            })))
            .mount(&server)
            .await;

        let err = flow_against(&server)
            .exchange_code("stale".to_string(), REDIRECT)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Auth { source: Some(_), .. }));
    }
}
