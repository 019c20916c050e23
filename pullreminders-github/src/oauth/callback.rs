//! Local listener receiving the OAuth redirect

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::{Error, Result};

pub(crate) const CALLBACK_PATH: &str = "/callback";

/// How long the listener gets to flush the response page after the callback
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

const SUCCESS_PAGE: &str = r#"<!doctype html>
<meta charset="utf-8">
<title>pullreminders: signed in</title>
<style>
body { font-family: -apple-system, "Segoe UI", Helvetica, Arial, sans-serif; color: #1f2328; background: #f6f8fa; text-align: center; margin: 48px auto; max-width: 560px; }
.box { background: white; border: 1px solid #d0d7de; padding: 24px; }
</style>
<div class="box">
  <h1>Successfully authenticated pullreminders</h1>
  <p>You may now close this tab and return to the terminal.</p>
</div>
"#;

const FAILURE_PAGE: &str = r#"<!doctype html>
<meta charset="utf-8">
<title>pullreminders: sign-in failed</title>
<h1>Authentication failed</h1>
<p>Return to the terminal for details.</p>
"#;

/// Query parameters GitHub appends to the redirect URI
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// Check a redirect against the expected CSRF state and extract the code
pub(crate) fn verify_callback(params: CallbackParams, expected_state: &str) -> Result<String> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        return Err(Error::auth(format!(
            "authorization was denied: {} {}",
            error, description
        )
        .trim_end()
        .to_string()));
    }

    if params.state.as_deref() != Some(expected_state) {
        return Err(Error::auth("state parameter mismatch in OAuth callback"));
    }

    params
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| Error::auth("OAuth callback did not include an authorization code"))
}

type CodeSender = Arc<Mutex<Option<oneshot::Sender<Result<String>>>>>;

#[derive(Clone)]
struct CallbackState {
    expected_state: Arc<str>,
    sender: CodeSender,
}

async fn handle_callback(
    State(state): State<CallbackState>,
    Query(params): Query<CallbackParams>,
) -> (StatusCode, Html<&'static str>) {
    let outcome = verify_callback(params, &state.expected_state);

    let response = match &outcome {
        Ok(_) => (StatusCode::OK, Html(SUCCESS_PAGE)),
        Err(e) => {
            warn!(error = %e, "Rejected OAuth callback");
            (StatusCode::BAD_REQUEST, Html(FAILURE_PAGE))
        }
    };

    if let Some(sender) = state.sender.lock().ok().and_then(|mut slot| slot.take()) {
        let _ = sender.send(outcome);
    }

    response
}

/// A one-shot HTTP listener on an ephemeral localhost port
pub(crate) struct CallbackServer {
    redirect_uri: String,
    receiver: oneshot::Receiver<Result<String>>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl CallbackServer {
    /// Start listening; the first request to `/callback` settles the result
    pub(crate) async fn bind(expected_state: &str) -> Result<Self> {
        let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
            .await
            .map_err(|e| Error::auth_caused_by("failed to start local callback listener", e))?;
        let addr = listener
            .local_addr()
            .map_err(|e| Error::auth_caused_by("failed to start local callback listener", e))?;

        let (sender, receiver) = oneshot::channel();
        let (shutdown, shutdown_signal) = oneshot::channel::<()>();

        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .with_state(CallbackState {
                expected_state: Arc::from(expected_state),
                sender: Arc::new(Mutex::new(Some(sender))),
            });

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_signal.await;
                })
                .await
        });

        debug!(%addr, "Listening for OAuth callback");

        Ok(Self {
            redirect_uri: format!("http://{}{}", addr, CALLBACK_PATH),
            receiver,
            shutdown,
            task,
        })
    }

    /// The URI GitHub should redirect to
    pub(crate) fn redirect_uri(&self) -> &str {
        &self.redirect_uri
    }

    /// Wait for the callback, then stop the listener
    pub(crate) async fn wait(self, timeout: Duration) -> Result<String> {
        let Self {
            receiver,
            shutdown,
            task,
            ..
        } = self;

        let outcome = tokio::time::timeout(timeout, receiver).await;

        let _ = shutdown.send(());
        let abort = task.abort_handle();
        if tokio::time::timeout(SHUTDOWN_GRACE, task).await.is_err() {
            debug!("Callback listener did not stop in time, aborting");
            abort.abort();
        }

        match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::auth(
                "callback listener stopped before the browser returned",
            )),
            Err(elapsed) => Err(Error::auth_caused_by(
                format!(
                    "no response from the browser within {}s",
                    timeout.as_secs()
                ),
                elapsed,
            )),
        }
    }
}
