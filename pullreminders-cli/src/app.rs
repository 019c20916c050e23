//! Resolves the credential and lists pull requests waiting for review

use std::io::Write;

use anyhow::{Context, Result};
use async_trait::async_trait;
use pullreminders_core::{Credential, CredentialStore, Settings};
use pullreminders_github::{Authenticator, OAuthFlow, ReviewApi};
use tracing::{debug, info};

use crate::presenter::Presenter;

/// Ties the credential store, login flow and API client together
pub struct App<A, F> {
    store: CredentialStore,
    authenticator: A,
    connect: F,
}

impl<A, F, C> App<A, F>
where
    A: Authenticator,
    F: Fn(&str) -> pullreminders_github::Result<C>,
    C: ReviewApi,
{
    /// `connect` builds an API client for a token
    pub fn new(store: CredentialStore, authenticator: A, connect: F) -> Self {
        Self {
            store,
            authenticator,
            connect,
        }
    }

    /// Load the stored credential, logging in first if there is none
    pub async fn credential(&self) -> Result<Credential> {
        match self.store.load() {
            Ok(credential) => {
                debug!(account = %credential.account, "Using stored credential");
                Ok(credential)
            }
            Err(e) if e.is_not_found() => {
                info!(path = %self.store.path(), "No stored credential, starting GitHub login");
                self.bootstrap().await
            }
            Err(e) => Err(e).context("error reading stored credential"),
        }
    }

    async fn bootstrap(&self) -> Result<Credential> {
        let token = self
            .authenticator
            .obtain_access_token()
            .await
            .context("error building new credential")?;

        let client = (self.connect)(token.as_str()).context("error creating GitHub client")?;
        let account = client
            .get_account()
            .await
            .context("error getting user to build new credential")?;

        self.store
            .save(&account.username, &token)
            .context("error storing new credential")
    }

    /// Resolve the credential, query GitHub once and render the result
    ///
    /// Nothing is rendered when the query fails.
    pub async fn run<W: Write>(&self, presenter: &Presenter, out: &mut W) -> Result<()> {
        let credential = self.credential().await?;

        let client = (self.connect)(credential.token.as_str())
            .context("error creating GitHub client")?;
        let pulls = client
            .get_pulls_pending_for_review(&credential.account)
            .await
            .context("error getting pending pull requests")?;

        presenter
            .render(out, &pulls)
            .context("error writing pull requests")?;
        Ok(())
    }
}

/// Builds the OAuth flow from settings only when a login is needed
///
/// A missing client id or secret therefore only fails first-run logins.
pub struct SettingsLogin {
    settings: Settings,
}

impl SettingsLogin {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Authenticator for SettingsLogin {
    async fn obtain_access_token(&self) -> pullreminders_github::Result<String> {
        OAuthFlow::from_settings(&self.settings)?
            .obtain_access_token()
            .await
    }
}
