//! Pullreminders CLI - list GitHub pull requests waiting for your review
//!
//! On first run the user signs in through the browser and the resulting
//! credential is stored; later runs reuse it.

mod app;
mod presenter;

use std::io::IsTerminal;
use std::process::ExitCode;

use anyhow::Context;
use clap::builder::FalseyValueParser;
use clap::Parser;
use pullreminders_core::{CliOverrides, CredentialStore, Settings};
use pullreminders_github::GitHubClient;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use app::{App, SettingsLogin};
use presenter::Presenter;

/// List open GitHub pull requests that request your review
#[derive(Parser, Debug)]
#[command(name = "pullreminders")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Path of the stored credential file
    #[arg(long, env = "PULLREMINDERS_CONFIG")]
    config: Option<String>,

    /// Host used for the OAuth login
    #[arg(long, env = "PULLREMINDERS_OAUTH_HOST")]
    oauth_host: Option<String>,

    /// GraphQL endpoint to query
    #[arg(long, env = "PULLREMINDERS_API_URL")]
    api_url: Option<String>,

    /// OAuth app client id
    #[arg(long, env = "PULLREMINDERS_CLIENT_ID")]
    client_id: Option<String>,

    /// OAuth app client secret
    #[arg(long, env = "PULLREMINDERS_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR", value_parser = FalseyValueParser::new())]
    no_color: bool,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            oauth_host: self.oauth_host.clone(),
            api_url: self.api_url.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
            credentials_path: self.config.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:?}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings =
        Settings::load_with_overrides(cli.overrides()).context("error loading settings")?;

    tracing::debug!(
        oauth_host = %settings.oauth_host,
        api_url = %settings.api_url,
        credentials_path = %settings.credentials_path,
        "Settings loaded"
    );

    let store = CredentialStore::new(settings.credentials_path.clone());
    let api_settings = settings.clone();
    let app = App::new(
        store,
        SettingsLogin::new(settings),
        move |token: &str| -> pullreminders_github::Result<GitHubClient> {
            GitHubClient::from_settings(token, &api_settings)
        },
    );

    let presenter = Presenter::new(!cli.no_color && std::io::stdout().is_terminal());
    app.run(&presenter, &mut std::io::stdout()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_arguments_required() {
        let cli = Cli::try_parse_from(["pullreminders"]).unwrap();
        assert!(!cli.verbose);
    }

    #[test]
    fn test_no_color_env_accepts_any_value() {
        std::env::set_var("NO_COLOR", "1");
        let result = Cli::try_parse_from(["pullreminders"]);
        std::env::remove_var("NO_COLOR");

        assert!(result.unwrap().no_color);
    }

    #[test]
    fn test_no_color_flag() {
        let cli = Cli::try_parse_from(["pullreminders", "--no-color"]).unwrap();
        assert!(cli.no_color);
    }

    #[test]
    fn test_flags_become_overrides() {
        let cli = Cli::try_parse_from([
            "pullreminders",
            "--config",
            "/tmp/creds.yml",
            "--api-url",
            "http://localhost/graphql",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.credentials_path.as_deref(), Some("/tmp/creds.yml"));
        assert_eq!(overrides.api_url.as_deref(), Some("http://localhost/graphql"));
    }
}
