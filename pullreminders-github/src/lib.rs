//! Pullreminders GitHub - GitHub integration for pullreminders
//!
//! This crate runs the OAuth login flow and queries the GraphQL API for the
//! authenticated account and the pull requests waiting on its review.

mod client;
mod error;
mod graphql;
mod oauth;
mod pulls;

pub use client::{Account, GitHubClient, ReviewApi};
pub use pullreminders_core::DEFAULT_API_URL;
pub use error::{Error, Result};
pub use oauth::{Authenticator, OAuthEndpoints, OAuthFlow, DEFAULT_SCOPES};
pub use pulls::{review_requested_filter, PullRequest, PAGE_SIZE};
