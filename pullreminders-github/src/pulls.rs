//! Pull requests waiting for review

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::graphql::{PullRequestNode, SearchData};
use crate::{GitHubClient, Result};

/// Number of search results requested. Further pages are not fetched.
pub const PAGE_SIZE: usize = 100;

/// Login shown for pull requests whose author account was deleted
const GHOST_LOGIN: &str = "ghost";

const REVIEW_REQUESTED_QUERY: &str = r#"
    query($query: String!) {
        search(query: $query, type: ISSUE, first: 100) {
            issueCount
            pageInfo {
                endCursor
                hasNextPage
            }
            nodes {
                ... on PullRequest {
                    id
                    title
                    url
                    headRefName
                    number
                    author {
                        login
                    }
                }
            }
        }
    }
"#;

/// Pull request representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// GraphQL node id
    pub id: String,
    /// PR title
    pub title: String,
    /// Web URL
    pub url: String,
    /// Head branch name
    pub branch: String,
    /// PR number
    pub number: u64,
    /// Author login
    pub author: String,
}

impl From<PullRequestNode> for PullRequest {
    fn from(node: PullRequestNode) -> Self {
        PullRequest {
            id: node.id,
            title: node.title,
            url: node.url,
            branch: node.head_ref_name,
            number: node.number,
            author: node
                .author
                .map(|a| a.login)
                .unwrap_or_else(|| GHOST_LOGIN.to_string()),
        }
    }
}

/// Search filter for open pull requests requesting a review from `account`
pub fn review_requested_filter(account: &str) -> String {
    format!("type:pr state:open review-requested:{}", account)
}

impl GitHubClient {
    /// Get open pull requests where `account` is a requested reviewer
    ///
    /// Only the first [`PAGE_SIZE`] results are returned; pagination cursors
    /// are not followed.
    pub async fn get_pulls_pending_for_review(&self, account: &str) -> Result<Vec<PullRequest>> {
        let filter = review_requested_filter(account);
        debug!(query = %filter, "Searching pull requests pending review");

        let variables = json!({ "query": filter });
        let data: SearchData = self
            .graphql_query(REVIEW_REQUESTED_QUERY, &variables)
            .await?;

        let search = data.search;
        if search.page_info.has_next_page {
            debug!(
                issue_count = search.issue_count,
                end_cursor = ?search.page_info.end_cursor,
                "More results available than the first page"
            );
        }

        let pulls: Vec<PullRequest> = search.nodes.into_iter().map(PullRequest::from).collect();

        info!(count = pulls.len(), "Fetched pull requests pending review");
        Ok(pulls)
    }
}
