//! GitHub GraphQL API transport and response schemas

use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::{Error, GitHubClient, Result};

/// GraphQL query response wrapper
#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

/// GraphQL error
#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

/// `query { viewer { login } }`
#[derive(Debug, Deserialize)]
pub(crate) struct ViewerData {
    pub viewer: ViewerNode,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerNode {
    pub login: String,
}

/// Search results restricted to pull requests
#[derive(Debug, Deserialize)]
pub(crate) struct SearchData {
    pub search: SearchConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SearchConnection {
    pub issue_count: u64,
    pub page_info: PageInfo,
    pub nodes: Vec<PullRequestNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PullRequestNode {
    pub id: String,
    pub title: String,
    pub url: String,
    pub head_ref_name: String,
    pub number: u64,
    /// Null when the author's account has been deleted
    pub author: Option<ActorNode>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ActorNode {
    pub login: String,
}

impl GitHubClient {
    /// Execute a GraphQL query and decode its `data` payload
    pub(crate) async fn graphql_query<T: for<'de> Deserialize<'de>>(
        &self,
        query: &str,
        variables: &serde_json::Value,
    ) -> Result<T> {
        debug!(url = %self.api_url(), "Sending GraphQL query");

        let request_body = json!({
            "query": query,
            "variables": variables,
        });

        let response = self
            .http()
            .post(self.api_url())
            .bearer_auth(self.token())
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::auth(
                "GitHub rejected the stored token (invalid or expired)",
            ));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response".to_string());
            return Err(Error::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let graphql_response: GraphQLResponse<T> = serde_json::from_slice(&bytes)
            .map_err(|e| Error::Parse(format!("Failed to parse GraphQL response: {}", e)))?;

        if let Some(errors) = graphql_response.errors {
            if !errors.is_empty() {
                return Err(Error::GraphQl(
                    errors.into_iter().map(|e| e.message).collect(),
                ));
            }
        }

        graphql_response
            .data
            .ok_or_else(|| Error::Parse("GraphQL response missing data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_search_node() {
        let payload = json!({
            "search": {
                "issueCount": 1,
                "pageInfo": { "endCursor": "Y3Vyc29yOjE=", "hasNextPage": false },
                "nodes": [{
                    "id": "PR_1",
                    "title": "Fix bug",
                    "url": "https://github.com/o/r/pull/42",
                    "headRefName": "fix-1",
                    "number": 42,
                    "author": { "login": "bob" }
                }]
            }
        });

        let data: SearchData = serde_json::from_value(payload).unwrap();
        assert_eq!(data.search.issue_count, 1);
        assert!(!data.search.page_info.has_next_page);
        let node = &data.search.nodes[0];
        assert_eq!(node.head_ref_name, "fix-1");
        assert_eq!(node.author.as_ref().unwrap().login, "bob");
    }

    #[test]
    fn test_decode_rejects_missing_field() {
        let payload = json!({
            "search": {
                "issueCount": 1,
                "pageInfo": { "endCursor": null, "hasNextPage": false },
                "nodes": [{ "id": "PR_1", "title": "No number", "url": "u", "headRefName": "b" }]
            }
        });

        assert!(serde_json::from_value::<SearchData>(payload).is_err());
    }

    #[test]
    fn test_decode_null_author() {
        let payload = json!({
            "id": "PR_1",
            "title": "Orphan",
            "url": "u",
            "headRefName": "b",
            "number": 1,
            "author": null
        });

        let node: PullRequestNode = serde_json::from_value(payload).unwrap();
        assert!(node.author.is_none());
    }
}
