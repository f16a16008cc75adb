use serde::Serialize;

/// One row of the repository summary table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySummary {
    pub issues: u64,
    pub name: String,
    pub pull_requests: u64,
    pub pull_request_reviews: u64,
    pub url: String,
}

/// One row of a detail table (issues, pull requests or reviews).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    pub created_at: String,
    pub number: u64,
    pub repository: String,
    pub repository_url: String,
    pub status: String,
    pub title: String,
    pub url: String,
}
