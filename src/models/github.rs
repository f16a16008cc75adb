use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse {
    pub data: Option<serde_json::Value>,
    pub errors: Option<Vec<GraphQlError>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphQlError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ViewerResponse {
    pub viewer: Login,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Login {
    pub login: String,
}

#[derive(Debug, Deserialize)]
pub struct NodeId {
    pub id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationProjectResponse {
    pub organization: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProjectResponse {
    pub user: Option<ProjectOwner>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectOwner {
    pub project_v2: Option<NodeId>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryIdResponse {
    pub repository: NodeId,
}

#[derive(Debug, Deserialize)]
pub struct RestUser {
    pub node_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIssueResponse {
    pub create_issue: CreatedIssuePayload,
}

#[derive(Debug, Deserialize)]
pub struct CreatedIssuePayload {
    pub issue: IssueRef,
}

#[derive(Debug, Deserialize)]
pub struct IssueRef {
    pub id: String,
    pub number: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalContributionsResponse {
    pub user: CollectionOf<ContributionTotals>,
}

/// `user.contributionsCollection` wrapper shared by every contributions query.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionOf<T> {
    pub contributions_collection: T,
}

/// Scalar totals reported for one account over the lookback window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributionTotals {
    pub total_commit_contributions: u64,
    pub total_issue_contributions: u64,
    pub total_pull_request_contributions: u64,
    pub total_pull_request_review_contributions: u64,
    pub total_repositories_with_contributed_commits: u64,
    pub total_repositories_with_contributed_issues: u64,
    pub total_repositories_with_contributed_pull_requests: u64,
    pub total_repositories_with_contributed_pull_request_reviews: u64,
    pub total_repository_contributions: u64,
}

impl std::ops::AddAssign for ContributionTotals {
    fn add_assign(&mut self, other: Self) {
        self.total_commit_contributions += other.total_commit_contributions;
        self.total_issue_contributions += other.total_issue_contributions;
        self.total_pull_request_contributions += other.total_pull_request_contributions;
        self.total_pull_request_review_contributions +=
            other.total_pull_request_review_contributions;
        self.total_repositories_with_contributed_commits +=
            other.total_repositories_with_contributed_commits;
        self.total_repositories_with_contributed_issues +=
            other.total_repositories_with_contributed_issues;
        self.total_repositories_with_contributed_pull_requests +=
            other.total_repositories_with_contributed_pull_requests;
        self.total_repositories_with_contributed_pull_request_reviews +=
            other.total_repositories_with_contributed_pull_request_reviews;
        self.total_repository_contributions += other.total_repository_contributions;
    }
}

/// One page of a `...ContributionsByRepository` query. The queries alias the
/// collection as `byRepository` so all three kinds share this shape.
#[derive(Debug, Deserialize)]
pub struct ContributionsPage<N> {
    pub user: CollectionOf<ByRepository<N>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByRepository<N> {
    pub by_repository: Vec<RepositoryContributions<N>>,
}

#[derive(Debug, Deserialize)]
pub struct RepositoryContributions<N> {
    pub contributions: Connection<N>,
    pub repository: RepositoryRef,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection<N> {
    pub nodes: Vec<N>,
    pub page_info: PageInfo,
    pub total_count: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<String>,
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryRef {
    pub name_with_owner: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct IssueNode {
    pub issue: RawIssue,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub body: String,
    pub comments: Option<CommentConnection>,
    pub created_at: DateTime<Utc>,
    pub number: u64,
    pub state: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestNode {
    pub pull_request: RawPullRequest,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPullRequest {
    pub body: String,
    pub changed_files: u64,
    pub closed: bool,
    pub comments: Option<CommentConnection>,
    pub created_at: DateTime<Utc>,
    pub is_draft: bool,
    pub merged: bool,
    pub number: u64,
    pub review_decision: Option<String>,
    pub state: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestReviewNode {
    pub pull_request: RawReviewedPullRequest,
    pub pull_request_review: RawReview,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReviewedPullRequest {
    pub author: Option<Login>,
    pub body: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
    pub merged: bool,
    pub number: u64,
    pub state: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    pub body: String,
    pub comments: Option<CommentConnection>,
    pub created_at: DateTime<Utc>,
    pub state: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentConnection {
    pub nodes: Vec<Comment>,
}

/// A single entry of an issue, pull request or review discussion thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub author: Option<Login>,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub url: String,
}
