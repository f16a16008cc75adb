//! GraphQL documents sent to the GitHub API.
//!
//! The three `*_CONTRIBUTIONS_BY_REPOSITORY` queries alias their collection as
//! `byRepository` so a single page type decodes all of them.

pub const AUTHENTICATED_USER: &str = r#"
query {
  viewer {
    login
  }
}
"#;

pub const TOTAL_CONTRIBUTION_COUNT: &str = r#"
query ($username: String!, $startDate: DateTime!) {
  user(login: $username) {
    contributionsCollection(from: $startDate) {
      totalCommitContributions
      totalIssueContributions
      totalPullRequestContributions
      totalPullRequestReviewContributions

      totalRepositoriesWithContributedCommits
      totalRepositoriesWithContributedIssues
      totalRepositoriesWithContributedPullRequests
      totalRepositoriesWithContributedPullRequestReviews

      totalRepositoryContributions
    }
  }
}
"#;

pub const ISSUE_CONTRIBUTIONS_BY_REPOSITORY: &str = r#"
query ($username: String!, $startDate: DateTime!, $endCursor: String, $includeComments: Boolean!) {
  user(login: $username) {
    contributionsCollection(from: $startDate) {
      byRepository: issueContributionsByRepository(maxRepositories: 50) {
        contributions(first: 50, after: $endCursor) {
          nodes {
            issue {
              body
              comments(first: 50) @include(if: $includeComments) {
                nodes {
                  author {
                    login
                  }
                  body
                  createdAt
                  url
                }
              }
              createdAt
              number
              state
              title
              url
            }
          }
          pageInfo {
            endCursor
            hasNextPage
          }
          totalCount
        }
        repository {
          nameWithOwner
          url
        }
      }
    }
  }
}
"#;

pub const PULL_REQUEST_CONTRIBUTIONS_BY_REPOSITORY: &str = r#"
query ($username: String!, $startDate: DateTime!, $endCursor: String, $includeComments: Boolean!) {
  user(login: $username) {
    contributionsCollection(from: $startDate) {
      byRepository: pullRequestContributionsByRepository(maxRepositories: 50) {
        contributions(first: 50, after: $endCursor) {
          nodes {
            pullRequest {
              body
              changedFiles
              closed
              comments(first: 50) @include(if: $includeComments) {
                nodes {
                  author {
                    login
                  }
                  body
                  createdAt
                  url
                }
              }
              createdAt
              isDraft
              merged
              number
              reviewDecision
              state
              title
              url
            }
          }
          pageInfo {
            endCursor
            hasNextPage
          }
          totalCount
        }
        repository {
          nameWithOwner
          url
        }
      }
    }
  }
}
"#;

pub const PULL_REQUEST_REVIEW_CONTRIBUTIONS_BY_REPOSITORY: &str = r#"
query ($username: String!, $startDate: DateTime!, $endCursor: String, $includeComments: Boolean!) {
  user(login: $username) {
    contributionsCollection(from: $startDate) {
      byRepository: pullRequestReviewContributionsByRepository(maxRepositories: 50) {
        contributions(first: 50, after: $endCursor) {
          nodes {
            pullRequest {
              author {
                login
              }
              body
              closed
              createdAt
              merged
              number
              state
              title
              url
            }
            pullRequestReview {
              body
              comments(first: 50) @include(if: $includeComments) {
                nodes {
                  author {
                    login
                  }
                  body
                  createdAt
                  url
                }
              }
              createdAt
              state
            }
          }
          pageInfo {
            endCursor
            hasNextPage
          }
          totalCount
        }
        repository {
          nameWithOwner
          url
        }
      }
    }
  }
}
"#;

pub const ORG_PROJECT_NODE_ID: &str = r#"
query ($organization: String!, $projectNumber: Int!) {
  organization(login: $organization) {
    projectV2(number: $projectNumber) {
      id
    }
  }
}
"#;

pub const USER_PROJECT_NODE_ID: &str = r#"
query ($login: String!, $projectNumber: Int!) {
  user(login: $login) {
    projectV2(number: $projectNumber) {
      id
    }
  }
}
"#;

pub const REPOSITORY_NODE_ID: &str = r#"
query ($owner: String!, $name: String!) {
  repository(owner: $owner, name: $name) {
    id
  }
}
"#;

pub const CREATE_ISSUE: &str = r#"
mutation ($userId: ID!, $repositoryId: ID!, $body: String!, $title: String!) {
  createIssue(input: {
    assigneeIds: [$userId],
    body: $body,
    repositoryId: $repositoryId,
    title: $title
  }) {
    issue {
      id
      number
    }
  }
}
"#;

pub const ADD_ISSUE_TO_PROJECT: &str = r#"
mutation ($projectId: ID!, $issueId: ID!) {
  addProjectV2ItemById(input: {projectId: $projectId, contentId: $issueId}) {
    item {
      id
    }
  }
}
"#;

/// REST path of a user, used to read its `node_id`.
pub fn user_path(username: &str) -> String {
    format!("/users/{}", username)
}

/// REST path for posting a comment on an issue.
pub fn issue_comments_path(owner: &str, name: &str, number: u64) -> String {
    format!("/repos/{}/{}/issues/{}/comments", owner, name, number)
}
