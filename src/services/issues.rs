use crate::config::RepositoryName;
use crate::models::github::CreateIssueResponse;
use crate::services::github::{GitHubApi, GitHubError, execute};
use crate::services::identity;
use crate::services::queries;
use chrono::{NaiveDate, Utc};
use log::info;
use reqwest::Method;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedIssue {
    pub id: String,
    pub number: u64,
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error(transparent)]
    GitHub(#[from] GitHubError),

    /// The issue exists; only linking it to the project board failed.
    #[error(
        "issue #{number} was created but could not be added to the project: {source}",
        number = .issue.number
    )]
    AddToProject {
        issue: CreatedIssue,
        #[source]
        source: GitHubError,
    },
}

pub fn issue_title(date: NaiveDate) -> String {
    format!("GitHub Contributions ({})", date.format("%Y-%m-%d"))
}

/// Files the report as a new issue assigned to `username`, and adds it to the
/// project board when `project_number` resolves to one.
pub async fn create_issue<C: GitHubApi + ?Sized>(
    client: &C,
    body: &str,
    repository: &RepositoryName,
    username: &str,
    project_number: Option<u64>,
) -> Result<CreatedIssue, PublishError> {
    let title = issue_title(Utc::now().date_naive());
    info!("Creating issue in {}", repository);

    let user_id = identity::get_user_node_id(client, username).await?;
    let project_id =
        identity::get_project_node_id(client, &repository.owner, project_number).await?;
    let repository_id =
        identity::get_repository_node_id(client, &repository.owner, &repository.name).await?;

    let response: CreateIssueResponse = execute(
        client,
        queries::CREATE_ISSUE,
        json!({
            "userId": user_id,
            "repositoryId": repository_id,
            "body": body,
            "title": title,
        }),
    )
    .await?;
    let issue = CreatedIssue {
        id: response.create_issue.issue.id,
        number: response.create_issue.issue.number,
    };
    info!("Created issue #{} in {}", issue.number, repository);

    if let Some(project_id) = project_id {
        let added = client
            .graphql(
                queries::ADD_ISSUE_TO_PROJECT,
                json!({ "projectId": project_id, "issueId": issue.id }),
            )
            .await;
        if let Err(source) = added {
            return Err(PublishError::AddToProject { issue, source });
        }
        info!("Added issue #{} to project {}", issue.number, project_id);
    }

    Ok(issue)
}

/// Posts a comment on an existing issue.
pub async fn add_comment<C: GitHubApi + ?Sized>(
    client: &C,
    repository: &RepositoryName,
    number: u64,
    body: &str,
) -> Result<(), GitHubError> {
    info!("Commenting on {}#{}", repository, number);
    client
        .request(
            Method::POST,
            &queries::issue_comments_path(&repository.owner, &repository.name, number),
            Some(json!({ "body": body })),
        )
        .await?;
    Ok(())
}
