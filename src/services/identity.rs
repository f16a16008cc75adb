use crate::models::github::{
    OrganizationProjectResponse, RepositoryIdResponse, RestUser, UserProjectResponse,
    ViewerResponse,
};
use crate::services::github::{GitHubApi, GitHubError, execute};
use crate::services::queries;
use log::{error, info};
use reqwest::Method;
use serde_json::json;

/// Login of the account the client is authenticated as.
pub async fn get_authenticated_user<C: GitHubApi + ?Sized>(
    client: &C,
) -> Result<String, GitHubError> {
    let response: ViewerResponse = execute(client, queries::AUTHENTICATED_USER, json!({})).await?;
    info!("Authenticated as {}", response.viewer.login);
    Ok(response.viewer.login)
}

pub async fn get_user_node_id<C: GitHubApi + ?Sized>(
    client: &C,
    username: &str,
) -> Result<String, GitHubError> {
    let value = client
        .request(Method::GET, &queries::user_path(username), None)
        .await?;
    let user: RestUser = serde_json::from_value(value)?;
    info!("Resolved user {} to {}", username, user.node_id);
    Ok(user.node_id)
}

/// Resolves a project board owned by either an organization or a user.
///
/// Returns `Ok(None)` without any request when no number is given, and when
/// both lookups report `NOT_FOUND`. Any other failure is returned as is.
pub async fn get_project_node_id<C: GitHubApi + ?Sized>(
    client: &C,
    owner: &str,
    project_number: Option<u64>,
) -> Result<Option<String>, GitHubError> {
    let Some(project_number) = project_number else {
        return Ok(None);
    };
    info!("Resolving project {} #{}", owner, project_number);

    let variables = json!({ "organization": owner, "projectNumber": project_number });
    let organization =
        execute::<_, OrganizationProjectResponse>(client, queries::ORG_PROJECT_NODE_ID, variables);
    match organization.await {
        Ok(response) => {
            if let Some(project) = response.organization.and_then(|o| o.project_v2) {
                return Ok(Some(project.id));
            }
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    let variables = json!({ "login": owner, "projectNumber": project_number });
    let user = execute::<_, UserProjectResponse>(client, queries::USER_PROJECT_NODE_ID, variables);
    match user.await {
        Ok(response) => {
            if let Some(project) = response.user.and_then(|u| u.project_v2) {
                return Ok(Some(project.id));
            }
        }
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    error!("Project #{} wasn't found for the user or organization {}", project_number, owner);
    Ok(None)
}

pub async fn get_repository_node_id<C: GitHubApi + ?Sized>(
    client: &C,
    owner: &str,
    name: &str,
) -> Result<String, GitHubError> {
    info!("Resolving repository {}/{}", owner, name);
    let response: RepositoryIdResponse = execute(
        client,
        queries::REPOSITORY_NODE_ID,
        json!({ "owner": owner, "name": name }),
    )
    .await?;
    Ok(response.repository.id)
}
