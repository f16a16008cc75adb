use crate::models::github::{GraphQlError, GraphQlResponse};
use async_trait::async_trait;
use log::{debug, error};
use reqwest::header::{
    ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, InvalidHeaderValue, USER_AGENT,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use thiserror::Error;

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("request to GitHub failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("GitHub API error {status}: {message}")]
    Api { status: StatusCode, message: String },

    #[error("GitHub GraphQL error: {}", format_graphql_errors(.0))]
    GraphQl(Vec<GraphQlError>),

    #[error("GitHub GraphQL response carried no data")]
    MissingData,

    #[error("unexpected GitHub response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid GitHub token: {0}")]
    Header(#[from] InvalidHeaderValue),
}

impl GitHubError {
    /// True when the first GraphQL error is classified `NOT_FOUND`.
    pub fn is_not_found(&self) -> bool {
        match self {
            GitHubError::GraphQl(errors) => errors
                .first()
                .and_then(|e| e.error_type.as_deref())
                .is_some_and(|t| t == "NOT_FOUND"),
            _ => false,
        }
    }
}

fn format_graphql_errors(errors: &[GraphQlError]) -> String {
    errors
        .iter()
        .map(|e| match &e.error_type {
            Some(t) => format!("[{}] {}", t, e.message),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// The operations the report needs from a GitHub endpoint.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// Runs a GraphQL document and returns its `data` member.
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, GitHubError>;

    /// Sends a REST request relative to the API base URL.
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, GitHubError>;
}

/// Runs a GraphQL document and decodes its `data` member into `T`.
pub async fn execute<C, T>(client: &C, query: &str, variables: Value) -> Result<T, GitHubError>
where
    C: GitHubApi + ?Sized,
    T: DeserializeOwned,
{
    let data = client.graphql(query, variables).await?;
    Ok(serde_json::from_value(data)?)
}

pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    graphql_url: String,
}

impl GitHubClient {
    pub fn new(token: &str, api_url: &str) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("contributions-report"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        let base_url = api_url.trim_end_matches('/').to_string();
        let graphql_url = graphql_endpoint(&base_url);

        Ok(Self {
            client,
            base_url,
            graphql_url,
        })
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, GitHubError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("GitHub API error {}: {}", status, error_text);
            return Err(GitHubError::Api {
                status,
                message: error_text,
            });
        }

        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// GraphQL endpoint for a REST base URL. GitHub Enterprise Server serves REST
/// under `/api/v3` and GraphQL under `/api/graphql`.
pub fn graphql_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    match base_url.strip_suffix("/v3") {
        Some(prefix) => format!("{}/graphql", prefix),
        None => format!("{}/graphql", base_url),
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn graphql(&self, query: &str, variables: Value) -> Result<Value, GitHubError> {
        debug!("POST {}", self.graphql_url);

        let response = self
            .client
            .post(&self.graphql_url)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let body: GraphQlResponse = serde_json::from_value(Self::read_json(response).await?)?;

        if let Some(errors) = body.errors.filter(|e| !e.is_empty()) {
            debug!("GraphQL errors: {}", format_graphql_errors(&errors));
            return Err(GitHubError::GraphQl(errors));
        }

        body.data.ok_or(GitHubError::MissingData)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, GitHubError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.send().await?;
        Self::read_json(response).await
    }
}
