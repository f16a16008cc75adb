use anyhow::{Result, anyhow};
use chrono::{Duration, Utc};
use dotenv::dotenv;
use log::{error, info, warn};

mod config;
mod models;
mod services;
mod utils;

use config::Config;
use services::gemini::GeminiClient;
use services::github::GitHubClient;
use services::issues::{self, PublishError};
use services::{contributions, identity, render};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    run(&config).await
}

async fn run(config: &Config) -> Result<()> {
    info!("Inputs:");
    info!("  Number of days: {}", config.num_days);
    info!("  Repository: {}", config.repository);
    info!("  Project number: {:?}", config.project_number);
    info!("  Credentials: {}", config.credentials.len());
    info!("  Include comments: {}", config.include_comments);

    let end_date = Utc::now();
    let start_date = end_date - Duration::days(i64::from(config.num_days));
    info!("Date range: {} to {}", start_date.to_rfc3339(), end_date.to_rfc3339());

    let clients = config
        .credentials
        .iter()
        .map(|c| GitHubClient::new(&c.token, &c.api_url))
        .collect::<Result<Vec<_>, _>>()?;
    let publisher = clients.first().ok_or_else(|| anyhow!("no GitHub token configured"))?;

    let username = identity::get_authenticated_user(publisher).await?;
    let contributions =
        contributions::get_contributions(&clients, start_date, config.include_comments).await?;
    let body = render::generate_markdown(&contributions, end_date, start_date, &username);

    let (issue, project_error) = match issues::create_issue(
        publisher,
        &body,
        &config.repository,
        &username,
        config.project_number,
    )
    .await
    {
        Ok(issue) => (issue, None),
        Err(PublishError::AddToProject { issue, source }) => {
            error!(
                "Issue #{} was created but could not be added to the project: {}",
                issue.number, source
            );
            (issue, Some(source))
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(vertex) = &config.vertex {
        let gemini = GeminiClient::new(vertex);
        let prompt = render::generate_prompt(&username);
        let summary = gemini.summarize_contributions(&prompt, &contributions).await?;

        if summary.trim().is_empty() {
            warn!("Model returned an empty summary, not commenting");
        } else {
            issues::add_comment(publisher, &config.repository, issue.number, &summary).await?;
        }
    }

    if let Some(source) = project_error {
        return Err(PublishError::AddToProject { issue, source }.into());
    }

    info!("Published issue #{} in {}", issue.number, config.repository);
    Ok(())
}
