use crate::models::contributions::Contributions;
use crate::models::report::{ActivitySummary, RepositorySummary};
use crate::utils::template;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

const ISSUE_TEMPLATE: &str = include_str!("../templates/issue.md");
const PROMPT_TEMPLATE: &str = include_str!("../templates/prompt.md");

/// Prompt sent to the model alongside the serialized contributions.
pub fn generate_prompt(handle: &str) -> String {
    let values = HashMap::from([("handle", handle.to_string())]);
    template::render(PROMPT_TEMPLATE, &values)
}

/// Markdown body of the report issue.
pub fn generate_markdown(
    contributions: &Contributions,
    end_date: DateTime<Utc>,
    start_date: DateTime<Utc>,
    username: &str,
) -> String {
    let totals = &contributions.totals;

    let repository_rows = generate_repository_summary(contributions)
        .iter()
        .map(|row| repository_row(row, username))
        .collect::<Vec<_>>()
        .join("\n");

    let values = HashMap::from([
        ("username", username.to_string()),
        ("start_date", format_date(start_date)),
        ("end_date", format_date(end_date)),
        ("commits", totals.total_commit_contributions.to_string()),
        ("issues", totals.total_issue_contributions.to_string()),
        ("pull_requests", totals.total_pull_request_contributions.to_string()),
        ("pull_request_reviews", totals.total_pull_request_review_contributions.to_string()),
        (
            "repositories_with_commits",
            totals.total_repositories_with_contributed_commits.to_string(),
        ),
        (
            "repositories_with_issues",
            totals.total_repositories_with_contributed_issues.to_string(),
        ),
        (
            "repositories_with_pull_requests",
            totals.total_repositories_with_contributed_pull_requests.to_string(),
        ),
        (
            "repositories_with_pull_request_reviews",
            totals.total_repositories_with_contributed_pull_request_reviews.to_string(),
        ),
        ("repository_rows", repository_rows),
        ("issue_rows", activity_rows(&generate_issue_summary(contributions))),
        ("pull_request_rows", activity_rows(&generate_pull_request_summary(contributions))),
        (
            "pull_request_review_rows",
            activity_rows(&generate_pull_request_review_summary(contributions)),
        ),
    ]);

    template::render(ISSUE_TEMPLATE, &values)
}

/// One row per repository that appears in any of the three bucket maps,
/// sorted by case-insensitive name. Names that differ only in case share a
/// row, spelled as first seen.
pub fn generate_repository_summary(contributions: &Contributions) -> Vec<RepositorySummary> {
    let mut repositories: BTreeMap<String, RepositorySummary> = BTreeMap::new();

    let keys = contributions
        .issue_contributions_by_repository
        .keys()
        .chain(contributions.pull_request_contributions_by_repository.keys())
        .chain(contributions.pull_request_review_contributions_by_repository.keys());
    for key in keys {
        repositories
            .entry(key.to_lowercase())
            .or_insert_with(|| RepositorySummary {
                issues: 0,
                name: key.clone(),
                pull_requests: 0,
                pull_request_reviews: 0,
                url: format!("https://github.com/{}", key),
            });
    }

    for (key, bucket) in &contributions.issue_contributions_by_repository {
        if let Some(row) = repositories.get_mut(&key.to_lowercase()) {
            row.issues += bucket.total_count;
        }
    }
    for (key, bucket) in &contributions.pull_request_contributions_by_repository {
        if let Some(row) = repositories.get_mut(&key.to_lowercase()) {
            row.pull_requests += bucket.total_count;
        }
    }
    for (key, bucket) in &contributions.pull_request_review_contributions_by_repository {
        if let Some(row) = repositories.get_mut(&key.to_lowercase()) {
            row.pull_request_reviews += bucket.total_count;
        }
    }

    // Keys are already lowercase, so map order is the case-insensitive order.
    repositories.into_values().collect()
}

pub fn generate_issue_summary(contributions: &Contributions) -> Vec<ActivitySummary> {
    let mut issues = Vec::new();
    for (key, bucket) in &contributions.issue_contributions_by_repository {
        for issue in &bucket.contributions {
            issues.push(ActivitySummary {
                created_at: format_date(issue.created_at),
                number: issue.number,
                repository: key.clone(),
                repository_url: bucket.url.clone(),
                status: issue.state.clone(),
                title: issue.title.clone(),
                url: issue.url.clone(),
            });
        }
    }
    sort_activity(&mut issues);
    issues
}

pub fn generate_pull_request_summary(contributions: &Contributions) -> Vec<ActivitySummary> {
    let mut pull_requests = Vec::new();
    for (key, bucket) in &contributions.pull_request_contributions_by_repository {
        for pr in &bucket.contributions {
            let status = if pr.is_draft { "DRAFT".to_string() } else { pr.state.clone() };
            pull_requests.push(ActivitySummary {
                created_at: format_date(pr.created_at),
                number: pr.number,
                repository: key.clone(),
                repository_url: bucket.url.clone(),
                status,
                title: pr.title.clone(),
                url: pr.url.clone(),
            });
        }
    }
    sort_activity(&mut pull_requests);
    pull_requests
}

/// Review rows carry the review's date and state and the reviewed pull
/// request's number, title and link.
pub fn generate_pull_request_review_summary(
    contributions: &Contributions,
) -> Vec<ActivitySummary> {
    let mut reviews = Vec::new();
    for (key, bucket) in &contributions.pull_request_review_contributions_by_repository {
        for review in &bucket.contributions {
            reviews.push(ActivitySummary {
                created_at: format_date(review.pull_request_review.created_at),
                number: review.pull_request.number,
                repository: key.clone(),
                repository_url: bucket.url.clone(),
                status: review.pull_request_review.state.clone(),
                title: review.pull_request.title.clone(),
                url: review.pull_request.url.clone(),
            });
        }
    }
    sort_activity(&mut reviews);
    reviews
}

fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn sort_activity(rows: &mut [ActivitySummary]) {
    rows.sort_by(|a, b| {
        compare_names(&a.repository, &b.repository).then(a.number.cmp(&b.number))
    });
}

/// Count links search for the report's user. Records found through other
/// accounts are counted but their login is not part of the search.
fn repository_row(row: &RepositorySummary, username: &str) -> String {
    format!(
        concat!(
            "| [{name}]({url}) ",
            "| [{issues}]({url}/issues?q=author%3A{user}) ",
            "| [{prs}]({url}/pulls?q=author%3A{user}) ",
            "| [{reviews}]({url}/pulls?q=reviewed-by%3A{user}) |",
        ),
        name = row.name,
        url = row.url,
        issues = row.issues,
        prs = row.pull_requests,
        reviews = row.pull_request_reviews,
        user = username,
    )
}

fn activity_rows(rows: &[ActivitySummary]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "| [{}]({}) | {} | [{}]({}) | {} |",
                row.repository, row.repository_url, row.created_at, row.title, row.url, row.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_date(date: DateTime<Utc>) -> String {
    date.format("%Y-%m-%d").to_string()
}
