use crate::models::contributions::{
    BucketMap, Contributions, IssueContribution, PullRequestContribution,
    PullRequestReviewContribution, RepositoryBucket, Review, ReviewedPullRequest,
};
use crate::models::github::{
    Comment, CommentConnection, ContributionsPage, IssueNode, PullRequestNode,
    PullRequestReviewNode, TotalContributionsResponse,
};
use crate::services::github::{GitHubApi, GitHubError, execute};
use crate::services::identity;
use crate::services::queries;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashSet;

/// Opening line of every generated report, used to keep earlier reports out
/// of the issue list.
pub fn report_marker(username: &str) -> String {
    format!("# Contributions - @{}", username)
}

/// Collects contributions for every client, one account at a time, and merges
/// them. The first error aborts the whole run.
pub async fn get_contributions<C: GitHubApi>(
    clients: &[C],
    start_date: DateTime<Utc>,
    include_comments: bool,
) -> Result<Contributions, GitHubError> {
    let mut contributions = Contributions::default();

    for (index, client) in clients.iter().enumerate() {
        info!("Getting contributions: token #{}", index + 1);
        let client_contributions =
            get_client_contributions(client, start_date, include_comments).await?;
        contributions.merge(client_contributions);
    }

    Ok(contributions)
}

async fn get_client_contributions<C: GitHubApi + ?Sized>(
    client: &C,
    start_date: DateTime<Utc>,
    include_comments: bool,
) -> Result<Contributions, GitHubError> {
    let username = identity::get_authenticated_user(client).await?;
    let start = format_start_date(start_date);

    let totals: TotalContributionsResponse = execute(
        client,
        queries::TOTAL_CONTRIBUTION_COUNT,
        json!({ "username": username, "startDate": start }),
    )
    .await?;
    let totals = totals.user.contributions_collection;
    debug!("Totals for {}: {:?}", username, totals);

    let issues =
        get_issue_contributions_by_repository(client, &username, start_date, include_comments)
            .await?;
    let pull_requests = get_pull_request_contributions_by_repository(
        client,
        &username,
        start_date,
        include_comments,
    )
    .await?;
    let reviews = get_pull_request_review_contributions_by_repository(
        client,
        &username,
        start_date,
        include_comments,
    )
    .await?;

    let contributions = Contributions {
        totals,
        issue_contributions_by_repository: issues,
        pull_request_contributions_by_repository: pull_requests,
        pull_request_review_contributions_by_repository: reviews,
    };
    if log::log_enabled!(log::Level::Debug) {
        debug!(
            "Contributions for {}: {}",
            username,
            serde_json::to_string_pretty(&contributions).unwrap_or_default()
        );
    }

    Ok(contributions)
}

pub async fn get_issue_contributions_by_repository<C: GitHubApi + ?Sized>(
    client: &C,
    username: &str,
    start_date: DateTime<Utc>,
    include_comments: bool,
) -> Result<BucketMap<IssueContribution>, GitHubError> {
    let marker = report_marker(username);

    paginate(
        client,
        queries::ISSUE_CONTRIBUTIONS_BY_REPOSITORY,
        username,
        start_date,
        include_comments,
        |node: IssueNode| {
            let issue = node.issue;
            if issue.body.starts_with(&marker) {
                return None;
            }
            Some(IssueContribution {
                body: issue.body,
                comments: thread(issue.comments, include_comments),
                created_at: issue.created_at,
                number: issue.number,
                state: issue.state,
                title: issue.title,
                url: issue.url,
            })
        },
    )
    .await
}

pub async fn get_pull_request_contributions_by_repository<C: GitHubApi + ?Sized>(
    client: &C,
    username: &str,
    start_date: DateTime<Utc>,
    include_comments: bool,
) -> Result<BucketMap<PullRequestContribution>, GitHubError> {
    paginate(
        client,
        queries::PULL_REQUEST_CONTRIBUTIONS_BY_REPOSITORY,
        username,
        start_date,
        include_comments,
        |node: PullRequestNode| {
            let pr = node.pull_request;
            Some(PullRequestContribution {
                body: pr.body,
                changed_files: pr.changed_files,
                closed: pr.closed,
                comments: thread(pr.comments, include_comments),
                created_at: pr.created_at,
                is_draft: pr.is_draft,
                merged: pr.merged,
                number: pr.number,
                review_decision: pr.review_decision,
                state: pr.state,
                title: pr.title,
                url: pr.url,
            })
        },
    )
    .await
}

pub async fn get_pull_request_review_contributions_by_repository<C: GitHubApi + ?Sized>(
    client: &C,
    username: &str,
    start_date: DateTime<Utc>,
    include_comments: bool,
) -> Result<BucketMap<PullRequestReviewContribution>, GitHubError> {
    paginate(
        client,
        queries::PULL_REQUEST_REVIEW_CONTRIBUTIONS_BY_REPOSITORY,
        username,
        start_date,
        include_comments,
        |node: PullRequestReviewNode| {
            let pr = node.pull_request;
            let by_dependabot = pr
                .author
                .as_ref()
                .is_some_and(|author| author.login.contains("dependabot"));
            if by_dependabot {
                return None;
            }

            let review = node.pull_request_review;
            Some(PullRequestReviewContribution {
                pull_request: ReviewedPullRequest {
                    body: pr.body,
                    closed: pr.closed,
                    created_at: pr.created_at,
                    merged: pr.merged,
                    number: pr.number,
                    state: pr.state,
                    title: pr.title,
                    url: pr.url,
                },
                pull_request_review: Review {
                    body: review.body,
                    comments: thread(review.comments, include_comments),
                    created_at: review.created_at,
                    state: review.state,
                },
            })
        },
    )
    .await
}

/// Follows a by-repository collection to its last page.
///
/// Every follow-up request covers all repositories and carries the cursor of
/// the first repository that still has a next page, so finished repositories
/// keep contributing nodes until the last one is done. Nodes are appended per
/// repository; `totalCount` describes the whole collection and is never
/// summed across pages.
async fn paginate<C, N, T, F>(
    client: &C,
    query: &str,
    username: &str,
    start_date: DateTime<Utc>,
    include_comments: bool,
    mut shape: F,
) -> Result<BucketMap<T>, GitHubError>
where
    C: GitHubApi + ?Sized,
    N: DeserializeOwned,
    F: FnMut(N) -> Option<T>,
{
    let start = format_start_date(start_date);
    let mut buckets = BucketMap::new();
    let mut end_cursor: Option<String> = None;
    let mut seen_cursors: HashSet<String> = HashSet::new();

    loop {
        let variables = json!({
            "username": username,
            "startDate": start,
            "endCursor": end_cursor,
            "includeComments": include_comments,
        });
        let page: ContributionsPage<N> = execute(client, query, variables).await?;
        let groups = page.user.contributions_collection.by_repository;

        let next_cursor = groups
            .iter()
            .filter(|group| group.contributions.page_info.has_next_page)
            .find_map(|group| group.contributions.page_info.end_cursor.clone());

        for group in groups {
            let bucket = buckets
                .entry(group.repository.name_with_owner)
                .or_insert_with(|| RepositoryBucket::new(group.repository.url));
            bucket.total_count = bucket.total_count.max(group.contributions.total_count);
            bucket
                .contributions
                .extend(group.contributions.nodes.into_iter().filter_map(&mut shape));
        }

        match next_cursor {
            Some(cursor) if !seen_cursors.insert(cursor.clone()) => {
                warn!("Pagination cursor {} was already requested, stopping", cursor);
                break;
            }
            Some(cursor) => {
                debug!("Fetching next page after {}", cursor);
                end_cursor = Some(cursor);
            }
            None => break,
        }
    }

    Ok(buckets)
}

fn thread(comments: Option<CommentConnection>, include_comments: bool) -> Vec<Comment> {
    if !include_comments {
        return Vec::new();
    }
    comments.map(|c| c.nodes).unwrap_or_default()
}

fn format_start_date(start_date: DateTime<Utc>) -> String {
    start_date.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::contributions::fixtures::date;
    use crate::services::github::mock::{MockGitHub, forbidden};
    use serde_json::Value;

    async fn fetch_issues(
        client: &MockGitHub,
        username: &str,
        include_comments: bool,
    ) -> BucketMap<IssueContribution> {
        get_issue_contributions_by_repository(client, username, date(2024, 1, 1), include_comments)
            .await
            .unwrap()
    }

    fn issue_node(number: u64, body: &str) -> Value {
        json!({
            "issue": {
                "body": body,
                "comments": { "nodes": [{
                    "author": { "login": "hubot" },
                    "body": "+1",
                    "createdAt": "2024-01-03T00:00:00Z",
                    "url": format!("https://github.com/octocat/hello-world/issues/{number}#c1"),
                }] },
                "createdAt": "2024-01-02T10:00:00Z",
                "number": number,
                "state": "OPEN",
                "title": format!("Issue {number}"),
                "url": format!("https://github.com/octocat/hello-world/issues/{number}"),
            }
        })
    }

    fn review_node(number: u64, author: &str) -> Value {
        json!({
            "pullRequest": {
                "author": { "login": author },
                "body": "",
                "closed": false,
                "createdAt": "2024-01-02T10:00:00Z",
                "merged": false,
                "number": number,
                "state": "OPEN",
                "title": format!("PR {number}"),
                "url": format!("https://github.com/octocat/hello-world/pull/{number}"),
            },
            "pullRequestReview": {
                "body": "LGTM",
                "createdAt": "2024-01-03T10:00:00Z",
                "state": "APPROVED",
            }
        })
    }

    fn pull_request_node(number: u64) -> Value {
        json!({
            "pullRequest": {
                "body": "",
                "changedFiles": 2,
                "closed": false,
                "createdAt": "2024-01-02T10:00:00Z",
                "isDraft": false,
                "merged": false,
                "number": number,
                "reviewDecision": null,
                "state": "OPEN",
                "title": format!("PR {number}"),
                "url": format!("https://github.com/octocat/hello-world/pull/{number}"),
            }
        })
    }

    fn group(repository: &str, nodes: Vec<Value>, total: u64, next: Option<&str>) -> Value {
        json!({
            "contributions": {
                "nodes": nodes,
                "pageInfo": { "endCursor": next.unwrap_or("done"), "hasNextPage": next.is_some() },
                "totalCount": total,
            },
            "repository": {
                "nameWithOwner": repository,
                "url": format!("https://github.com/{repository}"),
            }
        })
    }

    fn page(groups: Vec<Value>) -> Value {
        json!({ "user": { "contributionsCollection": { "byRepository": groups } } })
    }

    fn totals(commits: u64) -> Value {
        json!({ "user": { "contributionsCollection": {
            "totalCommitContributions": commits,
            "totalIssueContributions": 1,
            "totalPullRequestContributions": 1,
            "totalPullRequestReviewContributions": 1,
            "totalRepositoriesWithContributedCommits": 1,
            "totalRepositoriesWithContributedIssues": 1,
            "totalRepositoriesWithContributedPullRequests": 1,
            "totalRepositoriesWithContributedPullRequestReviews": 1,
            "totalRepositoryContributions": 0,
        } } })
    }

    #[tokio::test]
    async fn follows_cursor_until_no_repository_has_more() {
        let client = MockGitHub::new()
            .respond(page(vec![group(
                "octocat/hello-world",
                vec![issue_node(1, "a")],
                2,
                Some("c1"),
            )]))
            .respond(page(vec![group("octocat/hello-world", vec![issue_node(2, "b")], 2, None)]));

        let buckets = fetch_issues(&client, "octocat", false).await;

        let calls = client.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].variables()["endCursor"], Value::Null);
        assert_eq!(calls[1].variables()["endCursor"], "c1");
        assert_eq!(calls[1].variables()["startDate"], "2024-01-01T12:00:00.000Z");

        let bucket = &buckets["octocat/hello-world"];
        let numbers: Vec<u64> = bucket.contributions.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(bucket.total_count, 2);
    }

    #[tokio::test]
    async fn finished_repositories_stay_in_follow_up_pages() {
        let client = MockGitHub::new()
            .respond(page(vec![
                group("octocat/done", vec![issue_node(1, "a")], 1, None),
                group("octocat/busy", vec![issue_node(2, "b")], 2, Some("c1")),
            ]))
            .respond(page(vec![
                group("octocat/done", vec![], 1, None),
                group("octocat/busy", vec![issue_node(3, "c")], 2, None),
            ]));

        let buckets = fetch_issues(&client, "octocat", false).await;

        assert_eq!(client.calls()[1].variables()["endCursor"], "c1");
        assert_eq!(buckets["octocat/done"].contributions.len(), 1);
        assert_eq!(buckets["octocat/busy"].contributions.len(), 2);
        assert_eq!(buckets["octocat/busy"].total_count, 2);
    }

    #[tokio::test]
    async fn repeated_cursor_stops_pagination() {
        let client = MockGitHub::new()
            .respond(page(vec![group("octocat/a", vec![issue_node(1, "a")], 9, Some("c1"))]))
            .respond(page(vec![group("octocat/a", vec![issue_node(2, "b")], 9, Some("c1"))]));

        let buckets = fetch_issues(&client, "octocat", false).await;

        assert_eq!(client.calls().len(), 2);
        assert_eq!(buckets["octocat/a"].contributions.len(), 2);
    }

    #[tokio::test]
    async fn alternating_cursors_stop_pagination() {
        let client = MockGitHub::new()
            .respond(page(vec![group("octocat/a", vec![issue_node(1, "a")], 9, Some("c1"))]))
            .respond(page(vec![group("octocat/a", vec![issue_node(2, "b")], 9, Some("c2"))]))
            .respond(page(vec![group("octocat/a", vec![issue_node(3, "c")], 9, Some("c1"))]));

        let buckets = fetch_issues(&client, "octocat", false).await;

        let cursors: Vec<Value> = client
            .calls()
            .iter()
            .map(|call| call.variables()["endCursor"].clone())
            .collect();
        assert_eq!(cursors, vec![Value::Null, json!("c1"), json!("c2")]);
        assert_eq!(buckets["octocat/a"].contributions.len(), 3);
    }

    #[tokio::test]
    async fn skips_previous_reports_of_the_same_user() {
        let report = "# Contributions - @alice\n...";
        let response = page(vec![group(
            "alice/notes",
            vec![issue_node(1, report), issue_node(2, "Real issue")],
            2,
            None,
        )]);

        let client = MockGitHub::new().respond(response.clone());
        let alice = fetch_issues(&client, "alice", false).await;
        let numbers: Vec<u64> =
            alice["alice/notes"].contributions.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![2]);

        let client = MockGitHub::new().respond(response);
        let bob = fetch_issues(&client, "bob", false).await;
        assert_eq!(bob["alice/notes"].contributions.len(), 2);
        assert_eq!(bob["alice/notes"].contributions[0].body, report);
    }

    #[tokio::test]
    async fn comments_are_only_kept_when_requested() {
        let response = page(vec![group("octocat/hello-world", vec![issue_node(1, "a")], 1, None)]);

        let client = MockGitHub::new().respond(response.clone());
        let without = fetch_issues(&client, "octocat", false).await;
        assert!(without["octocat/hello-world"].contributions[0].comments.is_empty());
        assert_eq!(client.calls()[0].variables()["includeComments"], false);

        let client = MockGitHub::new().respond(response);
        let with = fetch_issues(&client, "octocat", true).await;
        let comments = &with["octocat/hello-world"].contributions[0].comments;
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body, "+1");
    }

    #[tokio::test]
    async fn skips_reviews_of_dependabot_pull_requests() {
        let client = MockGitHub::new().respond(page(vec![group(
            "octocat/hello-world",
            vec![review_node(1, "dependabot[bot]"), review_node(2, "hubot")],
            2,
            None,
        )]));

        let start = date(2024, 1, 1);
        let buckets =
            get_pull_request_review_contributions_by_repository(&client, "octocat", start, false)
                .await
                .unwrap();

        let reviews = &buckets["octocat/hello-world"].contributions;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].pull_request.number, 2);
        assert_eq!(reviews[0].pull_request_review.state, "APPROVED");
    }

    #[tokio::test]
    async fn aggregates_every_account_once() {
        let first = MockGitHub::new()
            .respond(json!({ "viewer": { "login": "octocat" } }))
            .respond(totals(3))
            .respond(page(vec![group("octocat/hello-world", vec![issue_node(1, "a")], 1, None)]))
            .respond(page(vec![group("octocat/hello-world", vec![pull_request_node(2)], 1, None)]))
            .respond(page(vec![]));
        let second = MockGitHub::new()
            .respond(json!({ "viewer": { "login": "octocat-emu" } }))
            .respond(totals(4))
            .respond(page(vec![group("octocat/hello-world", vec![issue_node(7, "b")], 1, None)]))
            .respond(page(vec![]))
            .respond(page(vec![group("Zeta/b", vec![review_node(5, "hubot")], 1, None)]));

        let clients = vec![first, second];
        let contributions = get_contributions(&clients, date(2024, 1, 1), false).await.unwrap();

        assert_eq!(clients[0].calls().len(), 5);
        assert_eq!(clients[1].calls().len(), 5);
        assert_eq!(clients[1].calls()[1].variables()["username"], "octocat-emu");

        assert_eq!(contributions.totals.total_commit_contributions, 7);
        let issues = &contributions.issue_contributions_by_repository["octocat/hello-world"];
        let numbers: Vec<u64> = issues.contributions.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 7]);
        assert_eq!(issues.total_count, 2);
        assert_eq!(contributions.pull_request_contributions_by_repository.len(), 1);
        assert_eq!(contributions.pull_request_review_contributions_by_repository.len(), 1);
    }

    #[tokio::test]
    async fn any_failure_aborts_aggregation() {
        let first = MockGitHub::new()
            .respond(json!({ "viewer": { "login": "octocat" } }))
            .respond(totals(3))
            .respond(page(vec![]))
            .respond(page(vec![]))
            .respond(page(vec![]));
        let second = MockGitHub::new()
            .respond(json!({ "viewer": { "login": "octocat-emu" } }))
            .fail(forbidden());

        let result = get_contributions(&[first, second], date(2024, 1, 1), false).await;
        assert!(result.is_err());
    }
}
