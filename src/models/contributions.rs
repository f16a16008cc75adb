use crate::models::github::{Comment, ContributionTotals};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Records of one contribution kind in one repository, keyed by
/// `nameWithOwner` in the aggregate maps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryBucket<T> {
    pub contributions: Vec<T>,
    /// Server-reported size of the whole collection, not of a page.
    pub total_count: u64,
    pub url: String,
}

impl<T> RepositoryBucket<T> {
    pub fn new(url: String) -> Self {
        Self {
            contributions: Vec::new(),
            total_count: 0,
            url,
        }
    }
}

pub type BucketMap<T> = BTreeMap<String, RepositoryBucket<T>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueContribution {
    pub body: String,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub number: u64,
    pub state: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestContribution {
    pub body: String,
    pub changed_files: u64,
    pub closed: bool,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub is_draft: bool,
    pub merged: bool,
    pub number: u64,
    pub review_decision: Option<String>,
    pub state: String,
    pub title: String,
    pub url: String,
}

/// A review paired with the pull request it was left on, as the pull request
/// looked when queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequestReviewContribution {
    pub pull_request: ReviewedPullRequest,
    pub pull_request_review: Review,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewedPullRequest {
    pub body: String,
    pub closed: bool,
    pub created_at: DateTime<Utc>,
    pub merged: bool,
    pub number: u64,
    pub state: String,
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub body: String,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub state: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributions {
    #[serde(flatten)]
    pub totals: ContributionTotals,
    pub issue_contributions_by_repository: BucketMap<IssueContribution>,
    pub pull_request_contributions_by_repository: BucketMap<PullRequestContribution>,
    pub pull_request_review_contributions_by_repository: BucketMap<PullRequestReviewContribution>,
}

impl Contributions {
    /// Folds another account's contributions into this one. Totals are summed
    /// and buckets that share a repository have their records concatenated.
    pub fn merge(&mut self, other: Contributions) {
        self.totals += other.totals;
        merge_buckets(
            &mut self.issue_contributions_by_repository,
            other.issue_contributions_by_repository,
        );
        merge_buckets(
            &mut self.pull_request_contributions_by_repository,
            other.pull_request_contributions_by_repository,
        );
        merge_buckets(
            &mut self.pull_request_review_contributions_by_repository,
            other.pull_request_review_contributions_by_repository,
        );
    }
}

/// Repository names match case-insensitively; the first spelling and URL seen
/// are kept.
fn merge_buckets<T>(into: &mut BucketMap<T>, from: BucketMap<T>) {
    for (key, bucket) in from {
        let existing = into
            .iter_mut()
            .find(|(name, _)| name.eq_ignore_ascii_case(&key))
            .map(|(_, existing)| existing);
        match existing {
            Some(existing) => {
                existing.total_count += bucket.total_count;
                existing.contributions.extend(bucket.contributions);
            }
            None => {
                into.insert(key, bucket);
            }
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn contributions_with(repository: &str, issue_numbers: &[u64], commits: u64) -> Contributions {
        let mut contributions = Contributions::default();
        contributions.totals.total_commit_contributions = commits;
        contributions.totals.total_issue_contributions = issue_numbers.len() as u64;
        contributions.issue_contributions_by_repository.insert(
            repository.to_string(),
            bucket(repository, issue_numbers.iter().map(|n| issue(*n, "Issue")).collect()),
        );
        contributions
    }

    #[test]
    fn merge_concatenates_records_for_shared_repositories() {
        let mut merged = contributions_with("octocat/hello-world", &[1, 2], 3);
        merged.merge(contributions_with("octocat/hello-world", &[7], 4));

        let bucket = &merged.issue_contributions_by_repository["octocat/hello-world"];
        let numbers: Vec<u64> = bucket.contributions.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2, 7]);
        assert_eq!(bucket.total_count, 3);
        assert_eq!(bucket.url, "https://github.com/octocat/hello-world");
        assert_eq!(merged.totals.total_commit_contributions, 7);
        assert_eq!(merged.totals.total_issue_contributions, 3);
    }

    #[test]
    fn merge_matches_repository_names_ignoring_case() {
        let mut merged = contributions_with("Octocat/Hello-World", &[1], 0);
        merged.merge(contributions_with("octocat/hello-world", &[2], 0));

        let keys: Vec<&String> = merged.issue_contributions_by_repository.keys().collect();
        assert_eq!(keys, vec!["Octocat/Hello-World"]);
        let bucket = &merged.issue_contributions_by_repository["Octocat/Hello-World"];
        let numbers: Vec<u64> = bucket.contributions.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![1, 2]);
        assert_eq!(bucket.total_count, 2);
        assert_eq!(bucket.url, "https://github.com/Octocat/Hello-World");
    }

    #[test]
    fn merge_is_commutative_up_to_record_order() {
        let a = contributions_with("octocat/hello-world", &[1, 2], 3);
        let mut b = contributions_with("octocat/hello-world", &[5], 1);
        b.issue_contributions_by_repository
            .insert("Zeta/b".to_string(), bucket("Zeta/b", vec![issue(9, "Other")]));

        let mut ab = a.clone();
        ab.merge(b.clone());
        let mut ba = b;
        ba.merge(a);

        assert_eq!(ab.totals, ba.totals);
        let keys = |c: &Contributions| {
            c.issue_contributions_by_repository
                .keys()
                .cloned()
                .collect::<Vec<_>>()
        };
        assert_eq!(keys(&ab), keys(&ba));
        for (key, bucket) in &ab.issue_contributions_by_repository {
            let mut left: Vec<u64> = bucket.contributions.iter().map(|i| i.number).collect();
            let mut right: Vec<u64> = ba.issue_contributions_by_repository[key]
                .contributions
                .iter()
                .map(|i| i.number)
                .collect();
            left.sort();
            right.sort();
            assert_eq!(left, right);
        }
    }

    #[test]
    fn serializes_totals_alongside_buckets() {
        let contributions = contributions_with("octocat/hello-world", &[1], 2);
        let json = serde_json::to_value(&contributions).unwrap();

        assert_eq!(json["totalCommitContributions"], 2);
        assert_eq!(
            json["issueContributionsByRepository"]["octocat/hello-world"]["totalCount"],
            1
        );
    }
}
