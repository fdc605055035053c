use crate::aggregate::{aggregate, rank};
use crate::config::Config;
use crate::error::{LeaderboardError, Result};
use crate::models::{AggregatedContributor, ContributionRecord, Contributor, Repo};
use crate::pagination::{paginate, PageSource};
use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

/// Contributor records gathered across repositories.
#[derive(Debug, Default)]
pub struct Collection {
    pub records: Vec<ContributionRecord>,
    /// Repositories whose contributor listing could not be fetched.
    pub skipped: Vec<String>,
}

#[derive(Debug)]
pub struct ScanReport {
    pub repositories_scanned: usize,
    pub skipped_repositories: Vec<String>,
    pub contributors: Vec<AggregatedContributor>,
}

/// Keeps public, non-fork repositories in their listed order.
pub fn filter_repositories(repos: Vec<Repo>) -> Vec<Repo> {
    repos.into_iter().filter(|r| !r.fork && !r.private).collect()
}

pub struct Scanner<S> {
    source: S,
    config: Config,
}

impl<S: PageSource> Scanner<S> {
    pub fn new(source: S, config: Config) -> Self {
        Self { source, config }
    }

    pub async fn fetch_repositories(&self) -> Result<Vec<Repo>> {
        let path = format!("users/{}/repos", self.config.owner);
        paginate(&self.source, &path, self.config.max_pages).await
    }

    /// Fetches each repository's contributors and tags them with the repository.
    ///
    /// Up to `concurrency` listings are in flight, but results are consumed in
    /// input order. A repository whose listing fails is logged and skipped; one
    /// with no contributors simply adds nothing.
    pub async fn collect_contributors(&self, repos: &[String]) -> Collection {
        let results: Vec<(&String, Result<Vec<Contributor>>)> = stream::iter(repos)
            .map(|repo| async move {
                let path = format!("repos/{}/contributors", repo);
                let listed = paginate(&self.source, &path, self.config.max_pages).await;
                (repo, listed)
            })
            .buffered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut collection = Collection::default();
        for (repo, listed) in results {
            match listed {
                Ok(contributors) => {
                    debug!(repo = %repo, count = contributors.len(), "collected contributors");
                    collection.records.extend(
                        contributors
                            .into_iter()
                            .map(|c| ContributionRecord::tagged(c, repo)),
                    );
                }
                Err(e) => {
                    warn!(repo = %repo, error = %e, "skipping repository");
                    collection.skipped.push(repo.clone());
                }
            }
        }
        collection
    }

    /// Runs the whole scan for the configured owner and returns the ranked leaderboard.
    pub async fn run(&self) -> Result<ScanReport> {
        let owner = &self.config.owner;
        info!(owner = %owner, "fetching repositories");
        let repos = self.fetch_repositories().await?;
        if repos.is_empty() {
            return Err(LeaderboardError::EmptyResult(format!(
                "repositories for {}",
                owner
            )));
        }

        let listed = repos.len();
        let eligible: Vec<String> = filter_repositories(repos)
            .into_iter()
            .map(|r| r.full_name)
            .collect();
        info!(listed, eligible = eligible.len(), "filtered out forks and private repositories");
        if eligible.is_empty() {
            return Err(LeaderboardError::EmptyResult(format!(
                "public non-fork repositories for {}",
                owner
            )));
        }

        let collection = self.collect_contributors(&eligible).await;
        info!(
            records = collection.records.len(),
            skipped = collection.skipped.len(),
            "collected contributor records"
        );

        let skipped = collection.skipped.len();
        let contributors = rank(aggregate(collection.records));
        if contributors.is_empty() {
            let what = if skipped > 0 {
                format!(
                    "individual contributors ({} of {} repositories failed to fetch)",
                    skipped,
                    eligible.len()
                )
            } else {
                "individual contributors".to_string()
            };
            return Err(LeaderboardError::EmptyResult(what));
        }
        info!(contributors = contributors.len(), "ranked contributors");

        Ok(ScanReport {
            repositories_scanned: eligible.len() - collection.skipped.len(),
            skipped_repositories: collection.skipped,
            contributors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github_client::GithubClient;
    use crate::pagination::fake::{FakePage, FakeSource};
    use serde_json::json;

    fn repo(name: &str, fork: bool, private: bool) -> Repo {
        Repo {
            full_name: name.to_string(),
            fork,
            private,
        }
    }

    fn page(value: serde_json::Value) -> FakePage {
        FakePage::Body(value.to_string())
    }

    fn contributor(login: &str, kind: &str, contributions: u64) -> serde_json::Value {
        json!({
            "login": login,
            "type": kind,
            "contributions": contributions,
            "html_url": format!("https://github.com/{login}"),
            "avatar_url": format!("https://avatars.example/{login}"),
        })
    }

    fn scanner(source: FakeSource) -> Scanner<FakeSource> {
        Scanner::new(source, Config::new("acme"))
    }

    #[test]
    fn filter_keeps_public_originals_in_order() {
        let kept = filter_repositories(vec![
            repo("acme/fork", true, false),
            repo("acme/secret", false, true),
            repo("acme/one", false, false),
            repo("acme/two", false, false),
        ]);
        let names: Vec<_> = kept.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["acme/one", "acme/two"]);
    }

    #[test]
    fn filter_of_nothing_is_nothing() {
        assert!(filter_repositories(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn collector_tags_records_and_skips_failures() {
        let source = FakeSource::default()
            .with_pages(
                "repos/acme/one/contributors",
                vec![page(json!([contributor("a", "User", 5)]))],
            )
            .with_pages("repos/acme/empty/contributors", vec![page(json!([]))])
            .with_pages(
                "repos/acme/two/contributors",
                vec![page(json!([contributor("b", "User", 2)]))],
            );
        let repos = vec![
            "acme/one".to_string(),
            "acme/broken".to_string(),
            "acme/empty".to_string(),
            "acme/two".to_string(),
        ];

        let collection = scanner(source).collect_contributors(&repos).await;
        let tagged: Vec<_> = collection
            .records
            .iter()
            .map(|r| (r.login.as_str(), r.repo_full_name.as_str()))
            .collect();
        assert_eq!(tagged, vec![("a", "acme/one"), ("b", "acme/two")]);
        assert_eq!(collection.skipped, vec!["acme/broken".to_string()]);
    }

    #[tokio::test]
    async fn concurrent_collection_keeps_input_order() {
        let mut source = FakeSource::default();
        let repos: Vec<String> = (0..6).map(|i| format!("acme/r{i}")).collect();
        for (i, name) in repos.iter().enumerate() {
            source = source.with_pages(
                &format!("repos/{name}/contributors"),
                vec![page(json!([contributor(&format!("u{i}"), "User", 1)]))],
            );
        }
        let mut config = Config::new("acme");
        config.concurrency = 4;

        let collection = Scanner::new(source, config).collect_contributors(&repos).await;
        let logins: Vec<_> = collection.records.iter().map(|r| r.login.clone()).collect();
        assert_eq!(logins, vec!["u0", "u1", "u2", "u3", "u4", "u5"]);
    }

    #[tokio::test]
    async fn run_ranks_across_repositories() {
        let source = FakeSource::default()
            .with_pages(
                "users/acme/repos",
                vec![page(json!([
                    {"full_name": "acme/r1", "fork": false, "private": false},
                    {"full_name": "acme/forked", "fork": true, "private": false},
                    {"full_name": "acme/r2", "fork": false, "private": false},
                ]))],
            )
            .with_pages(
                "repos/acme/r1/contributors",
                vec![page(json!([
                    contributor("a", "User", 5),
                    contributor("dependabot[bot]", "Bot", 100),
                    contributor("b", "User", 2),
                ]))],
            )
            .with_pages(
                "repos/acme/r2/contributors",
                vec![page(json!([
                    contributor("b", "User", 9),
                    contributor("a", "User", 3),
                ]))],
            );

        let report = scanner(source).run().await.unwrap();
        assert_eq!(report.repositories_scanned, 2);
        assert!(report.skipped_repositories.is_empty());

        let b = &report.contributors[0];
        assert_eq!(b.login, "b");
        assert_eq!(b.total_contributions, 11);
        assert_eq!(b.all_repositories, "acme/r2 | acme/r1");

        let a = &report.contributors[1];
        assert_eq!(a.total_contributions, 8);
        assert_eq!(a.top_repository.as_deref(), Some("acme/r1"));
        assert_eq!(report.contributors.len(), 2);
    }

    #[tokio::test]
    async fn run_fails_when_owner_has_no_repositories() {
        let source = FakeSource::default().with_pages("users/acme/repos", vec![page(json!([]))]);
        let err = scanner(source).run().await.unwrap_err();
        assert!(matches!(err, LeaderboardError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn run_fails_when_only_forks_exist() {
        let source = FakeSource::default().with_pages(
            "users/acme/repos",
            vec![page(json!([{"full_name": "acme/f", "fork": true, "private": false}]))],
        );
        let err = scanner(source).run().await.unwrap_err();
        assert!(matches!(err, LeaderboardError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn run_fails_when_only_bots_contribute() {
        let source = FakeSource::default()
            .with_pages(
                "users/acme/repos",
                vec![page(json!([{"full_name": "acme/r", "fork": false, "private": false}]))],
            )
            .with_pages(
                "repos/acme/r/contributors",
                vec![page(json!([contributor("renovate[bot]", "Bot", 3)]))],
            );
        let err = scanner(source).run().await.unwrap_err();
        assert!(matches!(err, LeaderboardError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn run_fails_when_every_contributor_fetch_fails() {
        let source = FakeSource::default().with_pages(
            "users/acme/repos",
            vec![page(json!([
                {"full_name": "acme/r1", "fork": false, "private": false},
                {"full_name": "acme/r2", "fork": false, "private": false},
            ]))],
        );
        let err = scanner(source).run().await.unwrap_err();
        match err {
            LeaderboardError::EmptyResult(what) => {
                assert!(what.contains("2 of 2 repositories failed to fetch"), "{what}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn empty_contributors_without_failures_names_no_failures() {
        let source = FakeSource::default()
            .with_pages(
                "users/acme/repos",
                vec![page(json!([{"full_name": "acme/r", "fork": false, "private": false}]))],
            )
            .with_pages("repos/acme/r/contributors", vec![page(json!([]))]);
        let err = scanner(source).run().await.unwrap_err();
        match err {
            LeaderboardError::EmptyResult(what) => assert!(!what.contains("failed"), "{what}"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn repository_listing_failure_is_fatal() {
        let source = FakeSource::default()
            .with_pages("users/acme/repos", vec![FakePage::Body("not json".into())]);
        let err = scanner(source).run().await.unwrap_err();
        assert!(matches!(err, LeaderboardError::Decode { .. }));
    }

    #[tokio::test]
    async fn run_over_http() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let full_page: Vec<_> = (0..100)
            .map(|i| json!({"full_name": format!("acme/fork{i}"), "fork": true, "private": false}))
            .collect();
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/acme/repos").query_param("page", "1");
                then.status(200).json_body(json!(full_page));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/users/acme/repos").query_param("page", "2");
                then.status(200)
                    .json_body(json!([{"full_name": "acme/app", "fork": false, "private": false}]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/acme/app/contributors");
                then.status(200).json_body(json!([contributor("octocat", "User", 12)]));
            })
            .await;

        let mut config = Config::new("acme");
        config.api_url = server.base_url();
        let client = GithubClient::new(&config).unwrap();
        let report = Scanner::new(client, config).run().await.unwrap();

        assert_eq!(report.contributors.len(), 1);
        assert_eq!(report.contributors[0].login, "octocat");
        assert_eq!(report.contributors[0].top_repository.as_deref(), Some("acme/app"));
    }
}
