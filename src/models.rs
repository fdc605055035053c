use serde::{Deserialize, Serialize};

/// One entry of the `/users/{owner}/repos` listing.
#[derive(Deserialize, Debug, Clone)]
pub struct Repo {
    pub full_name: String,
    pub fork: bool,
    pub private: bool,
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    User,
    Bot,
    Organization,
    #[serde(other)]
    Other,
}

/// One entry of the `/repos/{owner}/{repo}/contributors` listing.
#[derive(Deserialize, Debug, Clone)]
pub struct Contributor {
    pub login: String,
    #[serde(rename = "type")]
    pub account_type: AccountType,
    pub contributions: u64,
    pub html_url: String,
    pub avatar_url: String,
}

/// A contributor entry tagged with the repository it was listed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributionRecord {
    pub login: String,
    pub account_type: AccountType,
    pub contributions: u64,
    pub repo_full_name: String,
    pub profile_url: String,
    pub avatar_url: String,
}

impl ContributionRecord {
    pub fn tagged(contributor: Contributor, repo_full_name: &str) -> Self {
        Self {
            login: contributor.login,
            account_type: contributor.account_type,
            contributions: contributor.contributions,
            repo_full_name: repo_full_name.to_string(),
            profile_url: contributor.html_url,
            avatar_url: contributor.avatar_url,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct RepoContribution {
    pub repo: String,
    pub contributions: u64,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AggregatedContributor {
    pub login: String,
    pub profile_url: String,
    pub avatar_url: String,
    pub total_contributions: u64,
    pub repositories: Vec<RepoContribution>,
    /// Set by ranking.
    pub top_repository: Option<String>,
    /// Set by ranking.
    pub all_repositories: String,
}

impl AggregatedContributor {
    pub fn seeded(record: ContributionRecord) -> Self {
        Self {
            login: record.login,
            profile_url: record.profile_url,
            avatar_url: record.avatar_url,
            total_contributions: record.contributions,
            repositories: vec![RepoContribution {
                repo: record.repo_full_name,
                contributions: record.contributions,
            }],
            top_repository: None,
            all_repositories: String::new(),
        }
    }

    pub fn add(&mut self, record: ContributionRecord) {
        self.total_contributions += record.contributions;
        self.repositories.push(RepoContribution {
            repo: record.repo_full_name,
            contributions: record.contributions,
        });
    }
}
