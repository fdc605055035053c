use crate::models::{AccountType, AggregatedContributor, ContributionRecord};
use std::collections::HashMap;

pub const REPO_DELIMITER: &str = " | ";

/// Folds tagged records into one entry per login, in first-seen order.
///
/// Records for bots, organizations and other non-individual accounts are
/// dropped. Logins are compared exactly, so `Octocat` and `octocat` stay apart.
pub fn aggregate(records: impl IntoIterator<Item = ContributionRecord>) -> Vec<AggregatedContributor> {
    let mut contributors: Vec<AggregatedContributor> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        if record.account_type != AccountType::User {
            continue;
        }
        match index.get(&record.login) {
            Some(&slot) => contributors[slot].add(record),
            None => {
                index.insert(record.login.clone(), contributors.len());
                contributors.push(AggregatedContributor::seeded(record));
            }
        }
    }

    contributors
}

/// Orders contributors by total, highest first, and fills in the derived
/// repository fields. Both sorts are stable: ties keep their incoming order.
pub fn rank(mut contributors: Vec<AggregatedContributor>) -> Vec<AggregatedContributor> {
    contributors.sort_by(|a, b| b.total_contributions.cmp(&a.total_contributions));

    for contributor in &mut contributors {
        contributor
            .repositories
            .sort_by(|a, b| b.contributions.cmp(&a.contributions));
        contributor.top_repository = contributor.repositories.first().map(|r| r.repo.clone());
        contributor.all_repositories = contributor
            .repositories
            .iter()
            .map(|r| r.repo.as_str())
            .collect::<Vec<_>>()
            .join(REPO_DELIMITER);
    }

    contributors
}
