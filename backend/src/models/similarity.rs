//! Similarity aggregation
//!
//! Each stargazer of the subject contributes one vote to every distinct
//! repository they starred. The index only grows while a job runs.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use super::{RepoKey, RepoListing};

/// A repository and the number of subject stargazers who also starred it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarRepoEntry {
    /// Metadata of the first listing seen for this repository
    pub listing: RepoListing,
    pub shared_starrer_count: u32,
}

impl SimilarRepoEntry {
    pub fn repo(&self) -> &RepoKey {
        &self.listing.key
    }
}

/// Map of repository to its shared starrer count
#[derive(Debug, Clone, Default)]
pub struct SimilarityIndex {
    entries: HashMap<RepoKey, SimilarRepoEntry>,
}

impl SimilarityIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, repo: &RepoKey) -> Option<&SimilarRepoEntry> {
        self.entries.get(repo)
    }

    /// Fold one user's starred list into the index.
    ///
    /// A repository listed twice by the same user still counts once.
    pub fn record_user_stars(&mut self, listings: impl IntoIterator<Item = RepoListing>) {
        let mut seen = HashSet::new();
        for listing in listings {
            if !seen.insert(listing.key.clone()) {
                continue;
            }
            self.entries
                .entry(listing.key.clone())
                .and_modify(|entry| entry.shared_starrer_count += 1)
                .or_insert(SimilarRepoEntry {
                    listing,
                    shared_starrer_count: 1,
                });
        }
    }

    /// All entries except `subject`, highest count first, ties by key.
    pub fn ranking(&self, subject: &RepoKey) -> Vec<SimilarRepoEntry> {
        let mut ranked: Vec<SimilarRepoEntry> = self
            .entries
            .values()
            .filter(|entry| entry.repo() != subject)
            .cloned()
            .collect();
        ranked.sort_by(|a, b| {
            b.shared_starrer_count
                .cmp(&a.shared_starrer_count)
                .then_with(|| a.repo().cmp(b.repo()))
        });
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn listing(full_name: &str) -> RepoListing {
        RepoListing::bare(full_name.parse().unwrap())
    }

    fn key(full_name: &str) -> RepoKey {
        full_name.parse().unwrap()
    }

    #[test]
    fn test_counts_one_vote_per_user() {
        let mut index = SimilarityIndex::new();
        index.record_user_stars(vec![listing("octo/x"), listing("octo/y")]);
        index.record_user_stars(vec![listing("octo/x")]);

        assert_eq!(index.len(), 2);
        assert_eq!(index.get(&key("octo/x")).unwrap().shared_starrer_count, 2);
        assert_eq!(index.get(&key("octo/y")).unwrap().shared_starrer_count, 1);
    }

    #[test]
    fn test_duplicates_within_one_list_count_once() {
        let mut index = SimilarityIndex::new();
        index.record_user_stars(vec![listing("octo/x"), listing("octo/x")]);
        assert_eq!(index.get(&key("octo/x")).unwrap().shared_starrer_count, 1);
    }

    #[test]
    fn test_first_listing_metadata_is_kept() {
        let mut first = listing("octo/x");
        first.stargazers_count = 10;
        let mut second = listing("octo/x");
        second.stargazers_count = 99;

        let mut index = SimilarityIndex::new();
        index.record_user_stars(vec![first]);
        index.record_user_stars(vec![second]);

        assert_eq!(index.get(&key("octo/x")).unwrap().listing.stargazers_count, 10);
    }

    #[test]
    fn test_ranking_excludes_subject_and_orders_ties_by_key() {
        let mut index = SimilarityIndex::new();
        index.record_user_stars(vec![listing("octo/app"), listing("b/two"), listing("a/one")]);
        index.record_user_stars(vec![listing("octo/app"), listing("c/three")]);
        index.record_user_stars(vec![listing("c/three")]);

        let ranked: Vec<String> = index
            .ranking(&key("octo/app"))
            .iter()
            .map(|e| e.repo().to_string())
            .collect();

        assert_eq!(ranked, vec!["c/three", "a/one", "b/two"]);
    }

    #[test]
    fn test_ranking_of_empty_index() {
        assert!(SimilarityIndex::new().ranking(&key("octo/app")).is_empty());
    }

    fn user_lists_strategy() -> impl Strategy<Value = Vec<Vec<String>>> {
        let repo = prop::sample::select(vec![
            "octo/app", "octo/x", "octo/y", "rust-lang/rust", "tokio-rs/tokio",
        ])
        .prop_map(String::from);
        prop::collection::vec(prop::collection::vec(repo, 0..6), 0..12)
    }

    fn ranking_of(lists: &[Vec<String>]) -> Vec<(String, u32)> {
        let mut index = SimilarityIndex::new();
        for list in lists {
            index.record_user_stars(list.iter().map(|r| listing(r)));
        }
        index
            .ranking(&key("octo/app"))
            .into_iter()
            .map(|e| (e.repo().to_string(), e.shared_starrer_count))
            .collect()
    }

    mod property_similarity_index {
        use super::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(50))]

            /// Aggregation does not depend on the order users arrive in
            #[test]
            fn order_independent(
                (lists, shuffled) in user_lists_strategy().prop_flat_map(|lists| {
                    let shuffled = Just(lists.clone()).prop_shuffle();
                    (Just(lists), shuffled)
                })
            ) {
                prop_assert_eq!(ranking_of(&lists), ranking_of(&shuffled));
            }

            /// The subject never shows up in its own ranking
            #[test]
            fn subject_never_ranked(lists in user_lists_strategy()) {
                prop_assert!(ranking_of(&lists).iter().all(|(repo, _)| repo != "octo/app"));
            }

            /// No count exceeds the number of users
            #[test]
            fn counts_bounded_by_users(lists in user_lists_strategy()) {
                let users = lists.len() as u32;
                prop_assert!(ranking_of(&lists).iter().all(|(_, count)| *count <= users));
            }
        }
    }
}
