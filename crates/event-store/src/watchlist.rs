use crate::RepositoryId;
use std::collections::HashSet;

/// C1 — the set of repository ids a node accepts events for. Fixed at
/// startup from `--repositories`; an empty list is a fatal configuration
/// error (spec.md §4.7, §8).
#[derive(Debug, Clone)]
pub struct Watchlist {
    repositories: HashSet<RepositoryId>,
}

#[derive(Debug, thiserror::Error)]
#[error("--repositories must list at least one repository id")]
pub struct EmptyWatchlistError;

impl Watchlist {
    /// Parse a comma-separated list of repository ids. Entries are trimmed;
    /// empty entries (e.g. from a trailing comma) are dropped. Fails if the
    /// resulting set is empty.
    pub fn parse(raw: &str) -> Result<Self, EmptyWatchlistError> {
        let repositories: HashSet<RepositoryId> = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        if repositories.is_empty() {
            return Err(EmptyWatchlistError);
        }
        Ok(Self { repositories })
    }

    pub fn contains(&self, repository_id: &str) -> bool {
        self.repositories.contains(repository_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryId> {
        self.repositories.iter()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    pub fn to_vec(&self) -> Vec<RepositoryId> {
        let mut ids: Vec<RepositoryId> = self.repositories.iter().cloned().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_comma_separated_list() {
        let wl = Watchlist::parse("R1,R2, R3").unwrap();
        assert_eq!(wl.len(), 3);
        assert!(wl.contains("R1"));
        assert!(wl.contains("R2"));
        assert!(wl.contains("R3"));
    }

    #[test]
    fn rejects_an_empty_list() {
        assert!(Watchlist::parse("").is_err());
        assert!(Watchlist::parse("   ").is_err());
        assert!(Watchlist::parse(",,").is_err());
    }

    #[test]
    fn membership_test_is_exact_match() {
        let wl = Watchlist::parse("R1").unwrap();
        assert!(!wl.contains("r1"));
        assert!(!wl.contains("R1 "));
    }

    #[test]
    fn drops_empty_entries_from_trailing_commas() {
        let wl = Watchlist::parse("R1,R2,").unwrap();
        assert_eq!(wl.len(), 2);
    }
}
