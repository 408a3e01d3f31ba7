//! Query cache with mutation-driven invalidation.
//!
//! # Responsibility
//! - Name every cached read (`QueryKey`).
//! - Map each write (`Mutation`) to the reads it makes stale.
//! - Memoize successful loads until invalidated or past their max age.
//!
//! # Invariants
//! - A failed load leaves the cache untouched.
//! - Invalidation is exact: only the keys a mutation lists are dropped.

use crate::model::client::ClientId;
use crate::model::matching::MatchId;
use crate::model::property::PropertyId;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Identity of one cached read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKey {
    Properties,
    Property(PropertyId),
    Clients,
    Client(ClientId),
    Matches,
    UnviewedMatchesCount,
    DashboardStats,
}

/// Write operations that can make cached reads stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    CreateProperty,
    UpdateProperty(PropertyId),
    DeleteProperty(PropertyId),
    CreateClient,
    UpdateClient(ClientId),
    DeleteClient(ClientId),
    RecordMatch,
    MarkMatchViewed(MatchId),
    UpdateMatchStatus(MatchId),
    DeleteMatch(MatchId),
}

impl Mutation {
    pub fn invalidated_keys(self) -> Vec<QueryKey> {
        use QueryKey::*;

        match self {
            Self::CreateProperty => vec![Properties, DashboardStats, UnviewedMatchesCount],
            Self::UpdateProperty(id) => vec![Properties, Property(id), DashboardStats],
            Self::DeleteProperty(id) => vec![
                Properties,
                Property(id),
                DashboardStats,
                Matches,
                UnviewedMatchesCount,
            ],
            Self::CreateClient => vec![Clients, DashboardStats, UnviewedMatchesCount],
            Self::UpdateClient(id) => vec![Clients, Client(id), DashboardStats],
            Self::DeleteClient(id) => vec![
                Clients,
                Client(id),
                DashboardStats,
                Matches,
                UnviewedMatchesCount,
            ],
            Self::RecordMatch
            | Self::MarkMatchViewed(_)
            | Self::UpdateMatchStatus(_)
            | Self::DeleteMatch(_) => vec![Matches, UnviewedMatchesCount, DashboardStats],
        }
    }
}

/// Memoized query results keyed by [`QueryKey`].
///
/// Entries older than `max_age` are treated as absent and reloaded on the
/// next read. Without a max age an entry lives until invalidated.
#[derive(Debug)]
pub struct QueryCache<V> {
    entries: HashMap<QueryKey, CacheEntry<V>>,
    max_age: Option<Duration>,
}

#[derive(Debug)]
struct CacheEntry<V> {
    value: V,
    loaded_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, max_age: Option<Duration>) -> bool {
        max_age.map_or(true, |max_age| self.loaded_at.elapsed() < max_age)
    }
}

impl<V> Default for QueryCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            max_age: None,
        }
    }
}

impl<V: Clone> QueryCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache whose entries go stale `max_age` after loading.
    /// `Duration::ZERO` reloads on every read.
    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_age: Some(max_age),
        }
    }

    /// Returns the fresh cached value or runs `loader`, caching only on success.
    pub fn get_or_load<E>(
        &mut self,
        key: QueryKey,
        loader: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(value) = self.get(&key) {
            return Ok(value.clone());
        }
        let value = loader()?;
        self.entries.insert(
            key,
            CacheEntry {
                value: value.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(value)
    }

    pub fn get(&self, key: &QueryKey) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| entry.is_fresh(self.max_age))
            .map(|entry| &entry.value)
    }

    pub fn contains(&self, key: &QueryKey) -> bool {
        self.get(key).is_some()
    }

    pub fn invalidate(&mut self, keys: &[QueryKey]) {
        for key in keys {
            self.entries.remove(key);
        }
    }

    pub fn apply(&mut self, mutation: Mutation) {
        self.invalidate(&mutation.invalidated_keys());
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
