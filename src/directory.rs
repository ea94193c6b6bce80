//! Subscriber directory collaborator
//!
//! Subscriber identity, credentials and preference CRUD live outside this
//! core. The aggregator and refresh scheduler only need read access to
//! preference snapshots, expressed by the [`SubscriberDirectory`] trait.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::data::{Preferences, SubscriberPreferences};

/// Read access to subscriber preference snapshots
///
/// Only preference fields cross this boundary; identity and secrets do not.
#[async_trait]
pub trait SubscriberDirectory: Send + Sync {
    /// Preference snapshots for every known subscriber
    async fn list_all_preferences(&self) -> Vec<SubscriberPreferences>;

    /// One subscriber's preferences
    ///
    /// # Returns
    /// * `Some(Preferences)` for a known subscriber
    /// * `None` when the subscriber does not exist
    async fn get_preferences(&self, subscriber_id: &str) -> Option<Preferences>;
}

/// In-memory subscriber directory
///
/// Backs the daemon binary (seeded from a JSON file) and tests. Real
/// deployments substitute a directory backed by their subscriber store.
#[derive(Debug, Default)]
pub struct MemoryDirectory {
    subscribers: DashMap<String, Preferences>,
}

impl MemoryDirectory {
    /// Creates an empty directory
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
        }
    }

    /// Creates a directory holding the given preference records
    pub fn from_subscribers(subscribers: Vec<SubscriberPreferences>) -> Self {
        let directory = Self::new();
        for subscriber in subscribers {
            directory.insert(subscriber.subscriber_id, subscriber.preferences);
        }
        directory
    }

    /// Adds or replaces one subscriber's preferences
    pub fn insert(&self, subscriber_id: impl Into<String>, preferences: Preferences) {
        self.subscribers.insert(subscriber_id.into(), preferences);
    }

    /// Removes a subscriber
    pub fn remove(&self, subscriber_id: &str) {
        self.subscribers.remove(subscriber_id);
    }

    /// Number of known subscribers
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    /// True when no subscribers are known
    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

#[async_trait]
impl SubscriberDirectory for MemoryDirectory {
    async fn list_all_preferences(&self) -> Vec<SubscriberPreferences> {
        let mut all: Vec<SubscriberPreferences> = self
            .subscribers
            .iter()
            .map(|entry| SubscriberPreferences {
                subscriber_id: entry.key().clone(),
                preferences: entry.value().clone(),
            })
            .collect();
        // Deterministic sweep order for logs and tests.
        all.sort_by(|a, b| a.subscriber_id.cmp(&b.subscriber_id));
        all
    }

    async fn get_preferences(&self, subscriber_id: &str) -> Option<Preferences> {
        self.subscribers
            .get(subscriber_id)
            .map(|entry| entry.value().clone())
    }
}
