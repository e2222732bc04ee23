pub mod sqlite;

use tokio::sync::watch;

use crate::app::Result;
use crate::domain::Subscription;

pub use sqlite::SqliteStore;

/// What to do when an inserted row collides with an existing name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    Abort,
    Replace,
}

/// Row filter for [`SubscriptionStore::query`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionQuery {
    /// Case-insensitive substring of the name. Empty matches everything.
    pub term: String,
    pub include_hidden: bool,
    pub pending_only: bool,
}

impl SubscriptionQuery {
    pub fn all() -> Self {
        Self {
            include_hidden: true,
            ..Default::default()
        }
    }

    pub fn search(term: &str, include_hidden: bool) -> Self {
        Self {
            term: term.to_string(),
            include_hidden,
            pending_only: false,
        }
    }

    pub fn pending() -> Self {
        Self {
            include_hidden: true,
            pending_only: true,
            ..Default::default()
        }
    }
}

pub trait SubscriptionStore {
    fn query(&self, query: &SubscriptionQuery) -> Result<Vec<Subscription>>;
    fn get(&self, name: &str) -> Result<Option<Subscription>>;
    fn insert(&self, subscription: &Subscription, conflict: ConflictPolicy) -> Result<i64>;
    /// Overwrites the row keyed by `subscription.name`.
    fn update(&self, subscription: &Subscription) -> Result<usize>;
    fn delete(&self, name: &str) -> Result<usize>;
    fn delete_all(&self) -> Result<usize>;
    /// Delete-all followed by insert-all, committed as one transaction.
    fn replace_all(&self, subscriptions: &[Subscription]) -> Result<()>;

    /// Receiver whose value changes after every committed write.
    fn changes(&self) -> watch::Receiver<u64>;
}

pub trait PrefsStore {
    fn get_pref(&self, key: &str) -> Result<Option<String>>;
    fn set_pref(&self, key: &str, value: &str) -> Result<()>;
}
