use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rusqlite_migration::{Migrations, M};
use tokio::sync::watch;

use crate::app::{Result, SnooError};
use crate::domain::{PendingState, Subscription};
use crate::store::{ConflictPolicy, PrefsStore, SubscriptionQuery, SubscriptionStore};

pub struct SqliteStore {
    conn: Mutex<Connection>,
    changes: watch::Sender<u64>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_connection(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        let (changes, _) = watch::channel(0);
        let store = Self {
            conn: Mutex::new(conn),
            changes,
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.lock()?;
        migrations.to_latest(&mut conn)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|e| {
            SnooError::Database(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(1),
                Some(e.to_string()),
            ))
        })
    }

    fn notify(&self) {
        self.changes.send_modify(|version| *version += 1);
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
        let state: String = row.get(1)?;
        let pending_state = state
            .parse::<PendingState>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?;

        Ok(Subscription {
            name: row.get(0)?,
            pending_state,
            hidden: row.get::<_, i32>(2)? != 0,
        })
    }

    /// Turns a search term into a LIKE pattern, matching `%` and `_` literally.
    fn like_pattern(term: &str) -> String {
        let mut pattern = String::with_capacity(term.len() + 2);
        pattern.push('%');
        for c in term.chars() {
            if matches!(c, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(c);
        }
        pattern.push('%');
        pattern
    }
}

const INSERT_ABORT: &str = "INSERT OR ABORT INTO subreddit_subscriptions (name, pending_state, is_hidden)
     VALUES (?1, ?2, ?3)";
const INSERT_REPLACE: &str = "INSERT OR REPLACE INTO subreddit_subscriptions (name, pending_state, is_hidden)
     VALUES (?1, ?2, ?3)";

impl SubscriptionStore for SqliteStore {
    fn query(&self, query: &SubscriptionQuery) -> Result<Vec<Subscription>> {
        let conn = self.lock()?;

        let mut stmt = conn.prepare(
            "SELECT name, pending_state, is_hidden FROM subreddit_subscriptions
             WHERE name LIKE ?1 ESCAPE '\\'
               AND (?2 OR is_hidden = 0)
               AND (?3 = 0 OR pending_state != 'NONE')
             ORDER BY name COLLATE NOCASE",
        )?;

        let subscriptions = stmt
            .query_map(
                params![
                    Self::like_pattern(&query.term),
                    query.include_hidden,
                    query.pending_only
                ],
                Self::map_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(subscriptions)
    }

    fn get(&self, name: &str) -> Result<Option<Subscription>> {
        let conn = self.lock()?;

        let result = conn
            .query_row(
                "SELECT name, pending_state, is_hidden FROM subreddit_subscriptions WHERE name = ?1",
                params![name],
                Self::map_row,
            )
            .optional()?;

        Ok(result)
    }

    fn insert(&self, subscription: &Subscription, conflict: ConflictPolicy) -> Result<i64> {
        let row_id = {
            let conn = self.lock()?;
            let sql = match conflict {
                ConflictPolicy::Abort => INSERT_ABORT,
                ConflictPolicy::Replace => INSERT_REPLACE,
            };
            conn.execute(
                sql,
                params![
                    subscription.name,
                    subscription.pending_state.as_str(),
                    subscription.hidden
                ],
            )?;
            conn.last_insert_rowid()
        };

        self.notify();
        Ok(row_id)
    }

    fn update(&self, subscription: &Subscription) -> Result<usize> {
        let updated = self.lock()?.execute(
            "UPDATE subreddit_subscriptions SET pending_state = ?1, is_hidden = ?2 WHERE name = ?3",
            params![
                subscription.pending_state.as_str(),
                subscription.hidden,
                subscription.name
            ],
        )?;

        if updated > 0 {
            self.notify();
        }
        Ok(updated)
    }

    fn delete(&self, name: &str) -> Result<usize> {
        let deleted = self.lock()?.execute(
            "DELETE FROM subreddit_subscriptions WHERE name = ?1",
            params![name],
        )?;

        if deleted > 0 {
            self.notify();
        }
        Ok(deleted)
    }

    fn delete_all(&self) -> Result<usize> {
        let deleted = self
            .lock()?
            .execute("DELETE FROM subreddit_subscriptions", [])?;

        if deleted > 0 {
            self.notify();
        }
        Ok(deleted)
    }

    fn replace_all(&self, subscriptions: &[Subscription]) -> Result<()> {
        let changed = {
            let mut conn = self.lock()?;
            let tx = conn.transaction()?;

            let mut changed = tx.execute("DELETE FROM subreddit_subscriptions", [])?;
            {
                let mut stmt = tx.prepare(INSERT_REPLACE)?;
                for subscription in subscriptions {
                    changed += stmt.execute(params![
                        subscription.name,
                        subscription.pending_state.as_str(),
                        subscription.hidden
                    ])?;
                }
            }

            tx.commit()?;
            changed
        };

        // Readers are only woken once the whole batch is visible.
        if changed > 0 {
            self.notify();
        }
        Ok(())
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

impl PrefsStore for SqliteStore {
    fn get_pref(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock()?;

        let value = conn
            .query_row(
                "SELECT value FROM user_prefs WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn set_pref(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.execute(
            "INSERT INTO user_prefs (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(subs: &[Subscription]) -> Vec<&str> {
        subs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn test_insert_and_get() {
        let store = SqliteStore::in_memory().unwrap();
        let sub = Subscription::new("aww", PendingState::PendingSubscribe, true);
        store.insert(&sub, ConflictPolicy::Abort).unwrap();

        let retrieved = store.get("aww").unwrap().unwrap();
        assert_eq!(retrieved, sub);
        assert!(store.get("pics").unwrap().is_none());
    }

    #[test]
    fn test_insert_abort_rejects_duplicate_name() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(&Subscription::confirmed("aww"), ConflictPolicy::Abort)
            .unwrap();

        let dup = Subscription::new("aww", PendingState::PendingUnsubscribe, false);
        let err = store.insert(&dup, ConflictPolicy::Abort).unwrap_err();
        assert!(matches!(err, SnooError::Database(_)));

        // Original row untouched
        let retrieved = store.get("aww").unwrap().unwrap();
        assert_eq!(retrieved.pending_state, PendingState::None);
    }

    #[test]
    fn test_insert_replace_overwrites() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(
                &Subscription::new("aww", PendingState::PendingSubscribe, true),
                ConflictPolicy::Abort,
            )
            .unwrap();
        store
            .insert(&Subscription::confirmed("aww"), ConflictPolicy::Replace)
            .unwrap();

        let all = store.query(&SubscriptionQuery::all()).unwrap();
        assert_eq!(all, vec![Subscription::confirmed("aww")]);
    }

    #[test]
    fn test_names_are_case_sensitive_keys() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(&Subscription::confirmed("Pics"), ConflictPolicy::Abort)
            .unwrap();
        store
            .insert(&Subscription::confirmed("pics"), ConflictPolicy::Abort)
            .unwrap();
        assert_eq!(store.query(&SubscriptionQuery::all()).unwrap().len(), 2);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let store = SqliteStore::in_memory().unwrap();
        for name in ["AskReddit", "aww", "pics", "AskScience"] {
            store
                .insert(&Subscription::confirmed(name), ConflictPolicy::Abort)
                .unwrap();
        }

        let found = store.query(&SubscriptionQuery::search("ask", true)).unwrap();
        assert_eq!(names(&found), vec!["AskReddit", "AskScience"]);

        let found = store.query(&SubscriptionQuery::search("W", true)).unwrap();
        assert_eq!(names(&found), vec!["aww"]);
    }

    #[test]
    fn test_search_treats_wildcards_literally() {
        let store = SqliteStore::in_memory().unwrap();
        for name in ["rust_gamedev", "rustgamedev"] {
            store
                .insert(&Subscription::confirmed(name), ConflictPolicy::Abort)
                .unwrap();
        }

        let found = store.query(&SubscriptionQuery::search("_", true)).unwrap();
        assert_eq!(names(&found), vec!["rust_gamedev"]);

        let found = store.query(&SubscriptionQuery::search("%", true)).unwrap();
        assert!(found.is_empty());
    }

    #[test]
    fn test_search_excludes_hidden() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(&Subscription::confirmed("aww"), ConflictPolicy::Abort)
            .unwrap();
        store
            .insert(
                &Subscription::new("pics", PendingState::None, true),
                ConflictPolicy::Abort,
            )
            .unwrap();

        let visible = store.query(&SubscriptionQuery::search("", false)).unwrap();
        assert_eq!(names(&visible), vec!["aww"]);

        let all = store.query(&SubscriptionQuery::search("", true)).unwrap();
        assert_eq!(names(&all), vec!["aww", "pics"]);
    }

    #[test]
    fn test_pending_query() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(&Subscription::confirmed("aww"), ConflictPolicy::Abort)
            .unwrap();
        store
            .insert(
                &Subscription::new("pics", PendingState::PendingSubscribe, false),
                ConflictPolicy::Abort,
            )
            .unwrap();
        store
            .insert(
                &Subscription::new("gifs", PendingState::PendingUnsubscribe, true),
                ConflictPolicy::Abort,
            )
            .unwrap();

        let pending = store.query(&SubscriptionQuery::pending()).unwrap();
        assert_eq!(names(&pending), vec!["gifs", "pics"]);
    }

    #[test]
    fn test_update_preserves_key() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(
                &Subscription::new("aww", PendingState::PendingSubscribe, false),
                ConflictPolicy::Abort,
            )
            .unwrap();

        let updated = store
            .update(&Subscription::new("aww", PendingState::PendingSubscribe, true))
            .unwrap();
        assert_eq!(updated, 1);

        let retrieved = store.get("aww").unwrap().unwrap();
        assert!(retrieved.hidden);
        assert_eq!(retrieved.pending_state, PendingState::PendingSubscribe);

        assert_eq!(store.update(&Subscription::confirmed("missing")).unwrap(), 0);
    }

    #[test]
    fn test_delete_and_delete_all() {
        let store = SqliteStore::in_memory().unwrap();
        for name in ["a", "b", "c"] {
            store
                .insert(&Subscription::confirmed(name), ConflictPolicy::Abort)
                .unwrap();
        }

        assert_eq!(store.delete("b").unwrap(), 1);
        assert_eq!(store.delete("b").unwrap(), 0);
        assert_eq!(store.delete_all().unwrap(), 2);
        assert!(store.query(&SubscriptionQuery::all()).unwrap().is_empty());
    }

    #[test]
    fn test_replace_all() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(&Subscription::confirmed("old"), ConflictPolicy::Abort)
            .unwrap();

        let fresh = vec![
            Subscription::confirmed("funny"),
            Subscription::new("pics", PendingState::PendingSubscribe, true),
        ];
        store.replace_all(&fresh).unwrap();

        let all = store.query(&SubscriptionQuery::all()).unwrap();
        assert_eq!(all, fresh);
    }

    #[test]
    fn test_writes_bump_change_version() {
        let store = SqliteStore::in_memory().unwrap();
        let mut rx = store.changes();
        assert!(!rx.has_changed().unwrap());

        store
            .insert(&Subscription::confirmed("aww"), ConflictPolicy::Abort)
            .unwrap();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // No-op writes stay silent
        store.delete("missing").unwrap();
        assert!(!rx.has_changed().unwrap());

        store.replace_all(&[Subscription::confirmed("pics")]).unwrap();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        store.delete_all().unwrap();
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        // Empty over empty changes nothing
        store.replace_all(&[]).unwrap();
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_change_wakes_waiting_receiver() {
        let store = SqliteStore::in_memory().unwrap();
        let mut rx = store.changes();

        store
            .insert(&Subscription::confirmed("aww"), ConflictPolicy::Abort)
            .unwrap();
        tokio_test::block_on(rx.changed()).unwrap();
        assert_eq!(*rx.borrow(), 1);
    }

    #[test]
    fn test_prefs() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.get_pref("default_subreddit").unwrap().is_none());

        store.set_pref("default_subreddit", "aww").unwrap();
        store.set_pref("default_subreddit", "pics").unwrap();
        assert_eq!(
            store.get_pref("default_subreddit").unwrap(),
            Some("pics".to_string())
        );
    }

    #[test]
    fn test_file_backed_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snoosync.db");

        {
            let store = SqliteStore::new(&path).unwrap();
            store
                .insert(
                    &Subscription::new("aww", PendingState::PendingUnsubscribe, false),
                    ConflictPolicy::Abort,
                )
                .unwrap();
        }

        let store = SqliteStore::new(&path).unwrap();
        let retrieved = store.get("aww").unwrap().unwrap();
        assert_eq!(retrieved.pending_state, PendingState::PendingUnsubscribe);
    }
}
