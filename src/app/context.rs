use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{Result, SnooError};
use crate::config::Config;
use crate::remote::{RedditClient, RemoteService};
use crate::store::sqlite::SqliteStore;
use crate::sync::{SubscriptionManager, SyncSettings};

pub struct AppContext {
    pub config: Config,
    pub store: Arc<SqliteStore>,
    pub remote: Arc<dyn RemoteService + Send + Sync>,
    pub manager: SubscriptionManager<SqliteStore>,
}

impl AppContext {
    pub fn new(db_path: Option<PathBuf>, config: Config) -> Result<Self> {
        let db_path = match db_path {
            Some(p) => p,
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        Self::with_store(store, config)
    }

    pub fn in_memory(config: Config) -> Result<Self> {
        Self::with_store(Arc::new(SqliteStore::in_memory()?), config)
    }

    fn with_store(store: Arc<SqliteStore>, config: Config) -> Result<Self> {
        let remote: Arc<dyn RemoteService + Send + Sync> =
            Arc::new(RedditClient::new(&config.reddit)?);
        let manager = SubscriptionManager::new(
            store.clone(),
            remote.clone(),
            SyncSettings::from_config(&config),
        );

        Ok(Self {
            config,
            store,
            remote,
            manager,
        })
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| SnooError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("snoosync");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("snoosync.db"))
    }
}
