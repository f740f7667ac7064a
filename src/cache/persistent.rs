//! SQLite-backed cache store
//!
//! Lifecycle: `Uninitialized -> Opening -> Ready`, or `Failed` when the open
//! attempt does not succeed. At most one open attempt completes for the life
//! of the backend; an attempt dropped before completing returns the state to
//! `Uninitialized` so the next caller starts afresh. Opening runs the schema check: a store older than
//! [`CACHE_SCHEMA_VERSION`] is dropped and recreated empty, a newer one makes
//! the open fail.

use async_trait::async_trait;
use sea_orm::sea_query::{Alias, OnConflict, Table};
use sea_orm::{
    ActiveValue::Set, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbBackend,
    EntityTrait, Schema, Statement, TransactionTrait,
};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{CacheBackend, CacheListener, entity};
use crate::config::CacheConfig;
use crate::config::defaults::{CACHE_SCHEMA_VERSION, CACHE_STORE_NAME};
use crate::errors::{CacheError, CacheResult};

#[derive(Debug)]
enum OpenState {
    Uninitialized,
    Opening,
    Ready(DatabaseConnection),
    Failed,
}

/// What `open` should do after inspecting the state.
enum OpenAction {
    Start,
    Notify(bool),
    InFlight,
}

/// Resets an abandoned `Opening` state when the open future is dropped.
struct OpeningGuard<'a> {
    backend: &'a PersistentCacheBackend,
}

impl Drop for OpeningGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.backend.lock_state();
        if matches!(*state, OpenState::Opening) {
            debug!("Cache open abandoned before completion");
            *state = OpenState::Uninitialized;
        }
    }
}

pub struct PersistentCacheBackend {
    config: CacheConfig,
    state: Mutex<OpenState>,
}

impl PersistentCacheBackend {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            state: Mutex::new(OpenState::Uninitialized),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, OpenState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn connection(&self) -> Option<DatabaseConnection> {
        match &*self.lock_state() {
            OpenState::Ready(db) => Some(db.clone()),
            _ => None,
        }
    }

    /// Ensure the SQLite URL will create its file, creating parent directories.
    fn prepare_url(url: &str) -> CacheResult<String> {
        if url.contains("mode=") || url.contains(":memory:") {
            return Ok(url.to_string());
        }

        let file_path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("sqlite:"))
            .ok_or_else(|| CacheError::UnsupportedUrl {
                url: url.to_string(),
            })?;
        let file_path = file_path.split('?').next().unwrap_or(file_path);

        let path = std::path::Path::new(file_path);
        if path.exists() {
            return Ok(url.to_string());
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|source| CacheError::DirectoryCreation {
                path: parent.display().to_string(),
                source,
            })?;
            info!("Created directory for cache database: {}", parent.display());
        }

        Ok(if url.contains('?') {
            format!("{url}&mode=rwc")
        } else {
            format!("{url}?mode=rwc")
        })
    }

    async fn connect(&self, url: String) -> CacheResult<DatabaseConnection> {
        let mut options = ConnectOptions::new(url);
        options
            .max_connections(self.config.max_connections.max(1))
            .min_connections(1)
            .connect_timeout(Duration::from_secs(5))
            .acquire_timeout(Duration::from_secs(3))
            .sqlx_logging(false);

        let db = Database::connect(options).await?;
        Self::upgrade(&db).await?;
        Ok(db)
    }

    async fn schema_version(db: &DatabaseConnection) -> CacheResult<i64> {
        let row = db
            .query_one(Statement::from_string(
                DbBackend::Sqlite,
                "PRAGMA user_version",
            ))
            .await?;
        match row {
            Some(row) => Ok(row.try_get::<i64>("", "user_version")?),
            None => Ok(0),
        }
    }

    /// Bring the store to [`CACHE_SCHEMA_VERSION`], dropping older data.
    async fn upgrade(db: &DatabaseConnection) -> CacheResult<()> {
        let version = Self::schema_version(db).await?;
        if version > CACHE_SCHEMA_VERSION {
            return Err(CacheError::IncompatibleVersion {
                found: version,
                expected: CACHE_SCHEMA_VERSION,
            });
        }
        if version == CACHE_SCHEMA_VERSION {
            debug!("Cache store is at schema version {}", version);
            return Ok(());
        }

        info!(
            "Upgrading cache store from version {} to {}, existing entries are dropped",
            version, CACHE_SCHEMA_VERSION
        );
        let backend = db.get_database_backend();
        let txn = db.begin().await?;

        let drop = Table::drop()
            .table(Alias::new(CACHE_STORE_NAME))
            .if_exists()
            .to_owned();
        txn.execute(backend.build(&drop)).await?;

        let create = Schema::new(backend).create_table_from_entity(entity::Entity);
        txn.execute(backend.build(&create)).await?;

        txn.execute_unprepared(&format!("PRAGMA user_version = {CACHE_SCHEMA_VERSION}"))
            .await?;
        txn.commit().await?;
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for PersistentCacheBackend {
    fn is_ready(&self) -> bool {
        matches!(*self.lock_state(), OpenState::Ready(_))
    }

    async fn open(&self, listener: &mut dyn CacheListener) -> bool {
        let action = {
            let mut state = self.lock_state();
            let action = match &*state {
                OpenState::Uninitialized => OpenAction::Start,
                OpenState::Opening => OpenAction::InFlight,
                OpenState::Ready(_) => OpenAction::Notify(true),
                OpenState::Failed => OpenAction::Notify(false),
            };
            if matches!(action, OpenAction::Start) {
                *state = OpenState::Opening;
            }
            action
        };

        match action {
            OpenAction::Notify(success) => {
                listener.on_open(success);
                return true;
            }
            OpenAction::InFlight => {
                debug!("Cache open already in flight, only its initiator is notified");
                return true;
            }
            OpenAction::Start => {}
        }
        let _guard = OpeningGuard { backend: self };

        let url = match Self::prepare_url(&self.config.database_url) {
            Ok(url) => url,
            Err(e) => {
                warn!("Cannot open cache store: {}", e);
                *self.lock_state() = OpenState::Failed;
                return false;
            }
        };

        debug!("Opening cache store at {}", url);
        let success = match self.connect(url).await {
            Ok(db) => {
                *self.lock_state() = OpenState::Ready(db);
                info!("Cache store '{}' ready", CACHE_STORE_NAME);
                true
            }
            Err(e) => {
                *self.lock_state() = OpenState::Failed;
                warn!("Failed to open cache store: {}", e);
                false
            }
        };
        listener.on_open(success);
        true
    }

    async fn put(&self, listener: &mut dyn CacheListener, key: &str, value: &str) {
        let Some(db) = self.connection() else {
            debug_assert!(false, "put before the cache is ready");
            warn!("Ignoring put for '{}': cache not ready", key);
            listener.on_put(false);
            return;
        };

        let model = entity::ActiveModel {
            key: Set(key.to_owned()),
            value: Set(value.to_owned()),
        };
        let result = entity::Entity::insert(model)
            .on_conflict(
                OnConflict::column(entity::Column::Key)
                    .update_column(entity::Column::Value)
                    .to_owned(),
            )
            .exec_without_returning(&db)
            .await;

        match result {
            Ok(_) => {
                debug!("Cached {} bytes for '{}'", value.len(), key);
                listener.on_put(true);
            }
            Err(e) => {
                warn!("Failed to cache '{}': {}", key, e);
                listener.on_put(false);
            }
        }
    }

    async fn get(&self, listener: &mut dyn CacheListener, key: &str) {
        let Some(db) = self.connection() else {
            debug_assert!(false, "get before the cache is ready");
            warn!("Ignoring get for '{}': cache not ready", key);
            listener.on_get(false, String::new());
            return;
        };

        match entity::Entity::find_by_id(key.to_owned()).one(&db).await {
            Ok(Some(record)) if !record.value.is_empty() => {
                debug!("Cache hit for '{}'", key);
                listener.on_get(true, record.value);
            }
            Ok(_) => {
                debug!("Cache miss for '{}'", key);
                listener.on_get(false, String::new());
            }
            Err(e) => {
                warn!("Failed to read '{}' from cache: {}", key, e);
                listener.on_get(false, String::new());
            }
        }
    }
}

impl std::fmt::Debug for PersistentCacheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentCacheBackend")
            .field("database_url", &self.config.database_url)
            .field("ready", &self.is_ready())
            .finish()
    }
}
