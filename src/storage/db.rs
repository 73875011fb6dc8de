use anyhow::{Context, Result};
use log::debug;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Schema};
use std::path::{Path, PathBuf};

use crate::entities::setting;

/// Local storage manager for client-side settings
pub struct LocalStorage {
    pub(crate) conn: DatabaseConnection,
}

impl LocalStorage {
    /// Open (or create) the SQLite database at `path`
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create data directory {}", parent.display()))?;
            }
        }

        let database_url = format!("sqlite://{}?mode=rwc", path.display());
        let storage = Self::connect(database_url).await?;
        debug!("Opened local storage at {}", path.display());
        Ok(storage)
    }

    /// Initialize an in-memory database that lives as long as this value
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:".to_string()).await
    }

    /// Default database location under the user's data directory
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_local_dir().map(|dir| dir.join("fittrack").join("fittrack.db"))
    }

    async fn connect(database_url: String) -> Result<Self> {
        // A single connection keeps an in-memory database alive and serializes writers.
        let mut options = ConnectOptions::new(database_url);
        options.min_connections(1).max_connections(1).sqlx_logging(false);

        let conn = Database::connect(options)
            .await
            .context("Failed to open local storage")?;

        let storage = LocalStorage { conn };
        storage.init_schema().await?;
        Ok(storage)
    }

    /// Initialize database schema
    async fn init_schema(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        let schema = Schema::new(backend);

        let stmt = schema
            .create_table_from_entity(setting::Entity)
            .if_not_exists()
            .to_owned();
        self.conn
            .execute(backend.build(&stmt))
            .await
            .context("Failed to create settings table")?;

        Ok(())
    }
}
