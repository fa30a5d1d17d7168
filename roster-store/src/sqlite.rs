// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite persistence for both hierarchies, one table per unit kind.
use sqlx::Sqlite;
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;

/// Apply all migrations from `roster-store/migrations` which did not run yet.
pub async fn run_pending_migrations(pool: &SqlitePool) -> Result<(), SqliteError> {
    sqlx::migrate!().run(pool).await?;
    Ok(())
}

/// Builder for a [`SqliteStore`].
///
/// Opens the database at the given URL, creates it when missing and migrates it to the latest
/// schema. Without an URL an in-memory database is used.
pub struct SqliteStoreBuilder {
    url: String,
    max_connections: u32,
}

impl Default for SqliteStoreBuilder {
    fn default() -> Self {
        Self {
            url: "sqlite::memory:".into(),
            max_connections: 16,
        }
    }
}

impl SqliteStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fresh in-memory database, see <https://github.com/launchbadge/sqlx/issues/2510>.
    ///
    /// In-memory databases sharing a name are shared between connections of the same process,
    /// tests get a random name each to stay isolated from each other.
    #[cfg(any(test, feature = "test_utils"))]
    pub fn random_memory_url(self) -> Self {
        let url = format!(
            "sqlite://roster-{}?mode=memory&cache=private",
            rand::random::<u32>()
        );
        self.database_url(&url)
    }

    pub fn database_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub async fn build(self) -> Result<SqliteStore, SqliteError> {
        if !Sqlite::database_exists(&self.url).await? {
            Sqlite::create_database(&self.url).await?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.url)
            .await?;
        run_pending_migrations(&pool).await?;

        Ok(SqliteStore::new(pool))
    }
}

/// SQLite database holding both organisational hierarchies.
///
/// This struct can be cloned and used in multiple places in the application. Every cloned
/// instance re-uses the same connection pool.
///
/// Reads are executed directly on the pool. Writes which consist of more than one statement (for
/// example deleting a unit and detaching its subordinates) run in their own transaction so they
/// either all occur or none occur.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pub(crate) pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Shortcut building an in-memory SQLite database with a randomised name for testing purposes.
    #[cfg(any(test, feature = "test_utils"))]
    pub async fn temporary() -> Self {
        SqliteStoreBuilder::new()
            .random_memory_url()
            .max_connections(1)
            .build()
            .await
            .expect("migrations succeeded")
    }

    /// Close all connections of the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[derive(Debug, Error)]
pub enum SqliteError {
    /// SQLite database and connection error.
    #[error(transparent)]
    Sqlite(#[from] sqlx::Error),

    /// SQL table schema migration error.
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
}
