//! Pooled SQLite connection

use crate::config::Settings;
use di::{Ref, inject, injectable};
use log::{debug, error};
use sqlx::SqlitePool;
use sqlx::migrate::MigrateError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::ops::{Deref, DerefMut};
use std::sync::RwLock;

static TEST_POOL: RwLock<Option<SqlitePool>> = RwLock::new(None);

pub struct DatabaseConnection {
    connection: SqlitePool,
}

#[injectable]
impl DatabaseConnection {
    #[inject]
    pub fn create(settings: Ref<Settings>) -> DatabaseConnection {
        if let Some(pool) = Self::test_pool() {
            debug!("using the injected test pool");
            return DatabaseConnection { connection: pool };
        }

        // An unparseable URL is taken as the name of an existing file, so
        // queries fail. `main` refuses to start on such a URL.
        let options = settings.database_options().unwrap_or_else(|e| {
            error!("invalid DATABASE_URL {:?}: {e}", settings.database_url);
            SqliteConnectOptions::new()
                .filename(&settings.database_url)
                .create_if_missing(false)
        });

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_lazy_with(options);

        DatabaseConnection { connection: pool }
    }
}

impl DatabaseConnection {
    /// Wraps an existing pool.
    pub fn from_pool(connection: SqlitePool) -> DatabaseConnection {
        DatabaseConnection { connection }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<(), MigrateError> {
        sqlx::migrate!().run(&self.connection).await
    }

    /// Makes every DI-created connection use `pool` until
    /// [`DatabaseConnection::clear_test_pool`] is called.
    #[doc(hidden)]
    pub fn set_test_pool(pool: SqlitePool) {
        if let Ok(mut slot) = TEST_POOL.write() {
            *slot = Some(pool);
        }
    }

    #[doc(hidden)]
    pub fn clear_test_pool() {
        if let Ok(mut slot) = TEST_POOL.write() {
            *slot = None;
        }
    }

    fn test_pool() -> Option<SqlitePool> {
        TEST_POOL.read().ok().and_then(|slot| slot.clone())
    }
}

impl Deref for DatabaseConnection {
    type Target = SqlitePool;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl DerefMut for DatabaseConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}
