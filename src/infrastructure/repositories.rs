//! DB Repository abstractions

use crate::error::StoreError;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::entities::KeyValue;
use crate::infrastructure::traits::KeyValueRepository;
use async_trait::async_trait;
use chrono::Utc;
use di::{Ref, injectable};
use log::debug;
use uuid::Uuid;

const UPSERT: &str = "INSERT INTO key_values (owner, key, value, updated_at) VALUES (?, ?, ?, ?) ON CONFLICT (owner, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at";

#[injectable(KeyValueRepository)]
pub struct DbKeyValueRepository {
    connection: Ref<DatabaseConnection>,
}

impl DbKeyValueRepository {
    pub fn new(connection: Ref<DatabaseConnection>) -> Self {
        DbKeyValueRepository { connection }
    }
}

#[async_trait]
impl KeyValueRepository for DbKeyValueRepository {
    async fn get(&self, owner: Uuid, key: &str) -> Result<Option<KeyValue>, StoreError> {
        let row = sqlx::query_as(
            "SELECT owner, key, value, updated_at FROM key_values WHERE owner = ? AND key = ?",
        )
        .bind(owner)
        .bind(key)
        .fetch_optional(&**self.connection)
        .await?;

        Ok(row)
    }

    async fn set(&self, owner: Uuid, key: &str, value: String) -> Result<(), StoreError> {
        debug!("writing {} bytes to {owner}/{key}", value.len());

        sqlx::query(UPSERT)
            .bind(owner)
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .execute(&**self.connection)
            .await?;

        Ok(())
    }

    async fn remove(&self, owner: Uuid, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM key_values WHERE owner = ? AND key = ?")
            .bind(owner)
            .bind(key)
            .execute(&**self.connection)
            .await?;

        Ok(())
    }

    async fn update(
        &self,
        owner: Uuid,
        key: &str,
        apply: &(dyn for<'v> Fn(Option<&'v str>) -> Result<String, StoreError> + Send + Sync),
    ) -> Result<String, StoreError> {
        // IMMEDIATE takes the write lock up front, so two updates cannot both
        // read the old value.
        let mut tx = self.connection.begin_with("BEGIN IMMEDIATE").await?;

        let current: Option<(String,)> =
            sqlx::query_as("SELECT value FROM key_values WHERE owner = ? AND key = ?")
                .bind(owner)
                .bind(key)
                .fetch_optional(&mut *tx)
                .await?;

        let value = apply(current.as_ref().map(|(value,)| value.as_str()))?;
        debug!("updating {owner}/{key} to {} bytes", value.len());

        sqlx::query(UPSERT)
            .bind(owner)
            .bind(key)
            .bind(&value)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(value)
    }
}
