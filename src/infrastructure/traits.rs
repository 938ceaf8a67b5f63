//! Infrastructure traits, used for DI on higher levels

use crate::error::StoreError;
use crate::infrastructure::entities;
use async_trait::async_trait;
use uuid::Uuid;

/// Per-student string key-value store.
#[async_trait]
pub trait KeyValueRepository: Send + Sync {
    /// Returns `Ok(None)` when the key was never written or has been removed.
    async fn get(&self, owner: Uuid, key: &str) -> Result<Option<entities::KeyValue>, StoreError>;

    /// Inserts or overwrites the value under `key`.
    async fn set(&self, owner: Uuid, key: &str, value: String) -> Result<(), StoreError>;

    async fn remove(&self, owner: Uuid, key: &str) -> Result<(), StoreError>;

    /// Reads the value under `key`, passes it to `apply` and stores the
    /// result, with no other write to the store in between. Nothing is
    /// written if `apply` fails. Returns the stored value.
    async fn update(
        &self,
        owner: Uuid,
        key: &str,
        apply: &(dyn for<'v> Fn(Option<&'v str>) -> Result<String, StoreError> + Send + Sync),
    ) -> Result<String, StoreError>;
}
