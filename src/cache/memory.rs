//! In-memory local store using moka
//!
//! Keeps slots for the lifetime of the process only. Useful for tests and for
//! deployments where the hosted backend or snapshot is always reachable.

use super::StoreLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::future::Cache;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

/// Upper bound on stored slots; only a handful are ever written
const MAX_SLOTS: u64 = 64;

/// In-memory store; values are kept as JSON strings
pub struct MemoryStore {
    slots: Cache<String, Arc<String>>,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entry_count", &self.slots.entry_count())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            slots: Cache::builder().max_capacity(MAX_SLOTS).build(),
        }
    }
}

#[async_trait]
impl StoreLayer for MemoryStore {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        match self.slots.get(key).await {
            Some(json) => {
                let value = serde_json::from_str(&json).context("Failed to deserialize store value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let json = serde_json::to_string(value).context("Failed to serialize store value")?;
        self.slots.insert(key.to_string(), Arc::new(json)).await;
        Ok(())
    }
}
