//! Redis local store
//!
//! Lets several server instances share the last-known-good data set. Slots
//! are plain string keys holding JSON, written without expiry.

use super::StoreLayer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use serde::{de::DeserializeOwned, Serialize};

/// Redis-backed store
pub struct RedisStore {
    connection: MultiplexedConnection,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Connect to the given Redis URL (e.g. `redis://localhost:6379`)
    ///
    /// # Errors
    /// Returns an error if the connection cannot be established.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).context("Failed to create Redis client")?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")?;

        Ok(Self { connection })
    }
}

#[async_trait]
impl StoreLayer for RedisStore {
    async fn get<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>> {
        let mut conn = self.connection.clone();

        let result: Option<String> = conn
            .get(key)
            .await
            .context("Failed to get value from Redis")?;

        match result {
            Some(json) => {
                let value = serde_json::from_str(&json).context("Failed to deserialize stored value")?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn set<T: Serialize + Send + Sync>(&self, key: &str, value: &T) -> Result<()> {
        let mut conn = self.connection.clone();

        let json = serde_json::to_string(value).context("Failed to serialize store value")?;

        let _: () = conn
            .set(key, json)
            .await
            .context("Failed to set value in Redis")?;

        Ok(())
    }
}
