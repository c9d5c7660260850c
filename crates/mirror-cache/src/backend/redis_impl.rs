//! Redis-backed [`CacheBackend`] implementation.
//!
//! Reads and writes go through the [`ConnectionManager`]; a
//! [`WriteBatch`] executes as one MULTI/EXEC pipeline.

use async_trait::async_trait;
use redis::AsyncCommands;

use mirror_domain::FlatEntry;

use super::{BatchOp, CacheBackend, WriteBatch};
use crate::config::CacheConfig;
use crate::connection::ConnectionManager;
use crate::error::Result;

/// Cache backend speaking to a Redis server.
pub struct RedisBackend {
    manager: ConnectionManager,
}

impl RedisBackend {
    /// Build a backend with its own connection manager.
    pub fn new(config: &CacheConfig) -> Result<Self> {
        Ok(Self {
            manager: ConnectionManager::new(config)?,
        })
    }

    /// Build a backend over an existing manager.
    #[must_use]
    pub fn with_manager(manager: ConnectionManager) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    async fn hash(&self, key: &str) -> Result<FlatEntry> {
        let mut conn = self.manager.handle().await?;
        let entry: FlatEntry = conn.hgetall(key).await?;
        Ok(entry)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>> {
        let mut conn = self.manager.handle().await?;
        let members: Vec<String> = conn.smembers(key).await?;
        Ok(members)
    }

    async fn string(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.manager.handle().await?;
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn apply(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let mut pipe = redis::pipe();
        pipe.atomic();
        for op in batch.ops() {
            match op {
                BatchOp::Del(key) => {
                    pipe.del(key).ignore();
                }
                BatchOp::HSet(key, fields) => {
                    // HSET rejects an empty field list
                    if !fields.is_empty() {
                        pipe.hset_multiple(key, fields).ignore();
                    }
                }
                BatchOp::Set(key, value) => {
                    pipe.set(key, value).ignore();
                }
                BatchOp::SAdd(key, member) => {
                    pipe.sadd(key, member).ignore();
                }
                BatchOp::SRem(key, member) => {
                    pipe.srem(key, member).ignore();
                }
            }
        }

        let mut conn = self.manager.handle().await?;
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }
}
