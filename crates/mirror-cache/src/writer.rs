//! # Dual-Write Coordinator
//!
//! Sequences the primary store and the cache: the store commits first,
//! then the cache entry is replaced in one atomic batch. The two writes
//! are sequenced, not two-phase-committed; on the lenient paths a cache
//! failure is logged and the primary result stands.

use std::sync::Arc;

use mirror_domain::RecordInput;

use crate::backend::{CacheBackend, WriteBatch};
use crate::codec;
use crate::error::{MirrorError, Result};
use crate::record::MirroredRecord;
use crate::store::PrimaryStore;

/// Coordinator for the delete-then-rewrite cache path.
pub struct DualWriter {
    backend: Arc<dyn CacheBackend>,
    /// When set, cache failures on the create/destroy paths propagate
    /// instead of being swallowed.
    strict: bool,
}

impl DualWriter {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self {
            backend,
            strict: false,
        }
    }

    /// Propagate cache failures from the lenient paths too.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.strict = true;
        self
    }

    #[must_use]
    pub fn backend(&self) -> &Arc<dyn CacheBackend> {
        &self.backend
    }

    /// Replace a persisted record's cache entry atomically.
    ///
    /// One batch: delete the old entry, write the full flat entry,
    /// register the id in the type index set, then the record's custom
    /// ops. Concurrent readers see the entry before or after the batch,
    /// never between steps. The after-write hook runs outside the batch
    /// whatever its outcome; hook failures are logged only.
    pub async fn save<R: MirroredRecord>(&self, record: &R) -> Result<()> {
        let schema = R::schema();
        let id = record.id().ok_or(MirrorError::MissingId {
            type_name: schema.type_name,
        })?;
        let key = schema.entry_key(&id);

        let mut batch = WriteBatch::new();
        batch.del(&key);
        batch.hset(&key, codec::encode(record).into_iter().collect());
        batch.sadd(schema.index_set, &id);
        record.custom_write_ops(&mut batch);

        let result = self.backend.apply(batch).await;

        if let Err(err) = record.after_cache_write(self.backend.as_ref()).await {
            tracing::warn!(
                error = %err,
                type_name = schema.type_name,
                id = %id,
                "after-write hook failed"
            );
        }
        result
    }

    /// Mirror a record that already exists in the primary store.
    /// Recovery-path alias for [`save`](Self::save).
    pub async fn put<R: MirroredRecord>(&self, record: &R) -> Result<R>
    where
        R: Clone,
    {
        self.save(record).await?;
        Ok(record.clone())
    }

    /// Create a record in the primary store, then mirror it.
    ///
    /// A validation failure aborts before any cache mutation and
    /// surfaces the failing field. After a successful create, nested
    /// records are built from the grouped association input and the
    /// record is saved best-effort: a cache failure is logged and the
    /// persisted record still returned, unless this writer is strict.
    pub async fn create<R, S>(&self, store: &S, input: RecordInput) -> Result<R>
    where
        R: MirroredRecord,
        S: PrimaryStore<R>,
    {
        let associations = input.associations.clone();
        let mut record = store.create(input).await?;
        record.create_associations(&associations)?;

        if let Err(err) = self.save(&record).await {
            if self.strict {
                return Err(err);
            }
            tracing::warn!(
                error = %err,
                type_name = R::schema().type_name,
                "cache mirror failed, primary record kept"
            );
        }
        Ok(record)
    }

    /// Destroy a record in the primary store, then drop its cache entry
    /// and index membership in one batch.
    pub async fn destroy<R, S>(&self, store: &S, record: &R) -> Result<()>
    where
        R: MirroredRecord,
        S: PrimaryStore<R>,
    {
        let schema = R::schema();
        let id = record.id().ok_or(MirrorError::MissingId {
            type_name: schema.type_name,
        })?;
        store.destroy(&id).await?;

        let mut batch = WriteBatch::new();
        batch.del(schema.entry_key(&id));
        batch.srem(schema.index_set, &id);

        match self.backend.apply(batch).await {
            Ok(()) => Ok(()),
            Err(err) if !self.strict => {
                tracing::warn!(
                    error = %err,
                    type_name = schema.type_name,
                    id = %id,
                    "cache cleanup failed after destroy"
                );
                Ok(())
            }
            Err(err) => Err(err),
        }
    }
}
