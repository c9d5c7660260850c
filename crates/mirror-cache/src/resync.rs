//! # Resync & Recovery Driver
//!
//! Full sweeps over the primary store: either push every record into
//! the cache (disaster recovery after cache data loss) or run each
//! record's reconcile hook (scheduled consistency sweep). Neither sweep
//! is transactional across records; both are idempotent and safe to
//! re-run from the start, and a per-record failure is logged while the
//! sweep continues.

use crate::error::Result;
use crate::record::MirroredRecord;
use crate::store::PrimaryStore;
use crate::writer::DualWriter;

/// Driver for store-wide cache repair.
pub struct ResyncDriver {
    writer: DualWriter,
}

impl ResyncDriver {
    #[must_use]
    pub const fn new(writer: DualWriter) -> Self {
        Self { writer }
    }

    /// Re-mirror every primary-store record. Returns how many records
    /// were pushed.
    pub async fn rebuild_all<R, S>(&self, store: &S) -> Result<usize>
    where
        R: MirroredRecord,
        S: PrimaryStore<R>,
    {
        let records = store.all().await?;
        let mut pushed = 0;
        for record in &records {
            match self.writer.save(record).await {
                Ok(()) => pushed += 1,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        type_name = R::schema().type_name,
                        "rebuild skipped record"
                    );
                }
            }
        }
        tracing::info!(
            type_name = R::schema().type_name,
            pushed,
            total = records.len(),
            "cache rebuild sweep finished"
        );
        Ok(pushed)
    }

    /// Run every record's reconcile hook against current cache state.
    /// Returns how many records reconciled cleanly.
    pub async fn sync_all<R, S>(&self, store: &S) -> Result<usize>
    where
        R: MirroredRecord,
        S: PrimaryStore<R>,
    {
        let records = store.all().await?;
        let mut synced = 0;
        for record in &records {
            match record.reconcile(self.writer.backend().as_ref()).await {
                Ok(()) => synced += 1,
                Err(err) => {
                    tracing::warn!(
                        error = %err,
                        type_name = R::schema().type_name,
                        "reconcile failed for record"
                    );
                }
            }
        }
        tracing::info!(
            type_name = R::schema().type_name,
            synced,
            total = records.len(),
            "consistency sweep finished"
        );
        Ok(synced)
    }
}
