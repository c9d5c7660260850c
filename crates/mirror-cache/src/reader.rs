//! # Reader
//!
//! Reconstructs records from their flat cache entries. This path is
//! read-only: a record built here is re-saved through the writer, never
//! written back directly.

use std::sync::Arc;

use mirror_domain::FieldKind;

use crate::backend::CacheBackend;
use crate::codec;
use crate::error::Result;
use crate::record::MirroredRecord;

/// Cache-side record reader.
pub struct Reader {
    backend: Arc<dyn CacheBackend>,
}

impl Reader {
    #[must_use]
    pub fn new(backend: Arc<dyn CacheBackend>) -> Self {
        Self { backend }
    }

    /// Rebuild one record from its flat entry.
    ///
    /// An entry without an `id` key is a cache miss, not an error.
    /// Scalars are assigned directly, each declared association is
    /// decoded and attached, then the extraneous-fetch hook pulls any
    /// out-of-band data.
    pub async fn find_by_id<R: MirroredRecord>(&self, id: &str) -> Result<Option<R>> {
        let schema = R::schema();
        let entry = self.backend.hash(&schema.entry_key(id)).await?;
        if !entry.contains_key("id") {
            tracing::debug!(type_name = schema.type_name, id, "cache miss");
            return Ok(None);
        }

        let mut record = R::default();
        for (key, value) in &entry {
            match schema.classify(key) {
                FieldKind::Scalar => record.set_scalar(key, value),
                FieldKind::Association { .. } | FieldKind::Custom => {}
                FieldKind::Unknown => {
                    tracing::debug!(
                        type_name = schema.type_name,
                        key,
                        "skipping undeclared cache field"
                    );
                }
            }
        }
        for assoc in schema.associations {
            let nested = codec::decode_association(&entry, schema, assoc.name);
            record.attach_association(assoc.name, nested);
        }
        record.fetch_custom_fields(self.backend.as_ref()).await?;
        Ok(Some(record))
    }

    /// Rebuild every record registered in the type index set.
    ///
    /// Ids that no longer resolve to an entry are skipped; a stale index
    /// member is tolerated, not treated as corruption.
    pub async fn find_all<R: MirroredRecord>(&self) -> Result<Vec<R>> {
        let schema = R::schema();
        let ids = self.backend.set_members(schema.index_set).await?;
        let mut records = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find_by_id::<R>(&id).await? {
                Some(record) => records.push(record),
                None => {
                    tracing::debug!(
                        type_name = schema.type_name,
                        id = %id,
                        "stale index entry, skipping"
                    );
                }
            }
        }
        Ok(records)
    }
}
