//! # Mirrored Record Trait
//!
//! Capabilities a record type must provide to be mirrored. The required
//! methods replace the source system's "raise if not implemented" hooks:
//! a type that compiles is a type that registered every capability the
//! cache layer calls. Hooks that were optional there keep default no-op
//! bodies here.
//!
//! A top-level mirrored type should not declare an association pointing
//! at another mirrored type; leaving it out of the schema keeps the
//! back-reference invisible to the cache and storage acyclic.

use async_trait::async_trait;
use mirror_domain::{AssociationInput, FieldSchema, FlatEntry, SubFieldMap};

use crate::backend::{CacheBackend, WriteBatch};
use crate::error::Result;

/// A record type that can be flattened into, and rebuilt from, a flat
/// cache entry.
#[async_trait]
pub trait MirroredRecord: Default + Send + Sync {
    /// The type's cache schema, declared once.
    fn schema() -> &'static FieldSchema;

    /// Primary-store id; `None` until persisted.
    fn id(&self) -> Option<String>;

    /// Every declared scalar with its current value. `None` values are
    /// unset and never reach the flat entry.
    fn scalar_values(&self) -> Vec<(&'static str, Option<String>)>;

    /// Assign one scalar read back from the flat entry. Unknown names
    /// must be ignored.
    fn set_scalar(&mut self, name: &str, value: &str);

    /// Emit the flat keys for one declared association, typically via
    /// [`codec::encode_nested`](crate::codec::encode_nested) per nested
    /// record.
    fn encode_association(&self, name: &str, entry: &mut FlatEntry);

    /// Rebuild one declared association from decoded sub-field maps.
    /// The type knows which concrete nested type each name maps to.
    fn attach_association(&mut self, name: &str, nested: Vec<SubFieldMap>);

    /// Create nested records in the primary store from grouped
    /// form-style input, after the record itself was created.
    fn create_associations(&mut self, input: &AssociationInput) -> Result<()>;

    /// Reconcile cache state against this (primary-store) record during
    /// a consistency sweep.
    async fn reconcile(&self, backend: &dyn CacheBackend) -> Result<()>;

    /// Extra batch ops for data kept outside the flat hash (reverse
    /// lookup sets and the like). Runs inside the atomic save batch.
    fn custom_write_ops(&self, _batch: &mut WriteBatch) {}

    /// Fetch out-of-band data after reconstruction; may issue extra
    /// cache reads.
    async fn fetch_custom_fields(&mut self, _backend: &dyn CacheBackend) -> Result<()> {
        Ok(())
    }

    /// Post-batch side effects that need a consistent cache state. Runs
    /// outside the atomic batch; failures are logged, never propagated.
    async fn after_cache_write(&self, _backend: &dyn CacheBackend) -> Result<()> {
        Ok(())
    }
}
