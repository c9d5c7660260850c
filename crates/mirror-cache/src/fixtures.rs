//! Shared test fixtures: a `Battle` record with a plural `videos`
//! association, votes kept in a separately keyed set, and an in-memory
//! primary store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use mirror_domain::{
    AssociationInput, AssociationSchema, DomainError, FieldSchema, FlatEntry, Plurality,
    RecordInput, SubFieldMap,
};

use crate::backend::{CacheBackend, WriteBatch};
use crate::codec;
use crate::error::{MirrorError, Result};
use crate::record::MirroredRecord;
use crate::store::PrimaryStore;

static BATTLE_SCHEMA: FieldSchema = FieldSchema {
    type_name: "battle",
    index_set: "battles",
    scalars: &["id", "title"],
    associations: &[AssociationSchema {
        name: "videos",
        singular: "video",
        plurality: Plurality::Plural,
        key_subfield: "id",
    }],
    custom: &["vote_ids"],
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Video {
    pub id: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Battle {
    pub id: Option<String>,
    pub title: Option<String>,
    pub videos: Vec<Video>,
    /// Stored in the `battle:<id>:votes` set, not in the flat hash.
    pub vote_ids: Vec<String>,
}

fn votes_key(id: &str) -> String {
    format!("battle:{id}:votes")
}

#[async_trait]
impl MirroredRecord for Battle {
    fn schema() -> &'static FieldSchema {
        &BATTLE_SCHEMA
    }

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn scalar_values(&self) -> Vec<(&'static str, Option<String>)> {
        vec![("id", self.id.clone()), ("title", self.title.clone())]
    }

    fn set_scalar(&mut self, name: &str, value: &str) {
        match name {
            "id" => self.id = Some(value.to_string()),
            "title" => self.title = Some(value.to_string()),
            _ => {}
        }
    }

    fn encode_association(&self, name: &str, entry: &mut FlatEntry) {
        if name == "videos" {
            for (i, video) in self.videos.iter().enumerate() {
                codec::encode_nested(
                    entry,
                    "video",
                    i,
                    vec![("id", video.id.clone()), ("url", video.url.clone())],
                );
            }
        }
    }

    fn attach_association(&mut self, name: &str, nested: Vec<SubFieldMap>) {
        if name == "videos" {
            self.videos = nested
                .into_iter()
                .map(|fields| Video {
                    id: fields.get("id").cloned(),
                    url: fields.get("url").cloned(),
                })
                .collect();
        }
    }

    fn create_associations(&mut self, input: &AssociationInput) -> Result<()> {
        if let Some(groups) = input.get("videos") {
            for (i, fields) in groups.iter().enumerate() {
                self.videos.push(Video {
                    id: Some((i + 1).to_string()),
                    url: fields.get("url").cloned(),
                });
            }
        }
        Ok(())
    }

    fn custom_write_ops(&self, batch: &mut WriteBatch) {
        if let Some(id) = &self.id {
            for vote in &self.vote_ids {
                batch.sadd(votes_key(id), vote);
            }
        }
    }

    async fn fetch_custom_fields(&mut self, backend: &dyn CacheBackend) -> Result<()> {
        if let Some(id) = &self.id {
            self.vote_ids = backend.set_members(&votes_key(id)).await?;
        }
        Ok(())
    }

    async fn reconcile(&self, backend: &dyn CacheBackend) -> Result<()> {
        let id = self.id.clone().ok_or(MirrorError::MissingId {
            type_name: "battle",
        })?;
        let key = Self::schema().entry_key(&id);
        let expected = codec::encode(self);
        if backend.hash(&key).await? == expected {
            return Ok(());
        }
        let mut batch = WriteBatch::new();
        batch.del(&key);
        batch.hset(&key, expected.into_iter().collect());
        batch.sadd(Self::schema().index_set, &id);
        self.custom_write_ops(&mut batch);
        backend.apply(batch).await
    }
}

/// Creation input for a battle with two nested videos.
pub fn battle_input(title: &str) -> RecordInput {
    let mut input = RecordInput::default();
    input.fields.insert("title".to_string(), title.to_string());
    input.associations.insert(
        "videos".to_string(),
        vec![
            SubFieldMap::from([("url".to_string(), "a".to_string())]),
            SubFieldMap::from([("url".to_string(), "b".to_string())]),
        ],
    );
    input
}

/// In-memory primary store standing in for the authoritative database.
pub struct MemoryStore {
    records: Mutex<Vec<Battle>>,
    next_id: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Change a stored title directly, drifting primary away from cache.
    pub async fn rename(&self, id: &str, title: &str) {
        let mut records = self.records.lock().await;
        if let Some(battle) = records.iter_mut().find(|b| b.id.as_deref() == Some(id)) {
            battle.title = Some(title.to_string());
        }
    }
}

#[async_trait]
impl PrimaryStore<Battle> for MemoryStore {
    async fn create(&self, input: RecordInput) -> std::result::Result<Battle, DomainError> {
        let title = input
            .fields
            .get("title")
            .filter(|t| !t.is_empty())
            .cloned()
            .ok_or_else(|| DomainError::Validation {
                type_name: "battle".to_string(),
                field: "title".to_string(),
                message: "must not be blank".to_string(),
            })?;
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let battle = Battle {
            id: Some(id.to_string()),
            title: Some(title),
            videos: Vec::new(),
            vote_ids: Vec::new(),
        };
        self.records.lock().await.push(battle.clone());
        Ok(battle)
    }

    async fn all(&self) -> std::result::Result<Vec<Battle>, DomainError> {
        Ok(self.records.lock().await.clone())
    }

    async fn destroy(&self, id: &str) -> std::result::Result<(), DomainError> {
        let mut records = self.records.lock().await;
        let before = records.len();
        records.retain(|b| b.id.as_deref() != Some(id));
        if records.len() == before {
            return Err(DomainError::NotFound {
                type_name: "battle".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }
}
