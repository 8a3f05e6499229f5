// src/store/json.rs
// =============================================================================
// A record store backed by one JSON file:
//
//   {
//     "comments": [ { "id": 1, "status": "approved", "container": 10,
//                     "fields": { "author_url": "...", "content": "..." },
//                     "meta": { "link_mender_last_checked": "..." } } ],
//     "posts":    [ { "id": 10, "status": "publish", "type": "post",
//                     "fields": { "content": "...", "excerpt": "..." } } ]
//   }
//
// The whole file is loaded once. Writes change the records in memory and
// are saved by flush() (temp file + rename), which the scan driver calls
// once per page. A crash or Ctrl-C loses at most the page in flight.
// =============================================================================

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use super::memory::{MemoryStore, RecordSet};
use super::{Collection, Record, RecordFilter, RecordStore};
use crate::error::StoreError;

pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
    // Each record written since the last flush, as it was before the first
    // of those writes. Empty means memory and disk agree.
    unsaved: HashMap<(Collection, u64), Record>,
}

impl JsonFileStore {
    /// Loads the store from `path`.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let content = tokio::fs::read_to_string(&path).await?;
        let records: RecordSet = serde_json::from_str(&content)?;

        Ok(Self {
            path,
            inner: MemoryStore::new(records),
            unsaved: HashMap::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn save(&self) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(self.inner.records())?;
        let temp = self.path.with_extension("json.tmp");
        tokio::fs::write(&temp, content).await?;
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(e.into());
        }
        Ok(())
    }

    // Keeps the pre-write copy of a record, once per flush interval
    fn remember(&mut self, collection: Collection, id: u64) -> Result<(), StoreError> {
        let key = (collection, id);
        if !self.unsaved.contains_key(&key) {
            let previous = self
                .inner
                .records()
                .find(collection, id)
                .cloned()
                .ok_or(StoreError::RecordNotFound(id))?;
            self.unsaved.insert(key, previous);
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn fetch_page(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        self.inner.fetch_page(collection, filter, after, limit).await
    }

    async fn get_meta(
        &self,
        collection: Collection,
        id: u64,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        self.inner.get_meta(collection, id, key).await
    }

    async fn set_meta(
        &mut self,
        collection: Collection,
        id: u64,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        self.remember(collection, id)?;
        self.inner.set_meta(collection, id, key, value).await
    }

    async fn update_fields(
        &mut self,
        collection: Collection,
        id: u64,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        self.remember(collection, id)?;
        self.inner.update_fields(collection, id, fields).await
    }

    // Saves, or puts every unsaved record back the way it was so memory
    // and disk never disagree
    async fn flush(&mut self) -> Result<(), StoreError> {
        if self.unsaved.is_empty() {
            return Ok(());
        }

        let result = self.save().await;
        for ((collection, _), previous) in self.unsaved.drain() {
            if result.is_err() {
                self.inner.restore(collection, previous);
            }
        }
        result
    }
}
