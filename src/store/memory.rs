// src/store/memory.rs
// In-memory record storage. Also the engine behind JsonFileStore.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Collection, Record, RecordFilter, RecordStore};
use crate::error::StoreError;

/// All records, grouped by collection. This is also the on-disk JSON shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    #[serde(default)]
    pub comments: Vec<Record>,
    #[serde(default)]
    pub posts: Vec<Record>,
}

impl RecordSet {
    pub fn records(&self, collection: Collection) -> &[Record] {
        match collection {
            Collection::Comments => &self.comments,
            Collection::Posts => &self.posts,
        }
    }

    fn records_mut(&mut self, collection: Collection) -> &mut Vec<Record> {
        match collection {
            Collection::Comments => &mut self.comments,
            Collection::Posts => &mut self.posts,
        }
    }

    pub fn find(&self, collection: Collection, id: u64) -> Option<&Record> {
        self.records(collection).iter().find(|r| r.id == id)
    }

    fn find_mut(&mut self, collection: Collection, id: u64) -> Result<&mut Record, StoreError> {
        self.records_mut(collection)
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::RecordNotFound(id))
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RecordSet,
}

impl MemoryStore {
    pub fn new(records: RecordSet) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &RecordSet {
        &self.records
    }

    // Puts a previously cloned record back (used to undo a failed save)
    pub(super) fn restore(&mut self, collection: Collection, record: Record) {
        if let Ok(slot) = self.records.find_mut(collection, record.id) {
            *slot = record;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_page(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError> {
        let mut matching: Vec<&Record> = self
            .records
            .records(collection)
            .iter()
            .filter(|r| after.map_or(true, |cursor| r.id > cursor) && filter.matches(r))
            .collect();
        matching.sort_by_key(|r| r.id);

        Ok(matching.into_iter().take(limit).cloned().collect())
    }

    async fn get_meta(
        &self,
        collection: Collection,
        id: u64,
        key: &str,
    ) -> Result<Option<String>, StoreError> {
        let record = self
            .records
            .find(collection, id)
            .ok_or(StoreError::RecordNotFound(id))?;
        Ok(record.meta.get(key).cloned())
    }

    async fn set_meta(
        &mut self,
        collection: Collection,
        id: u64,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError> {
        let record = self.records.find_mut(collection, id)?;
        record.meta.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn update_fields(
        &mut self,
        collection: Collection,
        id: u64,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), StoreError> {
        let record = self.records.find_mut(collection, id)?;
        for (name, value) in fields {
            record.fields.insert(name.clone(), value.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: u64, status: &str) -> Record {
        Record {
            id,
            status: status.to_string(),
            container: None,
            kind: Some("post".to_string()),
            fields: BTreeMap::from([("content".to_string(), format!("post {id}"))]),
            meta: BTreeMap::new(),
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(RecordSet {
            comments: Vec::new(),
            posts: vec![post(5, "publish"), post(1, "publish"), post(3, "draft"), post(9, "publish")],
        })
    }

    fn published() -> RecordFilter {
        RecordFilter {
            status: "publish".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pages_are_sorted_and_keyed_by_cursor() {
        let store = store();

        let first = store.fetch_page(Collection::Posts, &published(), None, 2).await.unwrap();
        let ids: Vec<u64> = first.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 5]);

        let second = store.fetch_page(Collection::Posts, &published(), Some(5), 2).await.unwrap();
        let ids: Vec<u64> = second.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![9]);

        let third = store.fetch_page(Collection::Posts, &published(), Some(9), 2).await.unwrap();
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn test_update_fields_is_partial() {
        let mut store = store();
        let mut fields = BTreeMap::new();
        fields.insert("excerpt".to_string(), "new excerpt".to_string());

        store.update_fields(Collection::Posts, 1, &fields).await.unwrap();

        let record = store.records().find(Collection::Posts, 1).unwrap();
        assert_eq!(record.fields["content"], "post 1");
        assert_eq!(record.fields["excerpt"], "new excerpt");
    }

    #[tokio::test]
    async fn test_meta_round_trip_and_missing_record() {
        let mut store = store();
        assert_eq!(store.get_meta(Collection::Posts, 1, "k").await.unwrap(), None);

        store.set_meta(Collection::Posts, 1, "k", "v").await.unwrap();
        assert_eq!(
            store.get_meta(Collection::Posts, 1, "k").await.unwrap().as_deref(),
            Some("v")
        );

        let missing = store.set_meta(Collection::Posts, 42, "k", "v").await;
        assert!(matches!(missing, Err(StoreError::RecordNotFound(42))));
    }
}
