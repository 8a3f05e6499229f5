// src/store/mod.rs
// =============================================================================
// This module defines where records (comments and posts) live.
//
// The scan driver only knows the RecordStore trait:
// - fetch_page: filtered records, ascending by ID, after a cursor
// - get_meta / set_meta: the "last checked" watermark
// - update_fields: write back rewritten fields
// - flush: make the writes so far durable (the driver calls it once per page)
//
// Implementations:
// - memory::MemoryStore: everything in a Vec (tests, and the engine
//   behind the file store)
// - json::JsonFileStore: a JSON document on disk, saved on flush
// =============================================================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::StoreError;

mod json;
mod memory;

pub use json::JsonFileStore;
#[cfg(test)]
pub use memory::{MemoryStore, RecordSet};

/// Metadata key of the "last checked" watermark.
pub const LAST_CHECKED_KEY: &str = "link_mender_last_checked";

/// Which kind of record a scan covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Comments,
    Posts,
}

impl Collection {
    /// Text fields scanned for links, in the order they are processed.
    pub fn fields(self) -> &'static [&'static str] {
        match self {
            Collection::Comments => &["author_url", "content"],
            Collection::Posts => &["content", "excerpt"],
        }
    }

    /// Only records with this status are scanned.
    pub fn published_status(self) -> &'static str {
        match self {
            Collection::Comments => "approved",
            Collection::Posts => "publish",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Collection::Comments => "Comment",
            Collection::Posts => "Post",
        }
    }
}

/// A comment or a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub status: String,
    /// Parent post of a comment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container: Option<u64>,
    /// Post type ("post", "page", ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub meta: BTreeMap<String, String>,
}

/// Which records a scan visits. Every `Some` narrows the set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub status: String,
    pub ids: Option<BTreeSet<u64>>,
    pub containers: Option<BTreeSet<u64>>,
    pub types: Option<BTreeSet<String>>,
    pub min_id: Option<u64>,
}

impl RecordFilter {
    pub fn matches(&self, record: &Record) -> bool {
        record.status == self.status
            && self.ids.as_ref().map_or(true, |ids| ids.contains(&record.id))
            && self.containers.as_ref().map_or(true, |containers| {
                record.container.is_some_and(|id| containers.contains(&id))
            })
            && self.types.as_ref().map_or(true, |types| {
                record.kind.as_ref().is_some_and(|kind| types.contains(kind))
            })
            && self.min_id.map_or(true, |min| record.id >= min)
    }
}

/// Storage the scan driver reads from and writes to.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Up to `limit` records matching `filter` with an ID greater than
    /// `after`, in ascending ID order.
    async fn fetch_page(
        &self,
        collection: Collection,
        filter: &RecordFilter,
        after: Option<u64>,
        limit: usize,
    ) -> Result<Vec<Record>, StoreError>;

    async fn get_meta(
        &self,
        collection: Collection,
        id: u64,
        key: &str,
    ) -> Result<Option<String>, StoreError>;

    async fn set_meta(
        &mut self,
        collection: Collection,
        id: u64,
        key: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Overwrites the given fields of one record; other fields stay as-is.
    async fn update_fields(
        &mut self,
        collection: Collection,
        id: u64,
        fields: &BTreeMap<String, String>,
    ) -> Result<(), StoreError>;

    /// Makes every write since the last flush durable. If this fails, those
    /// writes are dropped. Stores that write through need not override it.
    async fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}
