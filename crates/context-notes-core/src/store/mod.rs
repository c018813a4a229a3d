//! Storage abstraction for Context Notes.
//!
//! The [`KvStore`] trait is the durable boundary: a key-value store whose
//! keys are context keys and whose values are note buckets. The note-level
//! operations (append, delete, related lookup) live in
//! [`NoteStore`](crate::notes::NoteStore) and are built only on `get`/`set`,
//! so any backend that can hold a string → JSON mapping works.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::Note;

/// Ordered notes owned by one context key. Insertion order is chronological.
pub type Bucket = Vec<Note>;

/// Key → bucket mapping returned by [`KvStore::get`].
pub type BucketMap = BTreeMap<String, Bucket>;

/// Abstract key-value storage backend.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](KvStore::get) | Read selected buckets, or every bucket with `None` |
/// | [`set`](KvStore::set) | Write (replace) the given buckets |
///
/// Each call is atomic for the keys it touches. There is no isolation
/// across calls; callers serialize read-modify-write sequences on a key.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read buckets for `keys`, or the whole store when `keys` is `None`.
    ///
    /// Absent keys are omitted from the result.
    async fn get(&self, keys: Option<&[String]>) -> Result<BucketMap>;

    /// Replace the stored bucket for every key in `items`.
    async fn set(&self, items: BucketMap) -> Result<()>;
}
