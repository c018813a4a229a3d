//! Note association store: context-keyed buckets and related-note lookup.
//!
//! Every operation is a read-modify-write over a [`KvStore`]. Nothing is
//! cached here, so a failed write can never leave a stale view behind; the
//! error is returned and the stored bucket is unchanged.

use anyhow::{bail, Result};
use serde::Serialize;
use tracing::debug;

use crate::models::{split_key, Context, Note};
use crate::similarity::titles_related;
use crate::store::{Bucket, BucketMap, KvStore};

/// Global cap on related notes returned by [`NoteStore::find_related`].
pub const DEFAULT_RELATED_LIMIT: usize = 5;

/// A note surfaced from a related context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelatedNote {
    /// Key of the bucket the note lives in.
    pub origin_key: String,
    pub note: Note,
}

/// One note of the flattened store, for the aggregation view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NoteEntry {
    pub key: String,
    /// App tag parsed from the key prefix.
    pub app: String,
    /// Key remainder after the app tag.
    pub title: String,
    /// Position within the bucket, valid until the bucket is next mutated.
    pub index: usize,
    pub note: Note,
}

/// Note buckets keyed by context key.
pub struct NoteStore<S> {
    kv: S,
    related_limit: usize,
}

impl<S: KvStore> NoteStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            related_limit: DEFAULT_RELATED_LIMIT,
        }
    }

    /// Override the related-note cap (minimum 1).
    pub fn with_related_limit(mut self, limit: usize) -> Self {
        self.related_limit = limit.max(1);
        self
    }

    /// The underlying key-value backend.
    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Append `note` to the bucket for `key`, creating it if absent.
    ///
    /// Returns the updated bucket. The note is stored exactly as given.
    pub async fn append(&self, key: &str, note: Note) -> Result<Bucket> {
        Self::check(key, &note)?;
        let bucket = self.list(key).await?;
        self.push(key, bucket, note).await
    }

    /// Build a note for `context` from the wall clock and append it under
    /// the context key.
    ///
    /// A clock reading earlier than the bucket's last note is raised to it,
    /// so buckets filled through here stay chronological.
    pub async fn add_note(&self, context: &Context, text: &str) -> Result<Bucket> {
        let mut note = Note::new(text, context)?;
        Self::check(&context.key, &note)?;
        let bucket = self.list(&context.key).await?;
        if let Some(last) = bucket.last() {
            if note.timestamp < last.timestamp {
                note.timestamp = last.timestamp;
            }
        }
        self.push(&context.key, bucket, note).await
    }

    fn check(key: &str, note: &Note) -> Result<()> {
        if key.is_empty() {
            bail!("context key must not be empty");
        }
        if note.context.is_loading {
            bail!("cannot store a note for a loading context");
        }
        Ok(())
    }

    async fn push(&self, key: &str, mut bucket: Bucket, note: Note) -> Result<Bucket> {
        bucket.push(note);
        self.write(key, bucket.clone()).await?;
        debug!(key, len = bucket.len(), "appended note");
        Ok(bucket)
    }

    /// Remove the note at `index`. Out-of-range indices are a no-op and
    /// return `None` without writing.
    pub async fn delete_at(&self, key: &str, index: usize) -> Result<Option<Note>> {
        let mut bucket = self.list(key).await?;
        if index >= bucket.len() {
            debug!(key, index, len = bucket.len(), "delete index out of range");
            return Ok(None);
        }
        let removed = bucket.remove(index);
        self.write(key, bucket).await?;
        Ok(Some(removed))
    }

    /// The bucket for `key`, empty when none exists.
    pub async fn list(&self, key: &str) -> Result<Bucket> {
        let mut found = self.kv.get(Some(&[key.to_string()])).await?;
        Ok(found.remove(key).unwrap_or_default())
    }

    /// Notes from other buckets whose key title shares a significant word
    /// with `current_title`, newest first, capped globally.
    pub async fn find_related(&self, current_key: &str, current_title: &str) -> Result<Vec<RelatedNote>> {
        let all = self.kv.get(None).await?;
        let mut related: Vec<RelatedNote> = all
            .into_iter()
            .filter(|(key, _)| key != current_key)
            .filter(|(key, _)| titles_related(split_key(key).1, current_title))
            .flat_map(|(key, bucket)| {
                bucket.into_iter().map(move |note| RelatedNote {
                    origin_key: key.clone(),
                    note,
                })
            })
            .collect();
        related.sort_by(|a, b| b.note.timestamp.cmp(&a.note.timestamp));
        related.truncate(self.related_limit);
        Ok(related)
    }

    /// Every note in the store, annotated with app and title from its key.
    pub async fn list_all(&self) -> Result<Vec<NoteEntry>> {
        let all = self.kv.get(None).await?;
        let entries = all
            .into_iter()
            .flat_map(|(key, bucket)| {
                let (app, title) = split_key(&key);
                let (app, title) = (app.to_string(), title.to_string());
                bucket
                    .into_iter()
                    .enumerate()
                    .map(move |(index, note)| NoteEntry {
                        key: key.clone(),
                        app: app.clone(),
                        title: title.clone(),
                        index,
                        note,
                    })
                    .collect::<Vec<_>>()
            })
            .collect();
        Ok(entries)
    }

    /// The full key → bucket mapping.
    pub async fn snapshot(&self) -> Result<BucketMap> {
        self.kv.get(None).await
    }

    async fn write(&self, key: &str, bucket: Bucket) -> Result<()> {
        let mut items = BucketMap::new();
        items.insert(key.to_string(), bucket);
        self.kv.set(items).await
    }
}
