//! In-memory [`KvStore`] implementation for testing and embedding.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`. Buckets are cloned in and
//! out, so callers never share state with the store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{BucketMap, KvStore};

/// In-memory store for tests and short-lived sessions.
pub struct InMemoryKvStore {
    buckets: RwLock<BucketMap>,
}

impl InMemoryKvStore {
    pub fn new() -> Self {
        Self {
            buckets: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for InMemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for InMemoryKvStore {
    async fn get(&self, keys: Option<&[String]>) -> Result<BucketMap> {
        let buckets = self
            .buckets
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        let out = match keys {
            None => buckets.clone(),
            Some(keys) => keys
                .iter()
                .filter_map(|k| buckets.get(k).map(|b| (k.clone(), b.clone())))
                .collect(),
        };
        Ok(out)
    }

    async fn set(&self, items: BucketMap) -> Result<()> {
        let mut buckets = self
            .buckets
            .write()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))?;
        buckets.extend(items);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{App, Context, Identity, Note, RawContext};

    fn note(text: &str) -> Note {
        let ctx = Context::from_raw(RawContext {
            app: App::Docs,
            title: "Q3 Plan".to_string(),
            identity: Identity::default(),
        });
        Note::new(text, &ctx).unwrap()
    }

    #[tokio::test]
    async fn test_get_selected_and_all() {
        let store = InMemoryKvStore::new();
        let mut items = BucketMap::new();
        items.insert("docs:a".to_string(), vec![note("one")]);
        items.insert("docs:b".to_string(), vec![note("two")]);
        store.set(items).await.unwrap();

        let some = store
            .get(Some(&["docs:a".to_string(), "docs:missing".to_string()]))
            .await
            .unwrap();
        assert_eq!(some.len(), 1);
        assert!(some.contains_key("docs:a"));

        let all = store.get(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_set_replaces_bucket() {
        let store = InMemoryKvStore::new();
        let mut items = BucketMap::new();
        items.insert("docs:a".to_string(), vec![note("one"), note("two")]);
        store.set(items).await.unwrap();

        let mut items = BucketMap::new();
        items.insert("docs:a".to_string(), Vec::new());
        store.set(items).await.unwrap();

        let all = store.get(None).await.unwrap();
        assert_eq!(all["docs:a"].len(), 0);
    }
}
