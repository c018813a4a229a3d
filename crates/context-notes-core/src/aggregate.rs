//! Cross-context note listing: filter, sort, and summary counts.
//!
//! A pure function over [`NoteStore::list_all`](crate::notes::NoteStore::list_all)
//! output. Nothing is persisted; the view is recomputed on every call.

use std::collections::BTreeSet;
use std::str::FromStr;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::models::App;
use crate::notes::NoteEntry;

/// Which notes to include.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppFilter {
    #[default]
    All,
    Only(App),
}

impl FromStr for AppFilter {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "all" | "" => Ok(AppFilter::All),
            other => Ok(AppFilter::Only(other.parse()?)),
        }
    }
}

/// Timestamp ordering of the listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl FromStr for SortOrder {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "newest" => Ok(SortOrder::Newest),
            "oldest" => Ok(SortOrder::Oldest),
            other => bail!("Unknown sort order: '{}'. Use newest or oldest.", other),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AggregateQuery {
    pub filter: AppFilter,
    pub order: SortOrder,
}

/// The computed listing plus counts over the filtered set.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateView {
    pub entries: Vec<NoteEntry>,
    pub total: usize,
    pub app_count: usize,
}

/// Filter and sort `entries`.
///
/// Sorting is stable, so notes with equal timestamps keep their store order
/// (bucket order is append order).
pub fn aggregate(entries: Vec<NoteEntry>, query: &AggregateQuery) -> AggregateView {
    let mut entries: Vec<NoteEntry> = match query.filter {
        AppFilter::All => entries,
        AppFilter::Only(app) => entries.into_iter().filter(|e| e.app == app.as_str()).collect(),
    };
    match query.order {
        SortOrder::Oldest => entries.sort_by(|a, b| a.note.timestamp.cmp(&b.note.timestamp)),
        SortOrder::Newest => entries.sort_by(|a, b| b.note.timestamp.cmp(&a.note.timestamp)),
    }
    let app_count = entries.iter().map(|e| e.app.as_str()).collect::<BTreeSet<_>>().len();
    AggregateView {
        total: entries.len(),
        app_count,
        entries,
    }
}
