//! Note commands: add, list, delete, related, and the cross-context view.
//!
//! Each `run_*` function opens the configured store, performs one
//! operation, prints a human-readable result, and closes the pool.

use anyhow::{bail, Result};
use std::path::Path;

use context_notes_core::aggregate::{aggregate, AggregateQuery, AppFilter, SortOrder};
use context_notes_core::models::{split_key, App, Context, Identity};
use context_notes_core::notes::NoteStore;

use crate::config::Config;
use crate::resolve;
use crate::sqlite_store::SqliteKvStore;

/// Open the SQLite-backed note store with the configured related-note cap.
pub async fn open_store(config: &Config) -> Result<NoteStore<SqliteKvStore>> {
    let kv = SqliteKvStore::open(config).await?;
    Ok(NoteStore::new(kv).with_related_limit(config.related.limit))
}

/// Build a context for an explicit `app:title` key.
pub fn context_for_key(key: &str) -> Result<Context> {
    let (app, title) = split_key(key);
    if app.is_empty() {
        bail!("Invalid key '{}': expected <app>:<title>", key);
    }
    let app: App = app.parse()?;
    if title.trim().is_empty() {
        bail!("Invalid key '{}': title must not be empty", key);
    }
    Ok(Context {
        app,
        title: title.to_string(),
        identity: Identity::default(),
        key: key.to_string(),
        is_loading: false,
    })
}

/// Where the note's context comes from.
pub enum NoteTarget<'a> {
    Key(&'a str),
    Page(&'a Path),
}

pub async fn run_add(config: &Config, target: NoteTarget<'_>, text: &str) -> Result<()> {
    let context = match target {
        NoteTarget::Key(key) => context_for_key(key)?,
        NoteTarget::Page(path) => match resolve::resolve_snapshot(config, path)? {
            Some(ctx) => ctx,
            None => bail!("No supported context on page: {}", path.display()),
        },
    };

    let store = open_store(config).await?;
    let result = store.add_note(&context, text).await;
    store.kv().close().await;
    let bucket = result?;

    println!(
        "Added note #{} to {} ({} total)",
        bucket.len() - 1,
        context.key,
        bucket.len()
    );
    Ok(())
}

pub async fn run_list(config: &Config, key: &str) -> Result<()> {
    let store = open_store(config).await?;
    let bucket = store.list(key).await;
    store.kv().close().await;
    let bucket = bucket?;

    if bucket.is_empty() {
        println!("No notes for {}.", key);
        return Ok(());
    }

    println!("{} ({} note{})", key, bucket.len(), plural(bucket.len()));
    for (i, note) in bucket.iter().enumerate() {
        println!(
            "  [{}] {}  {}",
            i,
            note.timestamp.format("%Y-%m-%d %H:%M"),
            note.text
        );
    }
    Ok(())
}

pub async fn run_delete(config: &Config, key: &str, index: usize) -> Result<()> {
    let store = open_store(config).await?;
    let removed = store.delete_at(key, index).await;
    store.kv().close().await;

    match removed? {
        Some(note) => println!("Deleted note [{}] from {}: {}", index, key, note.text),
        None => println!("No note at index {} for {}; nothing deleted.", index, key),
    }
    Ok(())
}

pub async fn run_related(config: &Config, key: &str) -> Result<()> {
    let (_, title) = split_key(key);
    let store = open_store(config).await?;
    let related = store.find_related(key, title).await;
    store.kv().close().await;
    let related = related?;

    if related.is_empty() {
        println!("No related notes for {}.", key);
        return Ok(());
    }

    println!("Related to {}:", key);
    for r in &related {
        println!(
            "  {}  {:<32} {}",
            r.note.timestamp.format("%Y-%m-%d %H:%M"),
            r.origin_key,
            r.note.text
        );
    }
    Ok(())
}

pub async fn run_all(config: &Config, app: &str, sort: &str) -> Result<()> {
    let query = AggregateQuery {
        filter: app.parse::<AppFilter>()?,
        order: sort.parse::<SortOrder>()?,
    };

    let store = open_store(config).await?;
    let entries = store.list_all().await;
    store.kv().close().await;
    let view = aggregate(entries?, &query);

    println!(
        "{} note{} across {} app{}",
        view.total,
        plural(view.total),
        view.app_count,
        plural(view.app_count)
    );
    if view.entries.is_empty() {
        return Ok(());
    }
    println!();
    println!("  {:<16} {:<8} {:<32} {}", "WHEN", "APP", "TITLE", "NOTE");
    println!("  {}", "-".repeat(76));
    for e in &view.entries {
        println!(
            "  {:<16} {:<8} {:<32} {}",
            e.note.timestamp.format("%Y-%m-%d %H:%M"),
            e.app,
            truncate(&e.title, 32),
            e.note.text
        );
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
