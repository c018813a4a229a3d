//! Store statistics.
//!
//! Totals plus a per-app breakdown, used by `cnotes stats` to check that
//! notes are landing where expected.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use context_notes_core::models::split_key;
use context_notes_core::store::BucketMap;

use crate::config::Config;
use crate::notes_cmd::open_store;

#[derive(Debug, Default, PartialEq)]
struct AppStats {
    buckets: usize,
    notes: usize,
    latest: Option<DateTime<Utc>>,
}

/// Per-app counts keyed by the app tag of each bucket key. Empty buckets
/// count as contexts.
fn per_app(buckets: &BucketMap) -> BTreeMap<String, AppStats> {
    let mut out: BTreeMap<String, AppStats> = BTreeMap::new();
    for (key, bucket) in buckets {
        let s = out.entry(split_key(key).0.to_string()).or_default();
        s.buckets += 1;
        s.notes += bucket.len();
        if let Some(newest) = bucket.iter().map(|n| n.timestamp).max() {
            if s.latest.map_or(true, |t| newest > t) {
                s.latest = Some(newest);
            }
        }
    }
    out
}

/// Run the stats command: read every bucket and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let store = open_store(config).await?;
    let buckets = store.snapshot().await;
    store.kv().close().await;
    let buckets = buckets?;
    let total_notes: usize = buckets.values().map(Vec::len).sum();

    let db_size = std::fs::metadata(&config.db.path)
        .map(|m| m.len())
        .unwrap_or(0);

    println!("Context Notes: Store Stats");
    println!("==========================");
    println!();
    println!("  Database:    {}", config.db.path.display());
    println!("  Size:        {}", format_bytes(db_size));
    println!();
    println!("  Notes:       {}", total_notes);
    println!("  Contexts:    {}", buckets.len());

    let by_app = per_app(&buckets);
    if !by_app.is_empty() {
        println!();
        println!("  By app:");
        println!("  {:<12} {:>8} {:>6}   {}", "APP", "CONTEXTS", "NOTES", "LATEST");
        println!("  {}", "-".repeat(48));
        for (app, s) in &by_app {
            let latest = s
                .latest
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            println!("  {:<12} {:>8} {:>6}   {}", app, s.buckets, s.notes, latest);
        }
    }
    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
