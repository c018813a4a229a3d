//! Export every note bucket as JSON.
//!
//! The output is the raw key → bucket mapping, the same shape the store
//! persists, so it can be inspected or fed to other tools.

use anyhow::Result;
use std::path::Path;

use crate::config::Config;
use crate::notes_cmd::open_store;

/// Export all buckets as pretty-printed JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = open_store(config).await?;
    let snapshot = store.snapshot().await;
    store.kv().close().await;
    let snapshot = snapshot?;

    let bucket_count = snapshot.len();
    let note_count: usize = snapshot.values().map(Vec::len).sum();
    let json = serde_json::to_string_pretty(&snapshot)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            eprintln!(
                "Exported {} notes in {} buckets to {}",
                note_count,
                bucket_count,
                path.display()
            );
        }
        None => {
            println!("{}", json);
        }
    }
    Ok(())
}
