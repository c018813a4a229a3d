//! One-shot resolution of a saved page snapshot.
//!
//! A snapshot file is the JSON form of [`PageSnapshot`]:
//!
//! ```json
//! {
//!   "url": "https://mail.google.com/mail/u/0/#inbox/FMfcg123",
//!   "title": "Budget review - alice@example.com - Gmail",
//!   "elements": [
//!     { "selector": "h2.hP", "text": "Budget review" },
//!     { "selector": "span.gD", "attrs": { "email": "bob@example.com" } }
//!   ]
//! }
//! ```

use anyhow::{Context as _, Result};
use std::path::Path;

use context_notes_core::extract::ExtractorRegistry;
use context_notes_core::models::Context;
use context_notes_core::resolver::ContextResolver;
use context_notes_core::snapshot::PageSnapshot;

use crate::config::Config;

pub fn load_snapshot(path: &Path) -> Result<PageSnapshot> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read page snapshot: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse page snapshot: {}", path.display()))
}

pub fn resolver(config: &Config) -> ContextResolver {
    ContextResolver::new(ExtractorRegistry::builtin(), config.resolver.policy())
}

/// Run the full attempt budget against a static snapshot.
pub fn resolve_snapshot(config: &Config, path: &Path) -> Result<Option<Context>> {
    let page = load_snapshot(path)?;
    Ok(resolver(config).resolve_now(&page))
}

pub fn run_resolve(config: &Config, path: &Path) -> Result<()> {
    match resolve_snapshot(config, path)? {
        Some(ctx) => println!("{}", serde_json::to_string_pretty(&ctx)?),
        None => println!("unsupported page"),
    }
    Ok(())
}

pub fn run_content(config: &Config, path: &Path) -> Result<()> {
    let page = load_snapshot(path)?;
    let content = ExtractorRegistry::builtin().page_content(&page, config.page_content.max_chars);
    println!("{}", content);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(tmp: &TempDir, page: &PageSnapshot) -> std::path::PathBuf {
        let path = tmp.path().join("page.json");
        std::fs::write(&path, serde_json::to_string(page).unwrap()).unwrap();
        path
    }

    #[test]
    fn test_mail_snapshot_keys_by_sender() {
        let tmp = TempDir::new().unwrap();
        let page = PageSnapshot::new(
            "https://mail.google.com/mail/u/0/#inbox/FMfcg123",
            "Budget review - me@example.com - Gmail",
        )
        .with_text("h2.hP", "Budget review")
        .with_attr("span.gD", "email", "bob@example.com");
        let path = write(&tmp, &page);

        let ctx = resolve_snapshot(&Config::minimal(), &path).unwrap().unwrap();
        assert_eq!(ctx.key, "mail:bob@example.com");
        assert_eq!(ctx.title, "Budget review");
    }

    #[test]
    fn test_unsupported_snapshot() {
        let tmp = TempDir::new().unwrap();
        let path = write(&tmp, &PageSnapshot::new("https://example.com/", "Example"));
        assert!(resolve_snapshot(&Config::minimal(), &path).unwrap().is_none());
    }

    #[test]
    fn test_watch_page_without_real_title_is_best_effort() {
        let tmp = TempDir::new().unwrap();
        let path = write(
            &tmp,
            &PageSnapshot::new("https://www.youtube.com/watch?v=abc", "YouTube"),
        );
        // The budget runs out; the last extraction is kept.
        let ctx = resolve_snapshot(&Config::minimal(), &path).unwrap().unwrap();
        assert_eq!(ctx.key, "video:YouTube");
        assert!(!ctx.is_loading);
    }

    #[test]
    fn test_bad_snapshot_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("page.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_snapshot(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse page snapshot"));
    }
}
