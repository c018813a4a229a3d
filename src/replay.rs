//! Replay a scripted browsing session through the resolver.
//!
//! A script is a JSON array of steps run in order:
//!
//! ```json
//! [
//!   { "page": { "url": "https://www.youtube.com/watch?v=abc", "title": "YouTube" } },
//!   { "event": { "type": "navigation", "trigger": "initial" } },
//!   { "wait": 1200 },
//!   { "page": { "url": "https://www.youtube.com/watch?v=abc", "title": "Rust talk - YouTube" } },
//!   { "event": { "type": "navigation", "trigger": "title_changed" } }
//! ]
//! ```
//!
//! `page` replaces what the host shows, `event` delivers a host event, and
//! `wait` sleeps for the given milliseconds. Every message the resolver
//! sends toward the note panel is printed as one JSON line.

use anyhow::{Context as _, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

use context_notes_core::bridge::BridgeMessage;
use context_notes_core::snapshot::PageSnapshot;

use crate::config::Config;
use crate::resolve::resolver;
use crate::session::{HostEvent, ResolverSession, SharedPage};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Page(PageSnapshot),
    Event(HostEvent),
    Wait(u64),
}

pub fn load_script(path: &Path) -> Result<Vec<Step>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read replay script: {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse replay script: {}", path.display()))
}

/// Run `steps` and collect every bridge message in emission order.
///
/// After the last step the session is given one full stabilization window
/// so a cycle still in flight can finish.
pub async fn replay(config: &Config, steps: Vec<Step>) -> Result<Vec<BridgeMessage>> {
    let policy = config.resolver.policy();
    let drain = policy.settle_delay + policy.poll_interval * policy.max_attempts;

    let page = SharedPage::default();
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    let (ev_tx, ev_rx) = mpsc::unbounded_channel();
    let session = ResolverSession::new(
        resolver(config),
        page.clone(),
        config.page_content.max_chars,
        out_tx,
    );
    let task = tokio::spawn(session.run(ev_rx));

    for step in steps {
        match step {
            Step::Page(snapshot) => page.replace(snapshot),
            Step::Event(event) => {
                if ev_tx.send(event).is_err() {
                    break;
                }
            }
            Step::Wait(ms) => tokio::time::sleep(Duration::from_millis(ms)).await,
        }
    }
    tokio::time::sleep(drain).await;
    drop(ev_tx);

    let session = task.await.context("resolver session panicked")??;
    drop(session);

    let mut messages = Vec::new();
    while let Some(msg) = out_rx.recv().await {
        messages.push(msg);
    }
    Ok(messages)
}

pub async fn run_replay(config: &Config, path: &Path) -> Result<()> {
    let steps = load_script(path)?;
    for msg in replay(config, steps).await? {
        println!("{}", msg.to_json()?);
    }
    Ok(())
}
