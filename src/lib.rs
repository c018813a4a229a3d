//! # Context Notes
//!
//! Context-aware notes for web applications.
//!
//! Context Notes works out what the user is looking at in a supported web
//! application (a mail thread, a meeting, a document, a calendar event, a
//! video) and keeps short notes keyed by that context. Notes left on one
//! context resurface on related ones.
//!
//! The domain logic (extractors, resolver state machine, note store, panel
//! state) lives in the `context-notes-core` crate. This crate adds the
//! SQLite store, configuration, the async resolver session, and the `cnotes`
//! CLI.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌────────────┐
//! │ Host page   │──▶│  Resolver    │──▶│ Note panel │
//! │ (snapshot)  │   │  session     │   │  state     │
//! └─────────────┘   └──────────────┘   └─────┬──────┘
//!                                            ▼
//!                                      ┌──────────┐
//!                                      │  SQLite  │
//!                                      │ buckets  │
//!                                      └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! cnotes init
//! cnotes add --key "docs:Q3 Plan" "check hiring numbers"
//! cnotes related "docs:Q3 Planning Review"
//! cnotes all --app docs --sort oldest
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`sqlite_store`] | SQLite key-value store for note buckets |
//! | [`session`] | Async resolver session with generation-tagged timers |
//! | [`notes_cmd`] | Note commands |
//! | [`resolve`] | Snapshot resolution and page content |
//! | [`replay`] | Scripted session replay |
//! | [`export`] | JSON export |
//! | [`stats`] | Store statistics |
//! | [`logging`] | Tracing subscriber setup |

pub mod config;
pub mod db;
pub mod export;
pub mod logging;
pub mod migrate;
pub mod notes_cmd;
pub mod replay;
pub mod resolve;
pub mod session;
pub mod sqlite_store;
pub mod stats;
