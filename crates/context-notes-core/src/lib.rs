//! # Context Notes Core
//!
//! Runtime-free logic for Context Notes: context models, per-application
//! extractors, the resolution state machine, the note store over an abstract
//! key-value backend, related-note matching, aggregation, and the bridge
//! protocol between the host-page resolver and the note panel.
//!
//! This crate contains no tokio, sqlx, or filesystem I/O. Timers and
//! persistence are supplied by the embedding application.

pub mod aggregate;
pub mod bridge;
pub mod extract;
pub mod models;
pub mod notes;
pub mod panel;
pub mod resolver;
pub mod similarity;
pub mod snapshot;
pub mod store;
