//! Core data models: applications, contexts, and notes.
//!
//! A [`Context`] identifies what the user is looking at and carries the
//! derived [`Context::key`] that indexes the note store. A [`Note`] is an
//! immutable annotation stored in the bucket for that key.

use std::fmt;
use std::str::FromStr;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Title used for the placeholder context sent while resolution is in flight.
pub const LOADING_TITLE: &str = "Loading...";

/// Title of the shared calendar bucket used when no event is open.
pub const CALENDAR_GENERAL_TITLE: &str = "general";

/// A supported host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum App {
    Mail,
    Videoconf,
    Docs,
    Calendar,
    Video,
}

impl App {
    pub const ALL: [App; 5] = [
        App::Mail,
        App::Videoconf,
        App::Docs,
        App::Calendar,
        App::Video,
    ];

    /// The tag used as the key prefix (`mail`, `videoconf`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            App::Mail => "mail",
            App::Videoconf => "videoconf",
            App::Docs => "docs",
            App::Calendar => "calendar",
            App::Video => "video",
        }
    }
}

impl fmt::Display for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for App {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "mail" => Ok(App::Mail),
            "videoconf" => Ok(App::Videoconf),
            "docs" => Ok(App::Docs),
            "calendar" => Ok(App::Calendar),
            "video" => Ok(App::Video),
            other => bail!(
                "Unknown app: '{}'. Must be mail, videoconf, docs, calendar, or video.",
                other
            ),
        }
    }
}

/// Kind of page inside the video site. Drives the stabilization policy:
/// only [`VideoPage::Watch`] needs to wait for a real title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoPage {
    Home,
    Watch,
    Search,
    Channel,
    Subscriptions,
    Trending,
    Library,
    History,
    Other,
}

/// App-specific identity fields. Informative only; the key is derived from
/// the title except where [`Context::key`] documents otherwise.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub sender: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub thread_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub channel: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub participants: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_page: Option<VideoPage>,
}

/// Raw output of an extractor before key derivation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawContext {
    pub app: App,
    pub title: String,
    pub identity: Identity,
}

/// The thing the user is looking at, reduced to a stable key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    pub app: App,
    pub title: String,
    #[serde(default)]
    pub identity: Identity,
    pub key: String,
    #[serde(default)]
    pub is_loading: bool,
}

impl Context {
    /// Derive the context (and its key) from an extractor result.
    ///
    /// Keys are `app:title`, except mail with a known sender which is keyed
    /// `mail:<sender>` so that every subject from the same sender shares one
    /// bucket.
    pub fn from_raw(raw: RawContext) -> Self {
        let anchor = match raw.app {
            App::Mail if !raw.identity.sender.is_empty() => raw.identity.sender.as_str(),
            _ => raw.title.as_str(),
        };
        let key = format!("{}:{}", raw.app, anchor);
        Self {
            app: raw.app,
            title: raw.title,
            identity: raw.identity,
            key,
            is_loading: false,
        }
    }

    /// Placeholder context emitted while a new context is being resolved.
    pub fn loading(app: App) -> Self {
        Self {
            app,
            title: LOADING_TITLE.to_string(),
            identity: Identity::default(),
            key: format!("{}:{}", app, LOADING_TITLE),
            is_loading: true,
        }
    }
}

/// Split a store key into its app tag and title remainder.
///
/// Keys without a `:` yield an empty app and the whole key as title.
pub fn split_key(key: &str) -> (&str, &str) {
    match key.split_once(':') {
        Some((app, title)) => (app, title),
        None => ("", key),
    }
}

/// A user-authored annotation. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub context: Context,
}

impl Note {
    /// Create a note stamped with the current wall-clock time.
    pub fn new(text: &str, context: &Context) -> Result<Self> {
        Self::with_timestamp(text, context, Utc::now())
    }

    /// Create a note with an explicit timestamp.
    ///
    /// The text is trimmed and must not be empty. Loading placeholders are
    /// never valid note contexts.
    pub fn with_timestamp(text: &str, context: &Context, timestamp: DateTime<Utc>) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            bail!("note text must not be empty");
        }
        if context.is_loading {
            bail!("cannot attach a note to a loading context");
        }
        Ok(Self {
            text: text.to_string(),
            timestamp,
            context: context.clone(),
        })
    }
}
