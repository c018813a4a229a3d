//! Per-application context extractors.
//!
//! Each supported application has one [`Extractor`] that turns a
//! [`DocumentSnapshot`] into a [`RawContext`] or reports "no match".
//! Extractors are pure: they never fail and never mutate the page. Missing
//! anchors degrade to fallbacks (page title, fixed labels) rather than errors.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                 ExtractorRegistry                    │
//! │  ┌──────┐ ┌──────────┐ ┌──────┐ ┌──────────┐ ┌─────┐ │
//! │  │ mail │ │videoconf │ │ docs │ │ calendar │ │video│ │
//! │  └──────┘ └──────────┘ └──────┘ └──────────┘ └─────┘ │
//! └──────────────────────────┬───────────────────────────┘
//!                            ▼
//!            detect(url) → extract(doc) → RawContext
//! ```

mod calendar;
mod docs;
mod mail;
mod meet;
mod video;

pub use calendar::CalendarExtractor;
pub use docs::DocsExtractor;
pub use mail::MailExtractor;
pub use meet::MeetExtractor;
pub use video::{classify_video_url, VideoExtractor, VIDEO_SITE_NAME};

use url::Url;

use crate::models::{App, RawContext};
use crate::snapshot::DocumentSnapshot;

/// Extraction rule for one application.
pub trait Extractor: Send + Sync {
    /// Application handled by this extractor.
    fn app(&self) -> App;

    /// Whether the page at `url` belongs to this application.
    fn matches(&self, url: &Url) -> bool;

    /// Extract the raw context, or `None` when the page is not recognized.
    fn extract(&self, doc: &dyn DocumentSnapshot) -> Option<RawContext>;

    /// Textual content of the page for `GET_PAGE_CONTENT`, uncapped.
    fn page_content(&self, doc: &dyn DocumentSnapshot) -> String {
        generic_page_content(doc)
    }
}

/// Registry mapping each [`App`] to its extractor.
pub struct ExtractorRegistry {
    extractors: Vec<Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            extractors: Vec::new(),
        }
    }

    /// Create a registry holding the five built-in extractors.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(MailExtractor));
        registry.register(Box::new(MeetExtractor));
        registry.register(Box::new(DocsExtractor));
        registry.register(Box::new(CalendarExtractor));
        registry.register(Box::new(VideoExtractor));
        registry
    }

    /// Register an extractor. A later registration for the same app
    /// replaces the earlier one.
    pub fn register(&mut self, extractor: Box<dyn Extractor>) {
        let app = extractor.app();
        self.extractors.retain(|e| e.app() != app);
        self.extractors.push(extractor);
    }

    /// Look up the extractor for an application.
    pub fn get(&self, app: App) -> Option<&dyn Extractor> {
        self.extractors
            .iter()
            .find(|e| e.app() == app)
            .map(|e| e.as_ref())
    }

    /// Find the extractor whose application owns `url`.
    pub fn detect(&self, url: &str) -> Option<&dyn Extractor> {
        let parsed = Url::parse(url).ok()?;
        self.extractors
            .iter()
            .find(|e| e.matches(&parsed))
            .map(|e| e.as_ref())
    }

    /// Detect the application and run its extractor.
    pub fn extract(&self, doc: &dyn DocumentSnapshot) -> Option<RawContext> {
        self.detect(doc.url())?.extract(doc)
    }

    /// App-specific page content, capped to `max_chars` characters.
    ///
    /// Unsupported pages use the generic title + main content fallback.
    pub fn page_content(&self, doc: &dyn DocumentSnapshot, max_chars: usize) -> String {
        let content = match self.detect(doc.url()) {
            Some(extractor) => extractor.page_content(doc),
            None => generic_page_content(doc),
        };
        cap_chars(&content, max_chars)
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

pub(crate) fn host_is(url: &Url, hosts: &[&str]) -> bool {
    url.host_str().is_some_and(|h| hosts.contains(&h))
}

/// Strip an application suffix such as `" - Gmail"` from a page title.
///
/// Also drops a leading unread counter like `"(3) "`.
pub(crate) fn strip_title_suffix(title: &str, suffixes: &[&str]) -> String {
    let mut t = strip_counter(title.trim());
    for suffix in suffixes {
        if let Some(stripped) = t.strip_suffix(suffix) {
            t = stripped.trim_end();
            break;
        }
    }
    t.to_string()
}

fn strip_counter(title: &str) -> &str {
    if let Some(rest) = title.strip_prefix('(') {
        if let Some((count, tail)) = rest.split_once(')') {
            if !count.is_empty() && count.chars().all(|c| c.is_ascii_digit() || c == '+') {
                return tail.trim_start();
            }
        }
    }
    title
}

/// Join non-empty sections with blank lines.
pub(crate) fn join_sections(sections: &[&str]) -> String {
    sections
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Title plus main content, for pages without a dedicated rule.
pub fn generic_page_content(doc: &dyn DocumentSnapshot) -> String {
    let main = doc
        .select_first_text(&["main", "[role=\"main\"]", "article"])
        .unwrap_or_else(|| doc.body_text());
    join_sections(&[doc.title(), &main])
}

/// Truncate to at most `max_chars` characters on a char boundary.
pub fn cap_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
