use url::Url;

use super::{host_is, join_sections, strip_title_suffix, Extractor};
use crate::models::{App, Identity, RawContext};
use crate::snapshot::DocumentSnapshot;

const TITLE_INPUT: &str = "input.docs-title-input";
const EDITOR: &str = ".kix-appview-editor";
const SUFFIXES: &[&str] = &[" - Google Docs", " - Google Sheets", " - Google Slides"];

/// Documents editor extractor.
pub struct DocsExtractor;

impl DocsExtractor {
    fn title(doc: &dyn DocumentSnapshot) -> String {
        doc.select_value(TITLE_INPUT)
            .or_else(|| doc.select_text(TITLE_INPUT))
            .unwrap_or_else(|| strip_title_suffix(doc.title(), SUFFIXES))
    }
}

impl Extractor for DocsExtractor {
    fn app(&self) -> App {
        App::Docs
    }

    fn matches(&self, url: &Url) -> bool {
        host_is(url, &["docs.google.com"])
    }

    fn extract(&self, doc: &dyn DocumentSnapshot) -> Option<RawContext> {
        let title = Self::title(doc);
        if title.is_empty() {
            return None;
        }
        Some(RawContext {
            app: App::Docs,
            title,
            identity: Identity {
                url: doc.url().to_string(),
                ..Default::default()
            },
        })
    }

    fn page_content(&self, doc: &dyn DocumentSnapshot) -> String {
        let body = doc
            .select_text(EDITOR)
            .unwrap_or_else(|| doc.body_text());
        join_sections(&[&Self::title(doc), &body])
    }
}
