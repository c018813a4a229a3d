//! Read-only view of the host document.
//!
//! Extractors never touch a live page. They query a [`DocumentSnapshot`],
//! which the host side implements over whatever it has (a rendered DOM, a
//! recorded page, a test fixture). [`PageSnapshot`] is the serializable
//! implementation used by the CLI and the tests: each recorded element is
//! stored under the selector that matched it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Queries an extractor may run against the current page.
///
/// Text results are trimmed; empty text is reported as `None` so callers
/// can chain fallbacks with `or_else`.
pub trait DocumentSnapshot: Send + Sync {
    /// Full page URL.
    fn url(&self) -> &str;

    /// Document title (`<title>`).
    fn title(&self) -> &str;

    /// Text content of the first element matching `selector`.
    fn select_text(&self, selector: &str) -> Option<String>;

    /// Text content of every element matching `selector`, in document order.
    fn select_all_text(&self, selector: &str) -> Vec<String>;

    /// Attribute value of the first matching element carrying `attr`.
    fn select_attr(&self, selector: &str, attr: &str) -> Option<String>;

    /// Current value of the first matching form control.
    fn select_value(&self, selector: &str) -> Option<String>;

    /// Visible text of the whole page body.
    fn body_text(&self) -> String;

    /// First non-empty text among `selectors`, tried in order.
    fn select_first_text(&self, selectors: &[&str]) -> Option<String> {
        selectors.iter().find_map(|s| self.select_text(s))
    }
}

/// One recorded element of a [`PageSnapshot`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub selector: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
    #[serde(default)]
    pub value: Option<String>,
}

/// A recorded page: URL, title, body text, and the elements of interest.
///
/// ```json
/// {
///   "url": "https://docs.google.com/document/d/abc/edit",
///   "title": "Q3 Plan - Google Docs",
///   "elements": [
///     { "selector": "input.docs-title-input", "value": "Q3 Plan" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl PageSnapshot {
    pub fn new(url: &str, title: &str) -> Self {
        Self {
            url: url.to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    pub fn with_text(mut self, selector: &str, text: &str) -> Self {
        self.elements.push(Element {
            selector: selector.to_string(),
            text: text.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn with_attr(mut self, selector: &str, attr: &str, value: &str) -> Self {
        let mut attrs = BTreeMap::new();
        attrs.insert(attr.to_string(), value.to_string());
        self.elements.push(Element {
            selector: selector.to_string(),
            attrs,
            ..Default::default()
        });
        self
    }

    pub fn with_value(mut self, selector: &str, value: &str) -> Self {
        self.elements.push(Element {
            selector: selector.to_string(),
            value: Some(value.to_string()),
            ..Default::default()
        });
        self
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    fn matching<'a>(&'a self, selector: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.elements.iter().filter(move |e| e.selector == selector)
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

impl DocumentSnapshot for PageSnapshot {
    fn url(&self) -> &str {
        &self.url
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn select_text(&self, selector: &str) -> Option<String> {
        self.matching(selector).find_map(|e| non_empty(&e.text))
    }

    fn select_all_text(&self, selector: &str) -> Vec<String> {
        self.matching(selector)
            .filter_map(|e| non_empty(&e.text))
            .collect()
    }

    fn select_attr(&self, selector: &str, attr: &str) -> Option<String> {
        self.matching(selector)
            .find_map(|e| e.attrs.get(attr).and_then(|v| non_empty(v)))
    }

    fn select_value(&self, selector: &str) -> Option<String> {
        self.matching(selector)
            .find_map(|e| e.value.as_deref().and_then(non_empty))
    }

    fn body_text(&self) -> String {
        self.body.clone()
    }
}
