use url::Url;

use super::{host_is, join_sections, strip_title_suffix, Extractor};
use crate::models::{App, Identity, RawContext};
use crate::snapshot::DocumentSnapshot;

const SUBJECT: &str = "h2.hP";
const SENDER: &str = "span.gD";
const BODY: &str = "div.a3s";

/// Mail client extractor.
///
/// The subject comes from the open conversation header, else from the page
/// title (`"Subject - account@example.com - Gmail"`). The sender address is
/// read from the participant `email` attribute; when present it becomes the
/// bucket key.
pub struct MailExtractor;

impl MailExtractor {
    fn title_fallback(title: &str) -> String {
        let stripped = strip_title_suffix(title, &[" - Gmail"]);
        // Drop the trailing signed-in account.
        match stripped.rsplit_once(" - ") {
            Some((head, account)) if account.contains('@') && !account.contains(' ') => {
                head.trim_end().to_string()
            }
            _ => stripped,
        }
    }

    /// Thread id from the header attribute, else the last fragment segment
    /// (`#inbox/FMfcgzQ...`).
    fn thread_id(doc: &dyn DocumentSnapshot, url: Option<&Url>) -> String {
        doc.select_attr(SUBJECT, "data-legacy-thread-id")
            .or_else(|| {
                let fragment = url?.fragment()?;
                let (_, id) = fragment.rsplit_once('/')?;
                (id.len() >= 16 && id.chars().all(|c| c.is_ascii_alphanumeric()))
                    .then(|| id.to_string())
            })
            .unwrap_or_default()
    }
}

impl Extractor for MailExtractor {
    fn app(&self) -> App {
        App::Mail
    }

    fn matches(&self, url: &Url) -> bool {
        host_is(url, &["mail.google.com"])
    }

    fn extract(&self, doc: &dyn DocumentSnapshot) -> Option<RawContext> {
        let title = doc
            .select_text(SUBJECT)
            .unwrap_or_else(|| Self::title_fallback(doc.title()));
        let sender = doc.select_attr(SENDER, "email").unwrap_or_default();
        if title.is_empty() && sender.is_empty() {
            return None;
        }
        let url = Url::parse(doc.url()).ok();
        Some(RawContext {
            app: App::Mail,
            title,
            identity: Identity {
                sender,
                thread_id: Self::thread_id(doc, url.as_ref()),
                url: doc.url().to_string(),
                ..Default::default()
            },
        })
    }

    fn page_content(&self, doc: &dyn DocumentSnapshot) -> String {
        let subject = doc
            .select_text(SUBJECT)
            .unwrap_or_else(|| Self::title_fallback(doc.title()));
        let body = doc.select_all_text(BODY).join("\n\n");
        let body = if body.is_empty() { doc.body_text() } else { body };
        join_sections(&[&subject, &body])
    }
}
