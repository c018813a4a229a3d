use url::Url;

use super::{host_is, strip_title_suffix, Extractor};
use crate::models::{App, Identity, RawContext};
use crate::snapshot::DocumentSnapshot;

const MEETING_TITLE: &[&str] = &["[data-meeting-title]", "div[jsname=\"r4nke\"]"];
const PARTICIPANT: &str = "[data-participant-id] [data-self-name]";

/// Video conferencing extractor.
///
/// Participants are best effort and never block extraction.
pub struct MeetExtractor;

/// Meeting code (`abc-defg-hij`) from the first path segment.
fn meeting_code(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            let seg = u.path_segments()?.next()?.to_string();
            let parts: Vec<&str> = seg.split('-').collect();
            let is_code = parts.len() == 3
                && parts
                    .iter()
                    .all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_lowercase()));
            is_code.then_some(seg)
        })
        .unwrap_or_default()
}

impl Extractor for MeetExtractor {
    fn app(&self) -> App {
        App::Videoconf
    }

    fn matches(&self, url: &Url) -> bool {
        host_is(url, &["meet.google.com"])
    }

    fn extract(&self, doc: &dyn DocumentSnapshot) -> Option<RawContext> {
        let code = meeting_code(doc.url());
        let title = doc.select_first_text(MEETING_TITLE).unwrap_or_else(|| {
            let t = strip_title_suffix(doc.title(), &[" - Google Meet"]);
            t.strip_prefix("Meet - ").map(str::to_string).unwrap_or(t)
        });
        let title = if title.is_empty() && !code.is_empty() {
            format!("Meeting {}", code)
        } else {
            title
        };
        if title.is_empty() {
            return None;
        }

        let mut participants = doc.select_all_text(PARTICIPANT);
        participants.dedup();

        Some(RawContext {
            app: App::Videoconf,
            title,
            identity: Identity {
                channel: code,
                participants,
                url: doc.url().to_string(),
                ..Default::default()
            },
        })
    }
}
