use url::Url;

use super::{host_is, Extractor};
use crate::models::{App, Identity, RawContext, CALENDAR_GENERAL_TITLE};
use crate::snapshot::DocumentSnapshot;

const EVENT_TITLE: &[&str] = &["#rAECCd", "[role=\"dialog\"] [role=\"heading\"]"];
const EVENT_ID: &str = "[data-eventid]";

/// Calendar extractor.
///
/// With an event detail view open the event title is the context. Every
/// other calendar view shares the `calendar:general` bucket.
pub struct CalendarExtractor;

impl Extractor for CalendarExtractor {
    fn app(&self) -> App {
        App::Calendar
    }

    fn matches(&self, url: &Url) -> bool {
        host_is(url, &["calendar.google.com"])
    }

    fn extract(&self, doc: &dyn DocumentSnapshot) -> Option<RawContext> {
        let identity = Identity {
            url: doc.url().to_string(),
            ..Default::default()
        };
        let raw = match doc.select_first_text(EVENT_TITLE) {
            Some(title) => RawContext {
                app: App::Calendar,
                title,
                identity: Identity {
                    thread_id: doc.select_attr(EVENT_ID, "data-eventid").unwrap_or_default(),
                    ..identity
                },
            },
            None => RawContext {
                app: App::Calendar,
                title: CALENDAR_GENERAL_TITLE.to_string(),
                identity,
            },
        };
        Some(raw)
    }
}
