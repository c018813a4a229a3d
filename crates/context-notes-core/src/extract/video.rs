//! Video site extractor.
//!
//! Detection has three tiers:
//!
//! 1. The exact site root is the fixed `Home Page` context.
//! 2. A watch page (`/watch?v=…`, `/shorts/…`) takes the video title from a
//!    prioritized selector list, then from the page title.
//! 3. Any other path is classified by fixed substrings into a list-style
//!    page (search, channel, subscriptions, ...).

use url::Url;

use super::{host_is, join_sections, strip_title_suffix, Extractor};
use crate::models::{App, Identity, RawContext, VideoPage};
use crate::snapshot::DocumentSnapshot;

/// Bare site name; a watch page showing only this has not rendered yet.
pub const VIDEO_SITE_NAME: &str = "YouTube";

const HOSTS: &[&str] = &["www.youtube.com", "youtube.com", "m.youtube.com"];

const WATCH_TITLE: &[&str] = &[
    "h1.ytd-watch-metadata yt-formatted-string",
    "h1.ytd-video-primary-info-renderer",
    "#title h1",
    "h1.title",
    "ytd-reel-player-header-renderer h2",
];

const CHANNEL_NAME: &[&str] = &[
    "ytd-watch-metadata ytd-channel-name a",
    "#owner #channel-name a",
    "ytd-channel-name #text",
];

const DESCRIPTION: &[&str] = &[
    "#description-inline-expander",
    "ytd-text-inline-expander",
    "#description yt-formatted-string",
];

/// Classify a video-site URL by path. Returns `None` for foreign hosts.
pub fn classify_video_url(url: &str) -> Option<VideoPage> {
    let parsed = Url::parse(url).ok()?;
    if !host_is(&parsed, HOSTS) {
        return None;
    }
    let path = parsed.path();
    let page = if path == "/" || path.is_empty() {
        VideoPage::Home
    } else if (path == "/watch" && parsed.query_pairs().any(|(k, _)| k == "v"))
        || path.starts_with("/shorts/")
    {
        VideoPage::Watch
    } else if path.contains("/results") {
        VideoPage::Search
    } else if path.contains("/feed/subscriptions") {
        VideoPage::Subscriptions
    } else if path.contains("/feed/trending") || path.contains("/feed/explore") {
        VideoPage::Trending
    } else if path.contains("/feed/history") {
        VideoPage::History
    } else if path.contains("/feed/library") || path.contains("/feed/you") || path.contains("/playlist") {
        VideoPage::Library
    } else if path.starts_with("/@")
        || path.contains("/channel/")
        || path.starts_with("/c/")
        || path.starts_with("/user/")
    {
        VideoPage::Channel
    } else {
        VideoPage::Other
    };
    Some(page)
}

/// Channel handle or id from the path, percent-decoded.
fn channel_from_path(url: &Url) -> Option<String> {
    let mut segments = url.path_segments()?;
    let first = segments.next()?;
    let raw = if first.starts_with('@') {
        first
    } else {
        segments.next()?
    };
    let decoded = urlencoding::decode(raw).ok()?.into_owned();
    (!decoded.is_empty()).then_some(decoded)
}

fn search_query(url: &Url) -> String {
    url.query_pairs()
        .find(|(k, _)| k == "search_query")
        .map(|(_, v)| v.trim().to_string())
        .unwrap_or_default()
}

fn clean_title(title: &str) -> String {
    strip_title_suffix(title, &[" - YouTube"])
}

/// Video site extractor.
pub struct VideoExtractor;

impl VideoExtractor {
    fn watch_title(doc: &dyn DocumentSnapshot) -> String {
        doc.select_first_text(WATCH_TITLE)
            .or_else(|| doc.select_attr("meta[name=\"title\"]", "content"))
            .unwrap_or_else(|| clean_title(doc.title()))
    }
}

impl Extractor for VideoExtractor {
    fn app(&self) -> App {
        App::Video
    }

    fn matches(&self, url: &Url) -> bool {
        host_is(url, HOSTS)
    }

    fn extract(&self, doc: &dyn DocumentSnapshot) -> Option<RawContext> {
        let page = classify_video_url(doc.url())?;
        let url = Url::parse(doc.url()).ok()?;
        let mut identity = Identity {
            url: doc.url().to_string(),
            video_page: Some(page),
            ..Default::default()
        };

        let title = match page {
            VideoPage::Home => "Home Page".to_string(),
            VideoPage::Watch => {
                identity.channel = doc.select_first_text(CHANNEL_NAME).unwrap_or_default();
                identity.thread_id = url
                    .query_pairs()
                    .find(|(k, _)| k == "v")
                    .map(|(_, v)| v.into_owned())
                    .or_else(|| url.path().strip_prefix("/shorts/").map(str::to_string))
                    .unwrap_or_default();
                Self::watch_title(doc)
            }
            VideoPage::Search => {
                let query = search_query(&url);
                if query.is_empty() {
                    "Search".to_string()
                } else {
                    format!("Search: {}", query)
                }
            }
            VideoPage::Channel => {
                let name = doc
                    .select_text("ytd-channel-name #text")
                    .or_else(|| channel_from_path(&url));
                match name {
                    Some(name) => {
                        identity.channel = name.clone();
                        format!("Channel: {}", name)
                    }
                    None => "Channel".to_string(),
                }
            }
            VideoPage::Subscriptions => "Subscriptions".to_string(),
            VideoPage::Trending => "Trending".to_string(),
            VideoPage::Library => "Library".to_string(),
            VideoPage::History => "History".to_string(),
            VideoPage::Other => {
                let t = clean_title(doc.title());
                if t.is_empty() {
                    VIDEO_SITE_NAME.to_string()
                } else {
                    t
                }
            }
        };

        Some(RawContext {
            app: App::Video,
            title,
            identity,
        })
    }

    fn page_content(&self, doc: &dyn DocumentSnapshot) -> String {
        let title = Self::watch_title(doc);
        let description = doc
            .select_first_text(DESCRIPTION)
            .or_else(|| doc.select_attr("meta[name=\"description\"]", "content"))
            .unwrap_or_default();
        join_sections(&[&title, &description])
    }
}
