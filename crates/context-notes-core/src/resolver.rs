//! Context resolution state machine.
//!
//! ```text
//!            trigger                 poll (not yet acceptable)
//!   Idle ─────────────▶ Detecting ─────────────▶ Stabilizing ◀─┐
//!    ▲                     │                        │   │       │ retry
//!    │   unsupported       │ acceptable             │   └───────┘
//!    └─────────────────────┴────────────┬───────────┘
//!                                       ▼
//!                                   Committed
//! ```
//!
//! The resolver owns the current context, the last committed URL/title
//! snapshots, and a generation counter. Every accepted trigger starts a new
//! generation; polls carry the generation that scheduled them and are
//! ignored once superseded. Timing (settle delay, poll interval) is left to
//! the caller; this type never sleeps.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::extract::{classify_video_url, ExtractorRegistry, VIDEO_SITE_NAME};
use crate::models::{Context, RawContext, VideoPage, LOADING_TITLE};
use crate::snapshot::DocumentSnapshot;

/// Signals that may start a new detection cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// First load of the page.
    Initial,
    /// Location changed (history API, hash change, observed mutation).
    UrlChanged,
    /// Document title changed. Only honored on video watch pages.
    TitleChanged,
    /// The application's own "navigation finished" event.
    NavigationFinished,
    /// Tab became visible again.
    VisibilityRegained,
    /// Back/forward navigation.
    HistoryNavigation,
}

/// Timing and retry budget for stabilization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizationPolicy {
    /// Delay before the first extraction after a trigger.
    pub settle_delay: Duration,
    /// Delay between extraction attempts.
    pub poll_interval: Duration,
    /// Attempts before accepting the best-effort result.
    pub max_attempts: u32,
}

impl Default for StabilizationPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_millis(800),
            poll_interval: Duration::from_millis(250),
            max_attempts: 20,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverState {
    Idle,
    Detecting { generation: u64 },
    Stabilizing { generation: u64, attempt: u32 },
    Committed,
}

/// A started detection cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub generation: u64,
    /// Loading placeholder to emit right away, when the panel is visible
    /// and the page belongs to a supported application.
    pub placeholder: Option<Context>,
}

/// Result of one extraction attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// The poll belongs to a superseded cycle; do nothing.
    Stale,
    /// No acceptable context yet; poll again after the interval.
    Retry { attempt: u32 },
    /// Final context for this cycle.
    Commit(Context),
    /// No supported application; the resolver is idle.
    Unsupported,
}

/// Whether a watch-page title is the real video title rather than a
/// transient value shown while the page renders.
pub fn is_real_title(title: &str) -> bool {
    let t = title.trim();
    !t.is_empty() && t != VIDEO_SITE_NAME && t != LOADING_TITLE && !looks_like_url(t)
}

fn looks_like_url(t: &str) -> bool {
    let lower = t.to_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("www.")
        || lower.starts_with('/')
        || lower.contains("youtube.com/")
        || lower.contains("watch?v=")
}

fn acceptable(raw: &RawContext) -> bool {
    match raw.identity.video_page {
        Some(VideoPage::Watch) => is_real_title(&raw.title),
        _ => !raw.title.trim().is_empty(),
    }
}

fn is_watch_page(url: &str) -> bool {
    classify_video_url(url) == Some(VideoPage::Watch)
}

/// Owns detection dispatch, change detection, and stabilization.
pub struct ContextResolver {
    registry: ExtractorRegistry,
    policy: StabilizationPolicy,
    state: ResolverState,
    generation: u64,
    attempts: u32,
    best_effort: Option<RawContext>,
    target_url: Option<String>,
    last_url: Option<String>,
    last_title: Option<String>,
    current: Option<Context>,
}

impl ContextResolver {
    pub fn new(registry: ExtractorRegistry, policy: StabilizationPolicy) -> Self {
        Self {
            registry,
            policy,
            state: ResolverState::Idle,
            generation: 0,
            attempts: 0,
            best_effort: None,
            target_url: None,
            last_url: None,
            last_title: None,
            current: None,
        }
    }

    pub fn state(&self) -> ResolverState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> &StabilizationPolicy {
        &self.policy
    }

    pub fn registry(&self) -> &ExtractorRegistry {
        &self.registry
    }

    /// Last committed context, if the current page is supported.
    pub fn current(&self) -> Option<&Context> {
        self.current.as_ref()
    }

    fn in_flight(&self) -> bool {
        matches!(
            self.state,
            ResolverState::Detecting { .. } | ResolverState::Stabilizing { .. }
        )
    }

    /// Whether `trigger` observed on `doc` should start a new cycle.
    pub fn should_trigger(&self, trigger: Trigger, doc: &dyn DocumentSnapshot) -> bool {
        match trigger {
            Trigger::Initial | Trigger::NavigationFinished | Trigger::HistoryNavigation => true,
            Trigger::UrlChanged => self.target_url.as_deref() != Some(doc.url()),
            // An in-flight cycle for this page re-reads the title on its next poll.
            Trigger::TitleChanged => {
                is_watch_page(doc.url())
                    && !self.in_flight()
                    && self.last_title.as_deref() != Some(doc.title())
            }
            Trigger::VisibilityRegained => {
                let known = if self.in_flight() {
                    self.target_url.as_deref()
                } else {
                    self.last_url.as_deref()
                };
                known != Some(doc.url())
            }
        }
    }

    /// Enter `Detecting` for `trigger`, superseding any cycle in flight.
    ///
    /// Returns `None` when the trigger does not indicate a change.
    pub fn begin(
        &mut self,
        trigger: Trigger,
        doc: &dyn DocumentSnapshot,
        panel_visible: bool,
    ) -> Option<Detection> {
        if !self.should_trigger(trigger, doc) {
            return None;
        }
        self.generation += 1;
        self.attempts = 0;
        self.best_effort = None;
        self.target_url = Some(doc.url().to_string());
        self.state = ResolverState::Detecting {
            generation: self.generation,
        };
        debug!(generation = self.generation, ?trigger, url = doc.url(), "detecting context");

        let placeholder = if panel_visible {
            self.registry
                .detect(doc.url())
                .map(|e| Context::loading(e.app()))
        } else {
            None
        };
        Some(Detection {
            generation: self.generation,
            placeholder,
        })
    }

    /// Run one extraction attempt for `generation`.
    pub fn poll(&mut self, generation: u64, doc: &dyn DocumentSnapshot) -> PollOutcome {
        if generation != self.generation || !self.in_flight() {
            debug!(generation, current = self.generation, "dropping stale poll");
            return PollOutcome::Stale;
        }
        self.attempts += 1;
        self.state = ResolverState::Stabilizing {
            generation,
            attempt: self.attempts,
        };

        let extractor = match self.registry.detect(doc.url()) {
            Some(e) => e,
            None => return self.go_idle(doc),
        };

        if let Some(raw) = extractor.extract(doc) {
            if acceptable(&raw) {
                return self.commit(raw, doc);
            }
            self.best_effort = Some(raw);
        }

        if self.attempts >= self.policy.max_attempts {
            return match self.best_effort.take() {
                Some(raw) => {
                    debug!(generation, attempts = self.attempts, "accepting best-effort context");
                    self.commit(raw, doc)
                }
                None => self.go_idle(doc),
            };
        }
        PollOutcome::Retry {
            attempt: self.attempts,
        }
    }

    /// Resolve a static snapshot immediately, spending the whole attempt
    /// budget without waiting between polls.
    pub fn resolve_now(&mut self, doc: &dyn DocumentSnapshot) -> Option<Context> {
        let detection = self.begin(Trigger::Initial, doc, false)?;
        loop {
            match self.poll(detection.generation, doc) {
                PollOutcome::Retry { .. } => continue,
                PollOutcome::Commit(ctx) => return Some(ctx),
                PollOutcome::Stale | PollOutcome::Unsupported => return None,
            }
        }
    }

    fn commit(&mut self, raw: RawContext, doc: &dyn DocumentSnapshot) -> PollOutcome {
        let ctx = Context::from_raw(raw);
        self.state = ResolverState::Committed;
        self.last_url = Some(doc.url().to_string());
        self.last_title = Some(doc.title().to_string());
        self.current = Some(ctx.clone());
        info!(key = %ctx.key, attempts = self.attempts, "context committed");
        PollOutcome::Commit(ctx)
    }

    fn go_idle(&mut self, doc: &dyn DocumentSnapshot) -> PollOutcome {
        self.state = ResolverState::Idle;
        self.last_url = Some(doc.url().to_string());
        self.last_title = Some(doc.title().to_string());
        self.current = None;
        debug!(url = doc.url(), "no supported context");
        PollOutcome::Unsupported
    }
}

impl Default for ContextResolver {
    fn default() -> Self {
        Self::new(ExtractorRegistry::builtin(), StabilizationPolicy::default())
    }
}
