//! Host-page resolver session.
//!
//! Drives a [`ContextResolver`] on the tokio runtime. Host events (navigation
//! signals, panel toggles, panel commands) arrive on one channel; bridge
//! messages for the note panel leave on another.
//!
//! Every scheduled poll is a detached timer that, when it fires, sends the
//! generation it was scheduled for back into the session. A new trigger
//! bumps the resolver generation, so timers from a superseded cycle still
//! fire but their poll is answered with [`PollOutcome::Stale`] and dropped.
//!
//! ```text
//!  HostEvent ──▶ ┌──────────────────┐ ──▶ BridgeMessage
//!                │  ResolverSession │
//!   timer tick ─▶│  (one task)      │──┐
//!        ▲       └──────────────────┘  │ schedule(generation, delay)
//!        └─────────────────────────────┘
//! ```

use std::sync::{Arc, RwLock};
use std::time::Duration;

use anyhow::Result;
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use context_notes_core::bridge::{BridgeMessage, DockState, UiCommand};
use context_notes_core::resolver::{ContextResolver, PollOutcome, Trigger};
use context_notes_core::snapshot::{DocumentSnapshot, PageSnapshot};

/// Source of the current page state. Called once per trigger and per poll,
/// so implementations return whatever the host shows right now.
pub trait HostDocument: Send + Sync {
    fn snapshot(&self) -> Box<dyn DocumentSnapshot>;
}

/// A page that can be swapped out while the session runs.
#[derive(Clone, Default)]
pub struct SharedPage {
    page: Arc<RwLock<PageSnapshot>>,
}

impl SharedPage {
    pub fn new(page: PageSnapshot) -> Self {
        Self {
            page: Arc::new(RwLock::new(page)),
        }
    }

    pub fn replace(&self, page: PageSnapshot) {
        match self.page.write() {
            Ok(mut guard) => *guard = page,
            Err(poisoned) => *poisoned.into_inner() = page,
        }
    }
}

impl HostDocument for SharedPage {
    fn snapshot(&self) -> Box<dyn DocumentSnapshot> {
        let page = match self.page.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        };
        Box::new(page)
    }
}

/// Inputs to the session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A change signal from the host page.
    Navigation { trigger: Trigger },
    /// The injected toggle control was clicked.
    PanelToggle,
    /// A command posted by the note panel.
    Command { command: UiCommand },
}

/// One resolver per host page.
pub struct ResolverSession<D> {
    resolver: ContextResolver,
    document: D,
    dock: DockState,
    max_content_chars: usize,
    outbox: mpsc::UnboundedSender<BridgeMessage>,
    ticks_tx: mpsc::UnboundedSender<u64>,
    ticks_rx: mpsc::UnboundedReceiver<u64>,
}

impl<D: HostDocument> ResolverSession<D> {
    pub fn new(
        resolver: ContextResolver,
        document: D,
        max_content_chars: usize,
        outbox: mpsc::UnboundedSender<BridgeMessage>,
    ) -> Self {
        let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();
        Self {
            resolver,
            document,
            dock: DockState::default(),
            max_content_chars,
            outbox,
            ticks_tx,
            ticks_rx,
        }
    }

    pub fn dock(&self) -> DockState {
        self.dock
    }

    pub fn resolver(&self) -> &ContextResolver {
        &self.resolver
    }

    /// Process events until the event channel closes.
    pub async fn run(mut self, mut events: mpsc::UnboundedReceiver<HostEvent>) -> Result<Self> {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.on_event(event),
                    None => break,
                },
                Some(generation) = self.ticks_rx.recv() => self.on_tick(generation),
            }
        }
        Ok(self)
    }

    /// Apply one host event.
    pub fn on_event(&mut self, event: HostEvent) {
        trace!(?event, "host event");
        match event {
            HostEvent::Navigation { trigger } => {
                let doc = self.document.snapshot();
                if let Some(detection) = self.resolver.begin(trigger, doc.as_ref(), self.dock.visible) {
                    if let Some(placeholder) = detection.placeholder {
                        self.send(BridgeMessage::ContextUpdate {
                            context: placeholder,
                        });
                    }
                    let delay = self.resolver.policy().settle_delay;
                    self.schedule(detection.generation, delay);
                }
            }
            HostEvent::PanelToggle => {
                self.dock.visible = !self.dock.visible;
                if self.dock.visible {
                    if let Some(current) = self.resolver.current().cloned() {
                        self.send(BridgeMessage::ContextUpdate { context: current });
                    }
                }
            }
            HostEvent::Command { command } => match command {
                UiCommand::SwitchSide => self.dock.side = self.dock.side.toggled(),
                UiCommand::CloseSidebar => self.dock.visible = false,
                UiCommand::GetPageContent => {
                    let doc = self.document.snapshot();
                    let content = self
                        .resolver
                        .registry()
                        .page_content(doc.as_ref(), self.max_content_chars);
                    self.send(BridgeMessage::PageContent { content });
                }
            },
        }
    }

    fn on_tick(&mut self, generation: u64) {
        let doc = self.document.snapshot();
        match self.resolver.poll(generation, doc.as_ref()) {
            PollOutcome::Stale | PollOutcome::Unsupported => {}
            PollOutcome::Retry { attempt } => {
                trace!(generation, attempt, "context not stable yet");
                let interval = self.resolver.policy().poll_interval;
                self.schedule(generation, interval);
            }
            PollOutcome::Commit(context) => self.send(BridgeMessage::ContextUpdate { context }),
        }
    }

    fn schedule(&self, generation: u64, delay: Duration) {
        let tx = self.ticks_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(generation);
        });
    }

    fn send(&self, msg: BridgeMessage) {
        if self.outbox.send(msg).is_err() {
            debug!("note panel gone; dropping message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use context_notes_core::bridge::PanelSide;
    use context_notes_core::extract::ExtractorRegistry;
    use context_notes_core::resolver::StabilizationPolicy;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::timeout;

    const WATCH: &str = "https://www.youtube.com/watch?v=abc123";

    /// Serves page `n` for the n-th snapshot call (0-based).
    struct ScriptedPage<F> {
        calls: Arc<AtomicUsize>,
        script: F,
    }

    impl<F: Fn(usize) -> PageSnapshot + Send + Sync> HostDocument for ScriptedPage<F> {
        fn snapshot(&self) -> Box<dyn DocumentSnapshot> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Box::new((self.script)(n))
        }
    }

    fn start<D: HostDocument + 'static>(
        document: D,
    ) -> (
        mpsc::UnboundedSender<HostEvent>,
        mpsc::UnboundedReceiver<BridgeMessage>,
        tokio::task::JoinHandle<Result<ResolverSession<D>>>,
    ) {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (ev_tx, ev_rx) = mpsc::unbounded_channel();
        let session = ResolverSession::new(
            ContextResolver::new(ExtractorRegistry::builtin(), StabilizationPolicy::default()),
            document,
            5000,
            out_tx,
        );
        (ev_tx, out_rx, tokio::spawn(session.run(ev_rx)))
    }

    fn nav(trigger: Trigger) -> HostEvent {
        HostEvent::Navigation { trigger }
    }

    async fn next(rx: &mut mpsc::UnboundedReceiver<BridgeMessage>) -> Option<BridgeMessage> {
        timeout(Duration::from_secs(60), rx.recv()).await.ok().flatten()
    }

    #[tokio::test(start_paused = true)]
    async fn test_commits_only_after_real_title() {
        let calls = Arc::new(AtomicUsize::new(0));
        let page = ScriptedPage {
            calls: calls.clone(),
            // Call 0 is the trigger, calls 1..=10 are polls with the bare
            // site name, call 11 is the eleventh poll.
            script: |n: usize| {
                if n <= 10 {
                    PageSnapshot::new(WATCH, "YouTube")
                } else {
                    PageSnapshot::new(WATCH, "Real Title - YouTube")
                }
            },
        };
        let (events, mut out, _task) = start(page);
        events.send(nav(Trigger::Initial)).unwrap();

        match next(&mut out).await {
            Some(BridgeMessage::ContextUpdate { context }) => {
                assert_eq!(context.title, "Real Title");
                assert!(!context.is_loading);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 12);
        assert!(next(&mut out).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_trigger_supersedes_first() {
        let page = SharedPage::new(PageSnapshot::new(WATCH, "YouTube"));
        let (events, mut out, _task) = start(page.clone());
        events.send(nav(Trigger::Initial)).unwrap();

        // Mid-stabilization, the user navigates to a document.
        tokio::time::sleep(Duration::from_millis(1500)).await;
        page.replace(PageSnapshot::new(
            "https://docs.google.com/document/d/1/edit",
            "Q3 Plan - Google Docs",
        ));
        events.send(nav(Trigger::UrlChanged)).unwrap();

        match next(&mut out).await {
            Some(BridgeMessage::ContextUpdate { context }) => assert_eq!(context.key, "docs:Q3 Plan"),
            other => panic!("unexpected {:?}", other),
        }
        assert!(next(&mut out).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_visible_panel_gets_loading_placeholder_first() {
        let page = SharedPage::new(PageSnapshot::new(
            "https://docs.google.com/document/d/1/edit",
            "Q3 Plan - Google Docs",
        ));
        let (events, mut out, _task) = start(page);
        events.send(HostEvent::PanelToggle).unwrap();
        events.send(nav(Trigger::Initial)).unwrap();

        match next(&mut out).await {
            Some(BridgeMessage::ContextUpdate { context }) => assert!(context.is_loading),
            other => panic!("unexpected {:?}", other),
        }
        match next(&mut out).await {
            Some(BridgeMessage::ContextUpdate { context }) => {
                assert!(!context.is_loading);
                assert_eq!(context.key, "docs:Q3 Plan");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_page_emits_nothing() {
        let page = SharedPage::new(PageSnapshot::new("https://example.com/", "Example"));
        let (events, mut out, _task) = start(page);
        events.send(HostEvent::PanelToggle).unwrap();
        events.send(nav(Trigger::Initial)).unwrap();
        assert!(next(&mut out).await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_commands() {
        let page = SharedPage::new(
            PageSnapshot::new("https://docs.google.com/document/d/1/edit", "Q3 Plan - Google Docs")
                .with_text(".kix-appview-editor", "Quarterly goals"),
        );
        let (events, mut out, task) = start(page);
        events.send(HostEvent::PanelToggle).unwrap();
        events
            .send(HostEvent::Command {
                command: UiCommand::GetPageContent,
            })
            .unwrap();
        match next(&mut out).await {
            Some(BridgeMessage::PageContent { content }) => {
                assert_eq!(content, "Q3 Plan\n\nQuarterly goals")
            }
            other => panic!("unexpected {:?}", other),
        }

        events
            .send(HostEvent::Command {
                command: UiCommand::SwitchSide,
            })
            .unwrap();
        events
            .send(HostEvent::Command {
                command: UiCommand::CloseSidebar,
            })
            .unwrap();
        drop(events);
        let session = task.await.unwrap().unwrap();
        assert_eq!(session.dock().side, PanelSide::Left);
        assert!(!session.dock().visible);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reopening_panel_resends_current_context() {
        let page = SharedPage::new(PageSnapshot::new("https://www.youtube.com/feed/history", "YouTube"));
        let (events, mut out, _task) = start(page);
        events.send(nav(Trigger::Initial)).unwrap();
        let committed = next(&mut out).await.unwrap();

        events.send(HostEvent::PanelToggle).unwrap();
        assert_eq!(next(&mut out).await.unwrap(), committed);
    }

    #[test]
    fn test_host_event_wire_shape() {
        let ev: HostEvent =
            serde_json::from_str(r#"{"type":"navigation","trigger":"url_changed"}"#).unwrap();
        assert_eq!(ev, nav(Trigger::UrlChanged));
        let ev: HostEvent =
            serde_json::from_str(r#"{"type":"command","command":{"type":"CLOSE_SIDEBAR"}}"#).unwrap();
        assert_eq!(
            ev,
            HostEvent::Command {
                command: UiCommand::CloseSidebar
            }
        );
    }
}
