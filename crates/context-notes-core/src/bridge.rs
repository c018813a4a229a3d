//! Messages exchanged between the host-page resolver and the note panel.
//!
//! | Direction | Message | Payload |
//! |-----------|---------|---------|
//! | resolver → panel | `CONTEXT_UPDATE` | `context` (committed or loading) |
//! | resolver → panel | `PAGE_CONTENT` | `content` (reply to `GET_PAGE_CONTENT`) |
//! | panel → resolver | `SWITCH_SIDE` | |
//! | panel → resolver | `CLOSE_SIDEBAR` | |
//! | panel → resolver | `GET_PAGE_CONTENT` | |
//!
//! Delivery is fire-and-forget and ordered per sender/receiver pair. The
//! panel side applies updates through [`PanelState`], which buffers updates
//! that arrive before initialization and decides between a full reset and a
//! display-only refresh.

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};

use crate::models::{Context, Note};
use crate::notes::RelatedNote;

/// Resolver → panel messages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BridgeMessage {
    ContextUpdate { context: Context },
    PageContent { content: String },
}

/// Panel → resolver commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiCommand {
    SwitchSide,
    CloseSidebar,
    GetPageContent,
}

impl BridgeMessage {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("Failed to encode bridge message")
    }

    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to decode bridge message")
    }
}

impl UiCommand {
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s).context("Failed to decode panel command")
    }
}

/// Which edge of the page the panel is docked to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PanelSide {
    Left,
    #[default]
    Right,
}

impl PanelSide {
    pub fn toggled(self) -> Self {
        match self {
            PanelSide::Left => PanelSide::Right,
            PanelSide::Right => PanelSide::Left,
        }
    }
}

/// Host-side panel container state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DockState {
    pub side: PanelSide,
    pub visible: bool,
}

/// What the panel has to do after applying a `CONTEXT_UPDATE`.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelUpdate {
    /// Arrived before initialization; kept for replay.
    Buffered,
    /// Loading placeholder: the view is blanked.
    Loading,
    /// New context key: draft, list and related notes were cleared and must
    /// be fetched for this context.
    Reset(Context),
    /// Same key as displayed. The draft is kept. `refetch` is set when the
    /// view was blanked by a loading placeholder in between.
    Refresh { context: Context, refetch: bool },
}

/// Panel-side view state.
#[derive(Debug, Clone, Default)]
pub struct PanelState {
    initialized: bool,
    pending: Option<Context>,
    displayed: Option<Context>,
    loading: bool,
    draft: String,
    notes: Vec<Note>,
    related: Vec<RelatedNote>,
    page_content: Option<String>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the panel ready and replay the latest buffered update.
    pub fn initialize(&mut self) -> Option<PanelUpdate> {
        self.initialized = true;
        self.pending.take().map(|ctx| self.apply(ctx))
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Apply a `CONTEXT_UPDATE`.
    pub fn apply(&mut self, context: Context) -> PanelUpdate {
        if !self.initialized {
            self.pending = Some(context);
            return PanelUpdate::Buffered;
        }
        if context.is_loading {
            self.loading = true;
            self.notes.clear();
            self.related.clear();
            return PanelUpdate::Loading;
        }

        let was_loading = std::mem::replace(&mut self.loading, false);
        let same_key = self
            .displayed
            .as_ref()
            .is_some_and(|d| d.key == context.key);
        self.displayed = Some(context.clone());

        if same_key {
            PanelUpdate::Refresh {
                context,
                refetch: was_loading,
            }
        } else {
            self.draft.clear();
            self.notes.clear();
            self.related.clear();
            self.page_content = None;
            PanelUpdate::Reset(context)
        }
    }

    /// Committed context on display (`None` on unsupported pages).
    pub fn displayed(&self) -> Option<&Context> {
        self.displayed.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: &str) {
        self.draft = text.to_string();
    }

    pub fn clear_draft(&mut self) {
        self.draft.clear();
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn set_notes(&mut self, notes: Vec<Note>) {
        self.notes = notes;
    }

    pub fn related(&self) -> &[RelatedNote] {
        &self.related
    }

    pub fn set_related(&mut self, related: Vec<RelatedNote>) {
        self.related = related;
    }

    pub fn page_content(&self) -> Option<&str> {
        self.page_content.as_deref()
    }

    pub fn set_page_content(&mut self, content: String) {
        self.page_content = Some(content);
    }
}
