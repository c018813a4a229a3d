//! Note panel consumer: applies bridge messages and talks to the store.
//!
//! The panel never mutates its view speculatively. A submitted note shows up
//! in the list only after the store accepted it; on failure the draft and
//! list stay as they were and the error goes back to the caller.

use anyhow::{bail, Result};
use tracing::warn;

use crate::bridge::{BridgeMessage, PanelState, PanelUpdate};
use crate::models::Context;
use crate::notes::NoteStore;
use crate::store::KvStore;

pub struct NotePanel<S> {
    store: NoteStore<S>,
    state: PanelState,
}

impl<S: KvStore> NotePanel<S> {
    pub fn new(store: NoteStore<S>) -> Self {
        Self {
            store,
            state: PanelState::new(),
        }
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PanelState {
        &mut self.state
    }

    pub fn store(&self) -> &NoteStore<S> {
        &self.store
    }

    /// Finish initialization and replay any buffered update.
    pub async fn initialize(&mut self) -> Result<()> {
        if let Some(update) = self.state.initialize() {
            self.follow_up(update).await?;
        }
        Ok(())
    }

    /// Apply one message from the resolver.
    pub async fn handle(&mut self, msg: BridgeMessage) -> Result<()> {
        match msg {
            BridgeMessage::ContextUpdate { context } => {
                let update = self.state.apply(context);
                self.follow_up(update).await
            }
            BridgeMessage::PageContent { content } => {
                self.state.set_page_content(content);
                Ok(())
            }
        }
    }

    async fn follow_up(&mut self, update: PanelUpdate) -> Result<()> {
        match update {
            PanelUpdate::Reset(context) | PanelUpdate::Refresh { context, refetch: true } => {
                self.reload(&context).await
            }
            PanelUpdate::Buffered | PanelUpdate::Loading | PanelUpdate::Refresh { .. } => Ok(()),
        }
    }

    async fn reload(&mut self, context: &Context) -> Result<()> {
        let notes = self.store.list(&context.key).await?;
        let related = self.store.find_related(&context.key, &context.title).await?;
        self.state.set_notes(notes);
        self.state.set_related(related);
        Ok(())
    }

    /// Save the current draft as a note for the displayed context.
    pub async fn submit(&mut self) -> Result<()> {
        let context = match self.state.displayed() {
            Some(c) if !self.state.is_loading() => c.clone(),
            _ => bail!("no context to attach the note to"),
        };
        let draft = self.state.draft().to_string();
        match self.store.add_note(&context, &draft).await {
            Ok(bucket) => {
                self.state.set_notes(bucket);
                self.state.clear_draft();
                Ok(())
            }
            Err(e) => {
                warn!(key = %context.key, error = %e, "failed to save note");
                Err(e)
            }
        }
    }

    /// Delete the displayed note at `index` and re-fetch the list.
    ///
    /// A no-op while a new context is loading.
    pub async fn delete(&mut self, index: usize) -> Result<bool> {
        let context = match self.state.displayed() {
            Some(c) if !self.state.is_loading() => c.clone(),
            _ => return Ok(false),
        };
        let removed = self.store.delete_at(&context.key, index).await?;
        let notes = self.store.list(&context.key).await?;
        self.state.set_notes(notes);
        Ok(removed.is_some())
    }
}
