//! Volatile per-session conversation state
//!
//! Holds the active conversation, the archive shown in the history panel and
//! the selected model. Nothing here outlives the browser session.

use crate::conversation::{ArchivedConversation, Conversation, Turn};
use chrono::Local;
use thiserror::Error;

/// `active_id` of a conversation that has never been archived.
pub const UNARCHIVED: i64 = -1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no archived conversation with id {0}")]
    UnknownConversation(i64),
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    active: Conversation,
    archive: Vec<ArchivedConversation>,
    active_id: i64,
    // Archive entry the active conversation was opened from
    open_entry: Option<i64>,
    selected_model: String,
    // Ids are never reused, even after deletions
    next_archive_id: i64,
}

impl SessionStore {
    pub fn new(selected_model: impl Into<String>) -> Self {
        Self {
            active: Conversation::new(),
            archive: Vec::new(),
            active_id: 0,
            open_entry: None,
            selected_model: selected_model.into(),
            next_archive_id: 0,
        }
    }

    pub fn active(&self) -> &Conversation {
        &self.active
    }

    pub fn archive(&self) -> &[ArchivedConversation] {
        &self.archive
    }

    /// The last `limit` archived conversations, oldest first.
    pub fn recent_archive(&self, limit: usize) -> &[ArchivedConversation] {
        let start = self.archive.len().saturating_sub(limit);
        &self.archive[start..]
    }

    pub fn active_id(&self) -> i64 {
        self.active_id
    }

    /// Id of the archive entry currently opened, if any.
    ///
    /// Unlike `active_id`, this is `None` after a reset or deletion, so it
    /// never aliases archive entry 0.
    pub fn open_entry(&self) -> Option<i64> {
        self.open_entry
    }

    pub fn selected_model(&self) -> &str {
        &self.selected_model
    }

    pub fn select_model(&mut self, model: impl Into<String>) {
        self.selected_model = model.into();
    }

    pub fn append(&mut self, turn: Turn) {
        self.active.push(turn);
    }

    /// Archive the active conversation (if it has any turns) and start over.
    ///
    /// Returns the id of the new archive entry, if one was created.
    pub fn new_chat(&mut self) -> Option<i64> {
        let archived = if self.active.is_empty() {
            None
        } else {
            let id = self.next_archive_id;
            self.next_archive_id += 1;
            let conversation = std::mem::take(&mut self.active);
            self.archive.push(ArchivedConversation {
                id,
                title: format!("Chat {}", self.archive.len() + 1),
                preview: conversation.preview(),
                archived_at: Local::now(),
                conversation,
            });
            tracing::debug!(id, archived = self.archive.len(), "Archived conversation");
            Some(id)
        };

        self.active.clear();
        self.active_id = UNARCHIVED;
        self.open_entry = None;
        archived
    }

    /// Replace the active conversation with a copy of an archived one.
    pub fn open(&mut self, id: i64) -> Result<(), StoreError> {
        let entry = self
            .archive
            .iter()
            .find(|entry| entry.id == id)
            .ok_or(StoreError::UnknownConversation(id))?;

        self.active = entry.conversation.clone();
        self.active_id = id;
        self.open_entry = Some(id);
        Ok(())
    }

    /// Remove an archived conversation. Deleting the open one clears the view.
    pub fn delete(&mut self, id: i64) -> Result<(), StoreError> {
        let position = self
            .archive
            .iter()
            .position(|entry| entry.id == id)
            .ok_or(StoreError::UnknownConversation(id))?;

        self.archive.remove(position);
        if self.open_entry == Some(id) {
            self.active.clear();
            self.active_id = 0;
            self.open_entry = None;
        }
        Ok(())
    }

    /// Header title for the transcript.
    pub fn display_title(&self) -> String {
        if self.active_id <= 0 {
            "SmartBank Chat".to_string()
        } else {
            format!("Chat #{}", self.active_id + 1)
        }
    }
}
