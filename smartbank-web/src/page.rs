//! Server-rendered chat page

use askama::Template;
use smartbank_core::{Role, SessionStore};

/// Archive entries listed in the sidebar.
pub const HISTORY_LIMIT: usize = 8;

pub struct ModelOption {
    pub name: String,
    pub selected: bool,
}

pub struct HistoryEntry {
    pub id: i64,
    pub label: String,
    pub open: bool,
}

pub struct TurnView<'a> {
    pub is_user: bool,
    pub content: &'a str,
    pub time: String,
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage<'a> {
    pub title: String,
    pub selected_model: &'a str,
    pub available: bool,
    /// Reachable with at least one model installed
    pub can_chat: bool,
    pub models: Vec<ModelOption>,
    pub history: Vec<HistoryEntry>,
    pub turns: Vec<TurnView<'a>>,
}

impl<'a> IndexPage<'a> {
    pub fn new(store: &'a SessionStore, available: bool, models: Vec<String>) -> Self {
        let selected_model = store.selected_model();
        let can_chat = available && !models.is_empty();
        let models = models
            .into_iter()
            .map(|name| ModelOption {
                selected: name == selected_model,
                name,
            })
            .collect();

        let history = store
            .recent_archive(HISTORY_LIMIT)
            .iter()
            .map(|entry| HistoryEntry {
                id: entry.id,
                label: if entry.preview.is_empty() {
                    format!("Chat {}", entry.id + 1)
                } else {
                    entry.preview.clone()
                },
                open: store.open_entry() == Some(entry.id),
            })
            .collect();

        let turns = store
            .active()
            .turns()
            .iter()
            .map(|turn| TurnView {
                is_user: turn.role == Role::User,
                content: &turn.content,
                time: turn.timestamp.format("%H:%M").to_string(),
            })
            .collect();

        Self {
            title: store.display_title(),
            selected_model,
            available,
            can_chat,
            models,
            history,
            turns,
        }
    }
}
