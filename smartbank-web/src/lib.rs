//! SmartBank web front end
//!
//! Serves the chat page, streams replies to the browser as server-sent events
//! and keeps one `SessionStore` per browser session.

pub mod error;
pub mod logging;
pub mod page;
mod routes;
pub mod sessions;

use axum::Router;
use axum::routing::{get, post};
use llm::ModelProvider;
use sessions::SessionRegistry;
use smartbank_core::ChatEngine;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub engine: ChatEngine,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(
        provider: Arc<dyn ModelProvider + Send + Sync>,
        default_model: impl Into<String>,
        idle_ttl: Duration,
    ) -> Self {
        Self {
            engine: ChatEngine::new(provider),
            sessions: Arc::new(SessionRegistry::new(default_model, idle_ttl)),
        }
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider + Send + Sync> {
        self.engine.provider()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/api/messages", post(routes::post_message))
        .route("/api/model/test", post(routes::test_model))
        .route("/chats/new", post(routes::new_chat))
        .route("/chats/:id/open", post(routes::open_chat))
        .route("/chats/:id/delete", post(routes::delete_chat))
        .route("/model", post(routes::select_model))
        .route("/health", get(routes::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
