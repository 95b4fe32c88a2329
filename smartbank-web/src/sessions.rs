//! Browser session registry
//!
//! Every browser gets its own `SessionStore`, found through the
//! `smartbank_session` cookie. Stores sit behind an async mutex that a
//! submission holds until its reply finishes, so one browser session handles
//! one message at a time while other sessions proceed independently.

use crate::AppState;
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, header};
use dashmap::DashMap;
use smartbank_core::SessionStore;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "smartbank_session";

/// How often idle sessions are looked for.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

pub type SessionId = Uuid;

struct SessionEntry {
    store: Arc<Mutex<SessionStore>>,
    last_seen: Instant,
}

pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionEntry>,
    default_model: String,
    idle_ttl: Duration,
}

impl SessionRegistry {
    pub fn new(default_model: impl Into<String>, idle_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            default_model: default_model.into(),
            idle_ttl,
        }
    }

    /// Find the session for `id` and mark it as seen. A missing or unknown id
    /// gets a brand new session with a fresh id.
    pub fn checkout(&self, id: Option<SessionId>) -> Session {
        if let Some(id) = id {
            if let Some(mut entry) = self.sessions.get_mut(&id) {
                entry.last_seen = Instant::now();
                return Session {
                    id,
                    store: entry.store.clone(),
                    is_new: false,
                };
            }
        }

        let id = Uuid::new_v4();
        let store = Arc::new(Mutex::new(SessionStore::new(self.default_model.clone())));
        self.sessions.insert(
            id,
            SessionEntry {
                store: store.clone(),
                last_seen: Instant::now(),
            },
        );
        debug!(%id, sessions = self.sessions.len(), "Created session");

        Session {
            id,
            store,
            is_new: true,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drop every session not seen within the idle timeout.
    ///
    /// A submission still running keeps its store alive until it finishes,
    /// but the browser gets a fresh session on its next request.
    pub fn evict_idle(&self) -> usize {
        let before = self.sessions.len();
        let ttl = self.idle_ttl;
        self.sessions.retain(|_, entry| entry.last_seen.elapsed() < ttl);

        let evicted = before.saturating_sub(self.sessions.len());
        if evicted > 0 {
            info!(evicted, remaining = self.sessions.len(), "Evicted idle sessions");
        }
        evicted
    }

    pub fn spawn_sweeper(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            // The first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                self.evict_idle();
            }
        })
    }
}

/// Parse the session id out of the request's `Cookie` headers.
pub fn session_id_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value).ok())
}

/// The current browser session, extracted from the request cookie.
pub struct Session {
    pub id: SessionId,
    pub store: Arc<Mutex<SessionStore>>,
    is_new: bool,
}

impl Session {
    pub fn is_new(&self) -> bool {
        self.is_new
    }

    /// `Set-Cookie` header for a session the browser does not know yet.
    pub fn set_cookie(&self) -> Option<[(HeaderName, String); 1]> {
        self.is_new.then(|| {
            [(
                header::SET_COOKIE,
                format!(
                    "{}={}; Path=/; HttpOnly; SameSite=Lax",
                    SESSION_COOKIE, self.id
                ),
            )]
        })
    }
}

#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(state.sessions.checkout(session_id_from_headers(&parts.headers)))
    }
}
