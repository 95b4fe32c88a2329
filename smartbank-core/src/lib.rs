//! Core chat logic for the SmartBank assistant
//!
//! This crate provides:
//! - **Model**: `Turn`, `Conversation`, `ArchivedConversation`
//! - **Topic gate**: `is_in_scope`, the banking keyword allow-list
//! - **Storage**: `SessionStore`, the volatile per-session conversation state
//! - **Engine**: `ChatEngine`, which runs one user submission against a store
//!
//! # Example
//!
//! ```ignore
//! use smartbank_core::{ChatEngine, SessionStore};
//!
//! let engine = ChatEngine::new(provider);
//! let mut store = SessionStore::new("llama3.2");
//! let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
//! engine.submit(&mut store, "What is my balance?", &tx).await;
//! ```
pub mod conversation;
pub mod engine;
pub mod store;
pub mod topic_gate;

pub use conversation::{ArchivedConversation, Conversation, Turn};
pub use engine::{ChatEngine, EngineEvent, REFUSAL_MESSAGE, SYSTEM_PROMPT, SubmitOutcome};
pub use store::{SessionStore, StoreError, UNARCHIVED};
pub use topic_gate::is_in_scope;

pub use llm::Role;
