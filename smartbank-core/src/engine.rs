use crate::conversation::Turn;
use crate::store::SessionStore;
use crate::topic_gate::is_in_scope;
use futures::StreamExt;
use llm::{ChatMessage, ChatModel, ChatRequest, ModelProvider, ReplyChunk};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub const SYSTEM_PROMPT: &str = "You are SmartBank AI, a professional banking assistant for Indian customers.
Use ₹ symbol for Indian Rupees. Sample balances: Savings ₹3,45,200.
Services: balance, transfer, statement, cards, EMI, security.
Always respond as a bank officer.";

pub const REFUSAL_MESSAGE: &str = "I am your SmartBank virtual officer and can help **only** with \
banking-related questions like balances, transfers, cards, loans, EMIs, and security issues.";

/// Progress of one submission, in the order it happens.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Incremental reply text. Not yet part of the conversation.
    Fragment(String),
    /// The message was out of scope and the refusal turn was committed.
    Refused(String),
    /// The full reply was committed as an assistant turn.
    Completed(String),
    /// The reply failed and an error turn was committed.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Refused,
    Completed,
    Failed,
}

/// Runs user submissions against a session store.
///
/// Stateless apart from the provider, so one engine serves every session.
#[derive(Clone)]
pub struct ChatEngine {
    provider: Arc<dyn ModelProvider + Send + Sync>,
}

impl ChatEngine {
    pub fn new(provider: Arc<dyn ModelProvider + Send + Sync>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn ModelProvider + Send + Sync> {
        &self.provider
    }

    /// Handle one user message.
    ///
    /// The user turn is always committed. Out-of-scope text gets the canned
    /// refusal without contacting the model. Otherwise the reply is streamed,
    /// fragments are forwarded to `events`, and exactly one assistant turn is
    /// committed: the full reply, or an error message. Send failures on
    /// `events` are ignored; the stream is consumed to the end regardless.
    pub async fn submit(
        &self,
        store: &mut SessionStore,
        text: &str,
        events: &mpsc::UnboundedSender<EngineEvent>,
    ) -> SubmitOutcome {
        store.append(Turn::user(text));

        if !is_in_scope(text) {
            debug!("Message out of scope, sending refusal");
            store.append(Turn::assistant(REFUSAL_MESSAGE));
            let _ = events.send(EngineEvent::Refused(REFUSAL_MESSAGE.to_string()));
            return SubmitOutcome::Refused;
        }

        match self.generate(store, events).await {
            Ok(reply) => {
                store.append(Turn::assistant(reply.clone()));
                let _ = events.send(EngineEvent::Completed(reply));
                SubmitOutcome::Completed
            }
            Err(e) => {
                warn!("Reply generation failed: {:#}", e);
                let message = format!("❌ AI Error: {:#}", e);
                store.append(Turn::assistant(message.clone()));
                let _ = events.send(EngineEvent::Failed(message));
                SubmitOutcome::Failed
            }
        }
    }

    async fn generate(
        &self,
        store: &SessionStore,
        events: &mpsc::UnboundedSender<EngineEvent>,
    ) -> anyhow::Result<String> {
        let mut messages = Vec::with_capacity(store.active().len() + 1);
        messages.push(ChatMessage::system(SYSTEM_PROMPT));
        messages.extend(store.active().to_messages());
        let request = ChatRequest::new(messages);

        let model = self.provider.create_chat_model(store.selected_model());
        info!(model = model.name(), turns = store.active().len(), "Requesting reply");

        let mut stream = model.stream_chat(&request).await?;
        while let Some(item) = stream.next().await {
            match item? {
                ReplyChunk::Fragment(text) => {
                    let _ = events.send(EngineEvent::Fragment(text));
                }
                ReplyChunk::Complete(full_text) => return Ok(full_text),
            }
        }

        Err(anyhow::anyhow!("Reply stream ended before completion"))
    }
}
