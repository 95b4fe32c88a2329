use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::Stream;
use std::pin::Pin;
use std::sync::Arc;

pub mod api;
mod client;
pub mod providers;
mod traffic_log;
pub use api::*;
pub use providers::{OllamaChatModel, OllamaProvider};

#[cfg(test)]
pub(crate) mod test_support;

/// Reply stream: zero or more `Fragment`s followed by exactly one `Complete`.
///
/// An `Err` item terminates the stream and no `Complete` follows it.
pub type ReplyStream = Pin<Box<dyn Stream<Item = anyhow::Result<ReplyChunk>> + Send>>;

#[async_trait]
pub trait ChatModel {
    fn name(&self) -> &str;

    async fn stream_chat(&self, request: &ChatRequest) -> anyhow::Result<ReplyStream>;
}

// Blanket implementation for Arc<dyn ChatModel> to make it easier to work with
#[async_trait]
impl ChatModel for Arc<dyn ChatModel + Send + Sync> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn stream_chat(&self, request: &ChatRequest) -> anyhow::Result<ReplyStream> {
        (**self).stream_chat(request).await
    }
}

#[async_trait]
pub trait ModelProvider {
    /// List installed model names. Failures degrade to an empty list.
    async fn list_models(&self) -> Vec<String>;

    /// Reachability ping. Never fails, returns false instead.
    async fn is_available(&self) -> bool;

    /// Create a chat model by name, returned as Arc for sharing across threads
    fn create_chat_model(&self, model_name: &str) -> Arc<dyn ChatModel + Send + Sync>;

    /// Send a one-line prompt and succeed once the first reply item arrives.
    async fn smoke_test(&self, model_name: &str) -> anyhow::Result<()> {
        let model = self.create_chat_model(model_name);
        let request = ChatRequest::new(vec![ChatMessage::user("Say 'Ready!'")]);
        let mut stream = model.stream_chat(&request).await?;
        match stream.next().await {
            Some(Ok(_)) => Ok(()),
            Some(Err(e)) => Err(e),
            None => Err(anyhow::anyhow!("Model {} returned an empty stream", model_name)),
        }
    }
}
