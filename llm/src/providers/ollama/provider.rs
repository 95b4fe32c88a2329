use super::chat::api::ListModelsResponse;
use super::chat::model::OllamaChatModel;
use crate::client::Client;
use crate::traffic_log;
use crate::{ChatModel, ModelProvider};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Timeout applied to `/api/tags` pings. Chat streams have none.
pub const TAGS_TIMEOUT: Duration = Duration::from_secs(5);

pub struct OllamaProvider {
    client: Client,
    base_url: String,
}

impl Default for OllamaProvider {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl OllamaProvider {
    pub fn new(base_url: &str) -> Self {
        OllamaProvider {
            client: Client::default(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url)
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    async fn list_models(&self) -> Vec<String> {
        let url = self.tags_url();
        match self.client.get::<_, ListModelsResponse>(&url, TAGS_TIMEOUT).await {
            Ok(response) => {
                traffic_log::log_ping(&url, true);
                response.models.into_iter().map(|m| m.name).collect()
            }
            Err(e) => {
                traffic_log::log_ping(&url, false);
                tracing::warn!("Failed to list Ollama models at {}: {}", url, e);
                Vec::new()
            }
        }
    }

    async fn is_available(&self) -> bool {
        let url = self.tags_url();
        let ok = self.client.ping(&url, TAGS_TIMEOUT).await.is_ok();
        traffic_log::log_ping(&url, ok);
        ok
    }

    fn create_chat_model(&self, model_name: &str) -> Arc<dyn ChatModel + Send + Sync> {
        Arc::new(OllamaChatModel::new(
            self.client.clone(),
            self.base_url.clone(),
            model_name.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::{Router, body::Body, routing::get, routing::post};

    fn tags_router(body: &'static str) -> Router {
        Router::new().route("/api/tags", get(move || async move { body }))
    }

    #[tokio::test]
    async fn test_list_models() {
        let base = spawn_server(tags_router(
            r#"{"models":[{"name":"llama3.2:latest"},{"name":"qwen2.5:7b"}]}"#,
        ))
        .await;

        let provider = OllamaProvider::new(&base);
        assert_eq!(provider.list_models().await, vec!["llama3.2:latest", "qwen2.5:7b"]);
        assert!(provider.is_available().await);
    }

    #[tokio::test]
    async fn test_malformed_tags_reply_yields_empty_list() {
        let base = spawn_server(tags_router("not json")).await;

        let provider = OllamaProvider::new(&base);
        assert!(provider.list_models().await.is_empty());
        // The server answered, so it is reachable even though the body was junk
        assert!(provider.is_available().await);
    }

    #[tokio::test]
    async fn test_error_status_still_counts_as_running() {
        let router = Router::new().route(
            "/api/tags",
            get(|| async { axum::http::StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = spawn_server(router).await;

        let provider = OllamaProvider::new(&base);
        assert!(provider.is_available().await);
        assert!(provider.list_models().await.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_server() {
        let provider = OllamaProvider::new("http://127.0.0.1:1");
        assert!(provider.list_models().await.is_empty());
        assert!(!provider.is_available().await);
    }

    #[tokio::test]
    async fn test_base_url_trailing_slash_is_trimmed() {
        let provider = OllamaProvider::new("http://localhost:11434/");
        assert_eq!(provider.base_url(), "http://localhost:11434");
        assert_eq!(OllamaProvider::default().base_url(), DEFAULT_BASE_URL);
    }

    #[tokio::test]
    async fn test_smoke_test() {
        let router = Router::new().route(
            "/api/chat",
            post(|| async {
                Body::from("{\"message\":{\"role\":\"assistant\",\"content\":\"Ready!\"},\"done\":true}\n")
            }),
        );
        let base = spawn_server(router).await;

        let provider = OllamaProvider::new(&base);
        assert!(provider.smoke_test("llama3.2").await.is_ok());
        assert!(OllamaProvider::new("http://127.0.0.1:1").smoke_test("llama3.2").await.is_err());
    }
}
