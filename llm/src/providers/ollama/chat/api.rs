use crate::{ChatRequest, api::Role};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct ModelDefinition {
    pub(crate) name: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct ListModelsResponse {
    #[serde(default)]
    pub(crate) models: Vec<ModelDefinition>,
}

// Ollama representation of messages.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct Message {
    #[serde(default)]
    pub(crate) role: Role,
    #[serde(default)]
    pub(crate) content: String,
}

impl From<&crate::ChatMessage> for Message {
    fn from(msg: &crate::ChatMessage) -> Message {
        Message {
            role: msg.role,
            content: msg.content.clone(),
        }
    }
}

/// Sampling options sent with every chat request.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub(crate) struct GenerationOptions {
    pub(crate) temperature: f32,
    pub(crate) top_p: f32,
    pub(crate) num_predict: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            temperature: 0.1,
            top_p: 0.9,
            num_predict: 2048,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct OllamaRequest {
    pub(crate) model: String,

    pub(crate) messages: Vec<Message>,

    pub(crate) stream: bool,

    pub(crate) options: GenerationOptions,
}

impl OllamaRequest {
    pub(crate) fn from_chat_request(model_name: &str, value: &ChatRequest) -> Self {
        let ollama_messages: Vec<_> = value.messages.iter().map(|msg| msg.into()).collect();

        OllamaRequest {
            model: model_name.to_string(),
            messages: ollama_messages,
            stream: true,
            options: GenerationOptions::default(),
        }
    }
}

/// One line of the streamed `/api/chat` response.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub(crate) struct OllamaResponse {
    #[serde(default)]
    pub(crate) message: Option<Message>,

    #[serde(default)]
    pub(crate) done: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

impl OllamaResponse {
    /// The incremental text carried by this line, if any.
    pub(crate) fn into_fragment(self) -> anyhow::Result<Option<String>> {
        if let Some(error) = self.error {
            return Err(anyhow::anyhow!("Ollama error: {}", error));
        }
        Ok(self
            .message
            .map(|m| m.content)
            .filter(|content| !content.is_empty()))
    }
}
