mod chat;
mod provider;

pub use chat::model::OllamaChatModel;
pub use provider::{DEFAULT_BASE_URL, OllamaProvider, TAGS_TIMEOUT};
