pub(crate) mod ollama;

pub use ollama::{DEFAULT_BASE_URL, OllamaChatModel, OllamaProvider, TAGS_TIMEOUT};
