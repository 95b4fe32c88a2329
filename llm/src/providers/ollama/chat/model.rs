use super::api::{OllamaRequest, OllamaResponse};
use crate::client::Client;
use crate::traffic_log;
use crate::{ChatModel, ChatRequest, ReplyChunk, ReplyStream};
use async_trait::async_trait;
use futures::{StreamExt, future, stream};

pub struct OllamaChatModel {
    client: Client,
    base_url: String,
    model_name: String,
}

impl OllamaChatModel {
    pub fn new(client: Client, base_url: String, model_name: String) -> Self {
        OllamaChatModel {
            client,
            base_url,
            model_name,
        }
    }
}

#[derive(Default)]
struct ReplyState {
    full_text: String,
    chunk_count: u64,
    finished: bool,
}

#[async_trait]
impl ChatModel for OllamaChatModel {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn stream_chat(&self, request: &ChatRequest) -> anyhow::Result<ReplyStream> {
        let url = format!("{}/api/chat", self.base_url);

        let api_request = OllamaRequest::from_chat_request(&self.model_name, request);
        traffic_log::log_stream_start(&self.model_name, &api_request);

        let lines = match self
            .client
            .post_ndjson::<_, _, OllamaResponse>(url, &api_request)
            .await
        {
            Ok(lines) => lines,
            Err(e) => {
                traffic_log::log_error(&self.model_name, &e.to_string());
                return Err(e);
            }
        };

        let model_name = self.model_name.clone();
        // A trailing `None` marks a clean end of the body and releases the full text.
        let replies = lines
            .map(Some)
            .chain(stream::once(future::ready(None)))
            .scan(ReplyState::default(), move |state, line| {
                if state.finished {
                    return future::ready(None);
                }

                let item = match line {
                    Some(Ok(line)) => {
                        let done = line.done;
                        match line.into_fragment() {
                            Ok(Some(text)) => {
                                state.full_text.push_str(&text);
                                state.chunk_count += 1;
                                Some(Ok(ReplyChunk::Fragment(text)))
                            }
                            Ok(None) => {
                                if done {
                                    tracing::trace!(model = %model_name, "Ollama reported done");
                                }
                                None
                            }
                            Err(e) => Some(Err(e)),
                        }
                    }
                    Some(Err(e)) => Some(Err(e)),
                    None => {
                        traffic_log::log_stream_end(
                            &model_name,
                            state.chunk_count,
                            state.full_text.chars().count(),
                        );
                        Some(Ok(ReplyChunk::Complete(std::mem::take(&mut state.full_text))))
                    }
                };

                if let Some(Err(e)) = &item {
                    traffic_log::log_error(&model_name, &e.to_string());
                    state.finished = true;
                }

                future::ready(Some(item))
            })
            .filter_map(future::ready);

        Ok(Box::pin(replies))
    }
}
