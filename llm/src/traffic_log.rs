//! Traffic logging for LLM API calls
//!
//! Emits request/response summaries under the `traffic` tracing target.
//! Content is truncated to avoid leaking customer data in logs.

use tracing::{debug, info, warn};

/// Maximum characters to log for content
const MAX_CONTENT_LOG_CHARS: usize = 200;

/// Truncate a string for logging, adding ellipsis if truncated
fn truncate_for_log(s: &str, max_chars: usize) -> String {
    let char_count = s.chars().count();
    if char_count <= max_chars {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_chars).collect();
        format!("{}... ({} chars total)", truncated, char_count)
    }
}

fn summarize(value: &impl serde::Serialize) -> String {
    let json = serde_json::to_string(value).unwrap_or_else(|_| "<serialization error>".to_string());
    truncate_for_log(&json, MAX_CONTENT_LOG_CHARS)
}

/// Log an LLM streaming start (truncated summary only)
pub fn log_stream_start(model: &str, request: &impl serde::Serialize) {
    info!(target: "traffic", model, "STREAM_START {}", summarize(request));
}

/// Log an LLM streaming end
pub fn log_stream_end(model: &str, chunk_count: u64, total_chars: usize) {
    info!(target: "traffic", model, chunks = chunk_count, chars = total_chars, "STREAM_END");
}

/// Log a ping or listing call
pub fn log_ping(url: &str, ok: bool) {
    debug!(target: "traffic", url, ok, "PING");
}

/// Log an LLM error
pub fn log_error(model: &str, error: &str) {
    warn!(target: "traffic", model, "ERROR {}", truncate_for_log(error, MAX_CONTENT_LOG_CHARS));
}
