//! End-to-end submissions against a mock Ollama server.

use axum::{Json, Router, body::Body, routing::post};
use futures::stream;
use smartbank_core::{
    ChatEngine, EngineEvent, REFUSAL_MESSAGE, Role, SYSTEM_PROMPT, SessionStore, SubmitOutcome,
};
use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[derive(Default)]
struct MockOllama {
    requests: Mutex<Vec<serde_json::Value>>,
}

async fn spawn_ollama(fragments: &'static [&'static str]) -> (String, Arc<MockOllama>) {
    let mock = Arc::new(MockOllama::default());
    let state = mock.clone();
    let router = Router::new().route(
        "/api/chat",
        post(move |Json(body): Json<serde_json::Value>| {
            let state = state.clone();
            async move {
                state.requests.lock().unwrap().push(body);
                let mut lines: Vec<Result<String, Infallible>> = fragments
                    .iter()
                    .map(|f| {
                        let line = serde_json::json!({
                            "message": { "role": "assistant", "content": f },
                            "done": false,
                        });
                        Ok(format!("{}\n", line))
                    })
                    .collect();
                lines.push(Ok("{\"message\":{\"role\":\"assistant\",\"content\":\"\"},\"done\":true}\n".to_string()));
                Body::from_stream(stream::iter(lines))
            }
        }),
    );

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{}", addr), mock)
}

fn engine_for(base_url: &str) -> ChatEngine {
    ChatEngine::new(Arc::new(llm::OllamaProvider::new(base_url)))
}

#[tokio::test]
async fn loan_emi_question_is_answered() {
    let (base, mock) = spawn_ollama(&["Your loan ", "EMI is ", "₹8,560 per month."]).await;
    let engine = engine_for(&base);
    let mut store = SessionStore::new("llama3.2");
    let (tx, mut rx) = mpsc::unbounded_channel();

    let outcome = engine.submit(&mut store, "What is my loan EMI?", &tx).await;
    drop(tx);

    assert_eq!(outcome, SubmitOutcome::Completed);

    let mut events = vec![];
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    assert_eq!(
        events,
        vec![
            EngineEvent::Fragment("Your loan ".to_string()),
            EngineEvent::Fragment("EMI is ".to_string()),
            EngineEvent::Fragment("₹8,560 per month.".to_string()),
            EngineEvent::Completed("Your loan EMI is ₹8,560 per month.".to_string()),
        ]
    );

    let requests = mock.requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let messages = requests[0]["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["role"], "system");
    assert_eq!(messages[0]["content"], SYSTEM_PROMPT);
    assert_eq!(messages[1]["role"], "user");
    assert_eq!(messages[1]["content"], "What is my loan EMI?");
    assert_eq!(requests[0]["options"]["temperature"], 0.1);

    let turns = store.active().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].role, Role::Assistant);
    assert_eq!(turns[1].content, "Your loan EMI is ₹8,560 per month.");
}

#[tokio::test]
async fn joke_request_is_refused_without_network() {
    let (base, mock) = spawn_ollama(&["never sent"]).await;
    let engine = engine_for(&base);
    let mut store = SessionStore::new("llama3.2");
    let (tx, _rx) = mpsc::unbounded_channel();

    let outcome = engine.submit(&mut store, "Tell me a joke", &tx).await;

    assert_eq!(outcome, SubmitOutcome::Refused);
    assert!(mock.requests.lock().unwrap().is_empty());
    let turns = store.active().turns();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1].content, REFUSAL_MESSAGE);
}

#[tokio::test]
async fn unreachable_server_leaves_session_usable() {
    let engine = engine_for("http://127.0.0.1:1");
    let mut store = SessionStore::new("llama3.2");
    let (tx, _rx) = mpsc::unbounded_channel();

    assert_eq!(
        engine.submit(&mut store, "check balance", &tx).await,
        SubmitOutcome::Failed
    );
    assert!(store.active().turns()[1].content.starts_with("❌ AI Error:"));

    assert_eq!(
        engine.submit(&mut store, "Tell me a joke", &tx).await,
        SubmitOutcome::Refused
    );
    assert_eq!(store.active().len(), 4);
}

#[tokio::test]
async fn archived_chat_reopens_with_history() {
    let (base, mock) = spawn_ollama(&["Done."]).await;
    let engine = engine_for(&base);
    let mut store = SessionStore::new("llama3.2");
    let (tx, _rx) = mpsc::unbounded_channel();

    engine.submit(&mut store, "Block my debit card", &tx).await;
    let id = store.new_chat().unwrap();
    assert_eq!(store.archive()[0].preview, "Block my debit card");

    store.open(id).unwrap();
    engine.submit(&mut store, "Also reset my PIN", &tx).await;

    let requests = mock.requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    // system + user + assistant + user
    assert_eq!(requests[1]["messages"].as_array().unwrap().len(), 4);
    assert_eq!(store.archive()[0].conversation.len(), 2);
    assert_eq!(store.active().len(), 4);
}
