use crate::AppState;
use crate::error::ServerError;
use crate::page::IndexPage;
use crate::sessions::Session;
use askama::Template;
use axum::Json;
use axum::extract::{Form, Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{Html, IntoResponse, Redirect, Response};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use smartbank_core::EngineEvent;
use std::convert::Infallible;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
pub struct MessageForm {
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct ModelForm {
    model: String,
}

#[derive(Debug, Serialize)]
pub struct TestReport {
    ok: bool,
    message: String,
}

pub async fn index(State(state): State<AppState>, session: Session) -> Result<Response, ServerError> {
    let provider = state.provider();
    let available = provider.is_available().await;
    let models = if available {
        provider.list_models().await
    } else {
        Vec::new()
    };

    let mut store = session.store.lock().await;
    // The model picker always shows a selection; keep the store in line with it
    if let Some(first) = models.first() {
        if !models.iter().any(|m| m == store.selected_model()) {
            debug!(from = store.selected_model(), to = %first, "Selected model not installed");
            store.select_model(first.clone());
        }
    }

    let html = IndexPage::new(&store, available, models).render()?;
    Ok((session.set_cookie(), Html(html)).into_response())
}

pub async fn post_message(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<MessageForm>,
) -> Response {
    if form.message.trim().is_empty() {
        return (StatusCode::BAD_REQUEST, session.set_cookie(), "Message is empty").into_response();
    }

    let provider = state.provider();
    if !provider.is_available().await || provider.list_models().await.is_empty() {
        warn!(session = %session.id, "Rejecting message, no model endpoint or no models installed");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            session.set_cookie(),
            "Model endpoint unavailable",
        )
            .into_response();
    }

    let (tx, rx) = mpsc::unbounded_channel();
    let engine = state.engine.clone();
    let store = session.store.clone();
    let session_id = session.id;
    let text = form.message;
    tokio::spawn(async move {
        let mut store = store.lock().await;
        let outcome = engine.submit(&mut store, &text, &tx).await;
        info!(session = %session_id, ?outcome, turns = store.active().len(), "Submission finished");
    });

    let events = UnboundedReceiverStream::new(rx).map(|event| Ok::<_, Infallible>(sse_event(event)));
    (
        session.set_cookie(),
        Sse::new(events).keep_alive(KeepAlive::default()),
    )
        .into_response()
}

fn sse_event(event: EngineEvent) -> Event {
    let (name, text) = match event {
        EngineEvent::Fragment(text) => ("fragment", text),
        EngineEvent::Refused(text) => ("refused", text),
        EngineEvent::Completed(text) => ("complete", text),
        EngineEvent::Failed(text) => ("error", text),
    };

    // JSON keeps newlines in model output out of the SSE framing
    Event::default().event(name).json_data(&text).unwrap_or_else(|e| {
        warn!("Failed to encode {} event: {}", name, e);
        Event::default().event("error").data("encoding failed")
    })
}

pub async fn new_chat(session: Session) -> Response {
    if let Some(id) = session.store.lock().await.new_chat() {
        debug!(session = %session.id, id, "Started new chat");
    }
    (session.set_cookie(), Redirect::to("/")).into_response()
}

pub async fn open_chat(session: Session, Path(id): Path<i64>) -> Result<Response, ServerError> {
    session.store.lock().await.open(id)?;
    Ok((session.set_cookie(), Redirect::to("/")).into_response())
}

pub async fn delete_chat(session: Session, Path(id): Path<i64>) -> Result<Response, ServerError> {
    session.store.lock().await.delete(id)?;
    Ok((session.set_cookie(), Redirect::to("/")).into_response())
}

pub async fn select_model(session: Session, Form(form): Form<ModelForm>) -> Response {
    let model = form.model.trim();
    if model.is_empty() {
        return (StatusCode::BAD_REQUEST, session.set_cookie(), "Model name is empty").into_response();
    }

    session.store.lock().await.select_model(model);
    (session.set_cookie(), Redirect::to("/")).into_response()
}

pub async fn test_model(State(state): State<AppState>, session: Session) -> Response {
    let model = session.store.lock().await.selected_model().to_string();
    let report = match state.provider().smoke_test(&model).await {
        Ok(()) => TestReport {
            ok: true,
            message: "✅ Test OK!".to_string(),
        },
        Err(e) => {
            warn!(model = %model, "Smoke test failed: {:#}", e);
            TestReport {
                ok: false,
                message: format!("❌ Test failed: {:#}", e),
            }
        }
    };
    (session.set_cookie(), Json(report)).into_response()
}

pub async fn health() -> &'static str {
    "ok"
}
