use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use smartbank_core::StoreError;

/// Handler error. Store misuse becomes a 404, everything else a 500.
#[derive(Debug)]
pub struct ServerError(anyhow::Error);

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        if let Some(e) = self.0.downcast_ref::<StoreError>() {
            return (StatusCode::NOT_FOUND, e.to_string()).into_response();
        }

        tracing::error!("Request failed: {:#}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("SmartBank server error: {}", self.0),
        )
            .into_response()
    }
}

impl<E> From<E> for ServerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
