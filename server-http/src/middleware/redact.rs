use crate::api::responses::ErrorResponse;
use crate::error::GENERIC_SERVER_ERROR;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};

/// In hardened mode no 5xx body leaves the process; the detail is already in
/// the log.
pub async fn redact_server_errors(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let response = next.run(request).await;
    if state.hardened && response.status().is_server_error() {
        return (
            response.status(),
            Json(ErrorResponse::new(GENERIC_SERVER_ERROR)),
        )
            .into_response();
    }
    response
}
