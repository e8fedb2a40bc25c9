use crate::api::requests::AdminSecretQuery;
use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Query, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use pitchside::auth::AdminAccess;
use tracing::warn;

pub const ADMIN_SECRET_HEADER: &str = "x-admin-secret";

/// Admin gate: the shared secret comes from the `x-admin-secret` header or,
/// failing that, the `secret` query parameter.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = provided_secret(&request);

    match state.admin_gate.check(provided.as_deref()) {
        AdminAccess::Granted => Ok(next.run(request).await),
        AdminAccess::Denied => {
            warn!("ADMIN: rejected {} {}", request.method(), request.uri().path());
            Err(ApiError::new(StatusCode::UNAUTHORIZED, "invalid admin secret"))
        }
        AdminAccess::Disabled => Err(ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "admin operations are disabled",
        )),
    }
}

fn provided_secret(request: &Request) -> Option<String> {
    let header = request
        .headers()
        .get(ADMIN_SECRET_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(String::from);

    header.or_else(|| {
        Query::<AdminSecretQuery>::try_from_uri(request.uri())
            .ok()
            .and_then(|Query(query)| query.secret)
    })
}
