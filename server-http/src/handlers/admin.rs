use crate::api::requests::CreatePollRequest;
use crate::api::responses::{CreatePollResponse, ItemsResponse, PollResponse, QuotaResponse};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Html,
};
use pitchside::domain::Poll;
use tracing::info;

const ADMIN_PAGE: &str = include_str!("../../assets/admin.html");

/// GET /admin
pub async fn admin_page() -> Html<&'static str> {
    Html(ADMIN_PAGE)
}

/// GET /admin/polls
pub async fn list_polls(
    State(state): State<AppState>,
) -> Result<Json<ItemsResponse<Poll>>, ApiError> {
    let items = state.poll_admin.list().await?;
    info!("LIST_POLLS: {} polls", items.len());
    Ok(Json(ItemsResponse { items }))
}

/// POST /admin/polls
pub async fn create_poll(
    State(state): State<AppState>,
    body: Result<Json<CreatePollRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePollResponse>), ApiError> {
    let Json(req) = body?;
    info!("CREATE_POLL: question={}", req.question.trim());

    let (poll, options) = state.poll_admin.create(req.into()).await?;
    Ok((StatusCode::CREATED, Json(CreatePollResponse { poll, options })))
}

/// POST /admin/polls/{id}/activate
pub async fn activate_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<PollResponse>, ApiError> {
    info!("ACTIVATE_POLL: {}", poll_id);
    let poll = state.poll_admin.activate(&poll_id).await?;
    Ok(Json(PollResponse { ok: true, poll }))
}

/// POST /admin/polls/{id}/deactivate
pub async fn deactivate_poll(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
) -> Result<Json<PollResponse>, ApiError> {
    info!("DEACTIVATE_POLL: {}", poll_id);
    let poll = state.poll_admin.deactivate(&poll_id).await?;
    Ok(Json(PollResponse { ok: true, poll }))
}

/// GET /admin/quota
pub async fn quota_status(State(state): State<AppState>) -> Json<QuotaResponse> {
    let snapshot = state.quota.snapshot();
    let policy = state.quota.policy();

    Json(QuotaResponse {
        used: snapshot.used,
        remaining: policy
            .daily_max
            .saturating_sub(policy.safety_margin)
            .saturating_sub(snapshot.used),
        daily_max: policy.daily_max,
        safety_margin: policy.safety_margin,
        reset_at: snapshot.reset_at,
    })
}
