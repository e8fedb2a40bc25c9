use crate::api::requests::{ActivePollQuery, VoteRequest};
use crate::api::responses::VoteResponse;
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
};
use pitchside::polls::ActivePollView;
use tracing::info;

/// GET /polls/active?device=
pub async fn active_poll(
    State(state): State<AppState>,
    Query(query): Query<ActivePollQuery>,
) -> Result<Json<Option<ActivePollView>>, ApiError> {
    let view = state.polls.active_poll(query.device.as_deref()).await?;
    Ok(Json(view))
}

/// POST /polls/{id}/vote
pub async fn cast_vote(
    State(state): State<AppState>,
    Path(poll_id): Path<String>,
    body: Result<Json<VoteRequest>, JsonRejection>,
) -> Result<Json<VoteResponse>, ApiError> {
    let Json(req) = body?;
    info!("VOTE: poll={}, option={}", poll_id, req.option_id);

    let receipt = state
        .polls
        .cast_vote(&poll_id, &req.option_id, &req.device_id_hash)
        .await?;

    Ok(Json(VoteResponse {
        ok: true,
        totals: receipt.totals,
    }))
}
