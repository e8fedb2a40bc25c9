use crate::api::requests::{ScoresQuery, VideosQuery};
use crate::api::responses::{ItemsResponse, PagedResponse};
use crate::error::ApiError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use pitchside::domain::{ChannelProfile, MatchRecord, NewsRecord, ScoreScope, VideoRecord};
use tracing::info;

/// GET /videos?handle=
pub async fn list_videos(
    State(state): State<AppState>,
    Query(query): Query<VideosQuery>,
) -> Result<Json<PagedResponse<VideoRecord>>, ApiError> {
    let handle = query
        .handle
        .as_deref()
        .map(str::trim)
        .filter(|h| !h.is_empty());
    info!("VIDEOS: handle={}", handle.unwrap_or("*"));

    let items = state.videos.videos(handle).await?;
    Ok(Json(PagedResponse::single_page(items)))
}

/// GET /channels
pub async fn list_channels(
    State(state): State<AppState>,
) -> Result<Json<ItemsResponse<ChannelProfile>>, ApiError> {
    info!("CHANNELS: {} handles", state.roster.len());

    let items = state.channels.profiles(&state.roster).await?;
    Ok(Json(ItemsResponse { items }))
}

/// GET /news
pub async fn list_news(State(state): State<AppState>) -> Json<PagedResponse<NewsRecord>> {
    info!("NEWS");
    Json(PagedResponse::single_page(state.news.latest().await))
}

/// GET /scores?scope=live|today|upcoming
pub async fn list_scores(
    State(state): State<AppState>,
    Query(query): Query<ScoresQuery>,
) -> Result<Json<ItemsResponse<MatchRecord>>, ApiError> {
    let scope = match query.scope.as_deref() {
        Some(raw) => raw.parse::<ScoreScope>()?,
        None => ScoreScope::Live,
    };
    info!("SCORES: scope={}", scope);

    let items = state.scores.scores(scope).await;
    Ok(Json(ItemsResponse { items }))
}
