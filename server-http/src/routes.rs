use crate::handlers;
use crate::middleware;
use crate::state::AppState;
use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: AppState) -> Router {
    // JSON admin endpoints; the page at /admin stays public.
    let admin = Router::new()
        .route(
            "/admin/polls",
            get(handlers::list_polls).post(handlers::create_poll),
        )
        .route("/admin/polls/{id}/activate", post(handlers::activate_poll))
        .route(
            "/admin/polls/{id}/deactivate",
            post(handlers::deactivate_poll),
        )
        .route("/admin/quota", get(handlers::quota_status))
        .route_layer(from_fn_with_state(
            state.clone(),
            middleware::require_admin,
        ));

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/videos", get(handlers::list_videos))
        .route("/channels", get(handlers::list_channels))
        .route("/news", get(handlers::list_news))
        .route("/scores", get(handlers::list_scores))
        .route("/polls/active", get(handlers::active_poll))
        .route("/polls/{id}/vote", post(handlers::cast_vote))
        .route("/admin", get(handlers::admin_page))
        .merge(admin)
        .layer(from_fn_with_state(
            state.clone(),
            middleware::redact_server_errors,
        ))
        .layer(NormalizePathLayer::trim_trailing_slash())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
