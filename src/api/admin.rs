use axum::{extract::State, middleware, response::Json, routing::get, Router};

use crate::api::error::ApiError;
use crate::api::state::AppState;
use crate::auth::{admin_only_middleware, jwt_auth_middleware};
use crate::models::{DashboardStats, RecentVideoList, UserActivityList};

/// Dashboard routes; every request needs an admin token
pub fn admin_routes(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(dashboard_stats))
        .route("/videos", get(recent_videos))
        .route("/users", get(user_activity))
        .route_layer(middleware::from_fn(admin_only_middleware))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[tracing::instrument(skip(state))]
async fn dashboard_stats(State(state): State<AppState>) -> Result<Json<DashboardStats>, ApiError> {
    let stats = state
        .admin_service
        .dashboard_stats()
        .await
        .map_err(ApiError::Database)?;

    Ok(Json(stats))
}

#[tracing::instrument(skip(state))]
async fn recent_videos(State(state): State<AppState>) -> Result<Json<RecentVideoList>, ApiError> {
    let videos = state
        .admin_service
        .recent_videos()
        .await
        .map_err(ApiError::Database)?;

    Ok(Json(RecentVideoList { videos }))
}

#[tracing::instrument(skip(state))]
async fn user_activity(State(state): State<AppState>) -> Result<Json<UserActivityList>, ApiError> {
    let users = state
        .admin_service
        .user_activity()
        .await
        .map_err(ApiError::Database)?;

    Ok(Json(UserActivityList { users }))
}
