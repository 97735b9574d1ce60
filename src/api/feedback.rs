use axum::{
    extract::{Path, Query, State},
    middleware,
    response::Json,
    routing::get,
    Extension, Router,
};
use serde::Deserialize;

use crate::api::error::{ensure_user_access, validate_page, ApiError};
use crate::api::state::AppState;
use crate::auth::{jwt_auth_middleware, UserSession};
use crate::models::{FeedbackReport, MusicRecommendation, PersonalizedFeedback};

pub fn feedback_routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/user/:user_id", get(list_user_feedback))
        .route("/personalized/:user_id", get(personalized_feedback))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .route("/music/recommendations", get(music_recommendations))
        .merge(protected)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct FeedbackQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MusicQuery {
    pub dance_style: Option<String>,
    pub limit: Option<i64>,
}

#[tracing::instrument(skip(state, session))]
async fn list_user_feedback(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(user_id): Path<i64>,
    Query(query): Query<FeedbackQuery>,
) -> Result<Json<Vec<FeedbackReport>>, ApiError> {
    ensure_user_access(&session, user_id)?;
    let (limit, offset) = validate_page(query.limit, query.offset, 10, 100)?;

    let reports = state
        .report_service
        .list_user_reports(user_id, limit, offset)
        .await
        .map_err(ApiError::Database)?;

    Ok(Json(reports))
}

#[tracing::instrument(skip(state))]
async fn music_recommendations(
    State(state): State<AppState>,
    Query(query): Query<MusicQuery>,
) -> Result<Json<Vec<MusicRecommendation>>, ApiError> {
    let (limit, _) = validate_page(query.limit, None, 10, 50)?;
    let dance_style = query
        .dance_style
        .as_deref()
        .map(str::trim)
        .filter(|style| !style.is_empty());

    let music = state
        .report_service
        .music_recommendations(dance_style, limit)
        .await
        .map_err(ApiError::Database)?;

    Ok(Json(music))
}

/// Latest feedback with matching music and suggestions
#[tracing::instrument(skip(state, session))]
async fn personalized_feedback(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(user_id): Path<i64>,
) -> Result<Json<PersonalizedFeedback>, ApiError> {
    ensure_user_access(&session, user_id)?;

    let feedback = state
        .report_service
        .personalized_feedback(user_id)
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("Feedback"))?;

    Ok(Json(feedback))
}
