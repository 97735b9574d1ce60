use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use axum_extra::extract::Multipart;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::api::error::{ensure_user_access, validate_page, ApiError};
use crate::api::state::AppState;
use crate::auth::{jwt_auth_middleware, UserRole, UserSession};
use crate::models::{
    AnalysisResult, NewVideo, ProcessingStatus, VideoDetails, VideoList, VideoUploadResponse,
};
use crate::services::video_storage_service::{is_video_content_type, StoredVideo};

/// Multipart body overhead allowed on top of the video itself
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn video_routes(state: AppState) -> Router {
    let body_limit = state.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES);

    Router::new()
        .route(
            "/upload",
            post(upload_video).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route("/user/:user_id", get(list_user_videos))
        .route("/:video_id", get(get_video))
        .route_layer(middleware::from_fn_with_state(
            state.auth_service.clone(),
            jwt_auth_middleware,
        ))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct VideoListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

struct UploadForm {
    file_name: Option<String>,
    content_type: Option<String>,
    data: Bytes,
    exercise_type: Option<String>,
}

async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut file: Option<(Option<String>, Option<String>, Bytes)> = None;
    let mut exercise_type: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        ApiError::InvalidRequest("Failed to read upload data".to_string())
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    error!("Failed to read video bytes: {}", e);
                    ApiError::InvalidRequest("Failed to read video data".to_string())
                })?;
                file = Some((file_name, content_type, data));
            }
            "exercise_type" => {
                let text = field.text().await.map_err(|_| {
                    ApiError::InvalidRequest("Failed to read exercise_type".to_string())
                })?;
                let text = text.trim();
                if !text.is_empty() {
                    exercise_type = Some(text.to_string());
                }
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| ApiError::InvalidRequest("Video file is required".to_string()))?;

    Ok(UploadForm {
        file_name,
        content_type,
        data,
        exercise_type,
    })
}

/// Upload a video, analyse it and store the feedback
#[tracing::instrument(skip(state, session, multipart), fields(user_id = session.user_id))]
async fn upload_video(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    multipart: Multipart,
) -> Result<Json<VideoUploadResponse>, ApiError> {
    if session.role != UserRole::User {
        return Err(ApiError::Forbidden);
    }

    let form = read_upload_form(multipart).await?;

    let content_type = form.content_type.unwrap_or_default();
    if !is_video_content_type(&content_type) {
        return Err(ApiError::InvalidRequest("File must be a video".to_string()));
    }
    if form.data.len() > state.max_upload_bytes {
        return Err(ApiError::InvalidRequest(format!(
            "Video file too large (maximum {} bytes)",
            state.max_upload_bytes
        )));
    }

    let stored = state
        .storage_service
        .save_video(form.file_name.as_deref(), &content_type, form.data)
        .await
        .map_err(ApiError::Storage)?;

    let result = run_analysis(&state, &stored, form.exercise_type.clone()).await;

    let status = if result.is_failed() {
        ProcessingStatus::Failed
    } else {
        ProcessingStatus::Processed
    };

    if result.is_failed() {
        remove_stored_video(&state, &stored).await;
    }

    let new_video = NewVideo {
        user_id: session.user_id,
        video_name: stored.file_name.clone(),
        file_path: stored.path.to_string_lossy().into_owned(),
        class_label: result.label.to_string(),
        confidence: result.confidence,
        is_simulated: result.is_simulated,
        exercise_type: form.exercise_type,
        status,
        feedback_text: result.feedback.clone(),
    };

    let recorded = state.video_service.record_video(&new_video).await;

    let video_id = match recorded {
        Ok(video_id) => video_id,
        Err(e) => {
            if !result.is_failed() {
                remove_stored_video(&state, &stored).await;
            }
            return Err(ApiError::Database(e));
        }
    };

    if result.is_failed() {
        warn!("Video {} rejected: {}", video_id, result.feedback);
        return Err(ApiError::AnalysisRejected(result.feedback));
    }

    info!(
        video_id,
        label = %result.label,
        confidence = result.confidence,
        simulated = result.is_simulated,
        "Video uploaded and analysed"
    );

    Ok(Json(VideoUploadResponse {
        message: "Video uploaded and analyzed successfully".to_string(),
        video_id,
        feedback: result.feedback,
        class_label: result.label.to_string(),
        confidence: result.confidence,
        is_simulated: result.is_simulated,
        improvement_suggestions: result.suggestions,
    }))
}

/// Decode and classify off the async runtime
async fn run_analysis(
    state: &AppState,
    stored: &StoredVideo,
    exercise_type: Option<String>,
) -> AnalysisResult {
    let analysis_service = state.analysis_service.clone();
    let path = stored.path.clone();

    tokio::task::spawn_blocking(move || analysis_service.analyze(&path, exercise_type.as_deref()))
        .await
        .unwrap_or_else(|e| {
            error!("Analysis task failed: {}", e);
            AnalysisResult::failed(format!("Error analyzing video: {}", e))
        })
}

async fn remove_stored_video(state: &AppState, stored: &StoredVideo) {
    if let Err(e) = state.storage_service.delete_video(&stored.path).await {
        error!("Failed to clean up {:?}: {:#}", stored.path, e);
    }
}

/// Videos of a user with their feedback, newest first
#[tracing::instrument(skip(state, session))]
async fn list_user_videos(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(user_id): Path<i64>,
    Query(query): Query<VideoListQuery>,
) -> Result<Json<VideoList>, ApiError> {
    ensure_user_access(&session, user_id)?;
    let (limit, offset) = validate_page(query.limit, query.offset, 10, 100)?;

    let videos = state
        .video_service
        .list_user_videos(user_id, limit, offset)
        .await
        .map_err(ApiError::Database)?;

    Ok(Json(videos))
}

#[tracing::instrument(skip(state, session))]
async fn get_video(
    State(state): State<AppState>,
    Extension(session): Extension<UserSession>,
    Path(video_id): Path<i64>,
) -> Result<Json<VideoDetails>, ApiError> {
    let video = state
        .video_service
        .get_video_details(video_id)
        .await
        .map_err(ApiError::Database)?
        .ok_or(ApiError::NotFound("Video"))?;

    ensure_user_access(&session, video.user_id)?;

    Ok(Json(video))
}
