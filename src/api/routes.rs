use axum::{routing::get, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::admin::admin_routes;
use super::auth::auth_routes;
use super::feedback::feedback_routes;
use super::health::{health_check, root};
use super::state::AppState;
use super::video::video_routes;
use crate::auth::{cors_layer, security_headers_layer};

pub fn create_routes(state: AppState) -> Router {
    let uploads = ServeDir::new(state.storage_service.upload_dir());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .with_state(state.clone())
        .nest("/auth", auth_routes(state.auth_service.clone()))
        .nest("/video", video_routes(state.clone()))
        .nest("/feedback", feedback_routes(state.clone()))
        .nest("/admin", admin_routes(state))
        .nest_service("/uploads", uploads)
        .layer(security_headers_layer())
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}
