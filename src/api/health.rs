use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::api::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "ZumbaFit Pro API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "auth": "/auth",
            "videos": "/video",
            "feedback": "/feedback",
            "admin": "/admin",
            "uploads": "/uploads",
            "health": "/health"
        }
    }))
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "zumbafit",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "model_loaded": state.analysis_service.is_model_loaded()
    }))
}
