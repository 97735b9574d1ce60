use axum::{extract::State, response::Json, routing::post, Router};

use crate::auth::{
    AdminAuthResponse, AdminLoginRequest, AuthError, AuthResponse, AuthService, LoginRequest,
    RegisterRequest, RegisterResponse,
};

/// Authentication routes
pub fn auth_routes(auth_service: AuthService) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
        .with_state(auth_service)
}

/// Register a new user
#[tracing::instrument(skip(auth_service, request))]
async fn register(
    State(auth_service): State<AuthService>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AuthError> {
    let response = auth_service.register(request).await?;
    Ok(Json(response))
}

/// Login user
#[tracing::instrument(skip(auth_service, request))]
async fn login(
    State(auth_service): State<AuthService>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AuthError> {
    let response = auth_service.login(request).await?;
    Ok(Json(response))
}

/// Login admin
#[tracing::instrument(skip(auth_service, request))]
async fn admin_login(
    State(auth_service): State<AuthService>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<Json<AdminAuthResponse>, AuthError> {
    let response = auth_service.admin_login(request).await?;
    Ok(Json(response))
}
