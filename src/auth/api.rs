//! Authentication API Endpoints
//! Mission: Provide signup, login, refresh and current-user endpoints

use crate::api::response::ApiResponse;
use crate::auth::{
    models::{Claims, LoginRequest, LoginResponse, RefreshRequest, SignupRequest, UserResponse},
    service::AuthService,
};
use crate::error::ApiError;
use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use tracing::info;

/// Signup endpoint - POST /api/v1/auth/signup
pub async fn signup(
    State(service): State<AuthService>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let user = service.signup(payload).await?;
    info!("🆕 Account created: {}", user.id);

    Ok(ApiResponse::created("Account created successfully", user))
}

/// Login endpoint - POST /api/v1/auth/login
pub async fn login(
    State(service): State<AuthService>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let response = service.login(payload).await?;

    Ok(ApiResponse::ok("Login successful", response))
}

/// Token refresh - POST /api/v1/auth/refresh
pub async fn refresh(
    State(service): State<AuthService>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<ApiResponse<LoginResponse>, ApiError> {
    let Json(payload) = payload?;
    let response = service.refresh(&payload.refresh_token).await?;

    Ok(ApiResponse::ok("Token refreshed", response))
}

/// Get current user info - GET /api/v1/auth/me
pub async fn get_current_user(
    State(service): State<AuthService>,
    Extension(claims): Extension<Claims>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let user = service.current_user(&claims).await?;
    Ok(ApiResponse::ok("User retrieved", user))
}
