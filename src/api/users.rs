//! Admin user management - /api/v1/users
//!
//! Every route here sits behind the access gate and the ADMIN role gate.

use crate::api::response::ApiResponse;
use crate::auth::{
    models::{Claims, CreateUserRequest, Role, SignupRequest, UserResponse, UserUpdate},
    service::AuthService,
};
use crate::error::ApiError;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub query: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    10
}

impl ListUsersQuery {
    fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        if self.page < 1 {
            problems.push("page must not be less than 1".to_string());
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.limit) {
            problems.push(format!("limit must be between 1 and {MAX_PAGE_SIZE}"));
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(ApiError::InvalidInput(problems))
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u64,
}

impl Pagination {
    pub fn new(total: u64, page: u32, limit: u32) -> Self {
        Self {
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit.max(1) as u64),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserResponse>,
    pub pagination: Pagination,
}

fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::InvalidInput(vec!["id must be a UUID".to_string()]))
}

fn not_found() -> ApiError {
    ApiError::ResourceNotFound("User not found".to_string())
}

/// POST /api/v1/users
pub async fn create_user(
    State(service): State<AuthService>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let Json(payload) = payload?;
    payload.validate()?;

    let role = payload.role.unwrap_or(Role::User);
    let user = service
        .register(
            SignupRequest {
                fullname: payload.fullname,
                email: payload.email,
                password: payload.password,
            },
            role,
        )
        .await?;

    info!("✅ User created by admin: {} ({})", user.id, role);

    Ok(ApiResponse::created("Account created successfully", user))
}

/// GET /api/v1/users
pub async fn list_users(
    State(service): State<AuthService>,
    params: Result<Query<ListUsersQuery>, QueryRejection>,
) -> Result<ApiResponse<UserList>, ApiError> {
    let Query(params) = params?;
    params.validate()?;

    let page = service
        .store()
        .list(params.query.as_deref(), params.page, params.limit)
        .await?;

    Ok(ApiResponse::ok(
        "Users retrieved",
        UserList {
            users: page.items.iter().map(UserResponse::from).collect(),
            pagination: Pagination::new(page.total, params.page, params.limit),
        },
    ))
}

/// GET /api/v1/users/:id
pub async fn get_user(
    State(service): State<AuthService>,
    Path(id): Path<String>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    let user = service.store().find_by_id(&id).await?.ok_or_else(not_found)?;

    Ok(ApiResponse::ok("User retrieved", UserResponse::from(&user)))
}

/// PUT /api/v1/users/:id
pub async fn update_user(
    State(service): State<AuthService>,
    Path(id): Path<String>,
    payload: Result<Json<UserUpdate>, JsonRejection>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let id = parse_id(&id)?;
    let Json(update) = payload?;
    update.validate()?;

    let user = service.store().update(&id, update).await?;

    Ok(ApiResponse::ok("User updated", UserResponse::from(&user)))
}

/// DELETE /api/v1/users/:id
pub async fn delete_user(
    State(service): State<AuthService>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<ApiResponse<UserResponse>, ApiError> {
    let id = parse_id(&id)?;

    if id.to_string() == claims.sub {
        return Err(ApiError::InvalidInput(vec![
            "Cannot delete your own account".to_string(),
        ]));
    }

    let user = service.store().delete(&id).await?;
    info!("🗑️  User deleted by {}: {}", claims.sub, id);

    Ok(ApiResponse::ok("User deleted", UserResponse::from(&user)))
}
