use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::api::users;
use crate::auth::{
    api as auth_api,
    middleware::{access_gate, role_gate, RoleGuard},
    service::AuthService,
    JwtHandler,
};
use crate::middleware::request_logging;

/// Build the full application router.
///
/// Route layers run outermost-last-added, so every protected group adds
/// `role_gate` first and `access_gate` second: the token is checked before
/// the role.
pub fn build_router(service: AuthService) -> Router {
    let jwt: Arc<JwtHandler> = service.jwt().clone();

    let public_routes = Router::new()
        .route("/api/v1/auth/signup", post(auth_api::signup))
        .route("/api/v1/auth/login", post(auth_api::login))
        .route("/api/v1/auth/refresh", post(auth_api::refresh))
        .route("/health", get(health_check));

    let user_routes = Router::new()
        .route("/api/v1/auth/me", get(auth_api::get_current_user))
        .route_layer(middleware::from_fn_with_state(RoleGuard::ANY_USER, role_gate))
        .route_layer(middleware::from_fn_with_state(jwt.clone(), access_gate));

    let admin_routes = Router::new()
        .route(
            "/api/v1/users",
            post(users::create_user).get(users::list_users),
        )
        .route(
            "/api/v1/users/:id",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(RoleGuard::ADMIN, role_gate))
        .route_layer(middleware::from_fn_with_state(jwt, access_gate));

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .with_state(service)
        .layer(middleware::from_fn(request_logging))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}
