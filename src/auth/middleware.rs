//! Authentication Middleware
//! Mission: Gate protected routes on a valid bearer token and an allowed role
//!
//! The checks are plain functions over headers and claims. The axum
//! middleware below only adapts them to the request pipeline: a route is
//! protected by layering `access_gate` and then `role_gate`.

use crate::auth::{
    jwt::JwtHandler,
    models::{Claims, Role},
};
use crate::error::{ApiError, AuthFailure};
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, error};

/// Pull the token out of `Authorization: Bearer <token>`.
///
/// Any other scheme, a missing header, or an empty token counts as no token.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let missing = || ApiError::AuthRequired(AuthFailure::MissingToken);

    let value = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(missing)?;

    let (scheme, token) = value.split_once(' ').ok_or_else(missing)?;
    if scheme != "Bearer" || token.is_empty() || token.contains(' ') {
        return Err(missing());
    }

    Ok(token)
}

/// Verify the bearer token and return its claims.
pub fn authenticate(headers: &HeaderMap, jwt: &JwtHandler) -> Result<Claims, ApiError> {
    let token = extract_bearer(headers)?;
    jwt.verify_access(token)
        .map_err(|e| ApiError::AuthRequired(e.into()))
}

/// Allow `actual` only if it is one of `required`.
pub fn authorize(required: &[Role], actual: Role) -> Result<(), ApiError> {
    if required.contains(&actual) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

/// Access gate: validates the token and attaches `Claims` to the request.
pub async fn access_gate(
    State(jwt): State<Arc<JwtHandler>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authenticate(req.headers(), &jwt).map_err(|e| {
        debug!(path = %req.uri().path(), "Access gate rejected request: {}", e);
        e
    })?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Role set a route admits.
#[derive(Debug, Clone, Copy)]
pub struct RoleGuard {
    pub allowed: &'static [Role],
}

impl RoleGuard {
    pub const ANY_USER: RoleGuard = RoleGuard {
        allowed: &[Role::User, Role::Admin],
    };
    pub const ADMIN: RoleGuard = RoleGuard {
        allowed: &[Role::Admin],
    };
}

/// Role gate: must be layered inside `access_gate`.
pub async fn role_gate(
    State(guard): State<RoleGuard>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(claims) = extract_claims(&req) else {
        error!(
            path = %req.uri().path(),
            "role_gate reached without claims; access_gate is missing from this route"
        );
        return Err(ApiError::Server(anyhow::anyhow!(
            "role gate ran before access gate"
        )));
    };

    authorize(guard.allowed, claims.role)?;

    Ok(next.run(req).await)
}

/// Extract claims from request (use after access_gate)
pub fn extract_claims(req: &Request) -> Option<&Claims> {
    req.extensions().get::<Claims>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, TokenSettings};
    use axum::{body::Body, http::HeaderValue, http::Request as HttpRequest};
    use std::time::Duration;

    fn handler() -> JwtHandler {
        JwtHandler::new(&AuthConfig {
            access: TokenSettings {
                secret: "access-secret".into(),
                ttl: Duration::from_secs(900),
            },
            refresh: TokenSettings {
                secret: "refresh-secret".into(),
                ttl: Duration::from_secs(3600),
            },
        })
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn assert_missing(result: Result<&str, ApiError>) {
        assert!(matches!(
            result,
            Err(ApiError::AuthRequired(AuthFailure::MissingToken))
        ));
    }

    #[test]
    fn test_extract_bearer() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn test_non_bearer_schemes_are_missing_token() {
        assert_missing(extract_bearer(&HeaderMap::new()));
        assert_missing(extract_bearer(&headers_with("Basic dXNlcjpwYXNz")));
        assert_missing(extract_bearer(&headers_with("bearer abc")));
        assert_missing(extract_bearer(&headers_with("Bearer")));
        assert_missing(extract_bearer(&headers_with("Bearer ")));
        assert_missing(extract_bearer(&headers_with("Bearer a b")));
        assert_missing(extract_bearer(&headers_with("abc.def.ghi")));
    }

    #[test]
    fn test_authenticate_valid_token() {
        let jwt = handler();
        let pair = jwt.issue("user-1", Role::User).unwrap();

        let claims =
            authenticate(&headers_with(&format!("Bearer {}", pair.access_token)), &jwt).unwrap();
        assert_eq!(claims.sub, "user-1");
    }

    #[test]
    fn test_authenticate_refresh_token_is_invalid() {
        let jwt = handler();
        let pair = jwt.issue("user-1", Role::User).unwrap();

        let err = authenticate(&headers_with(&format!("Bearer {}", pair.refresh_token)), &jwt)
            .unwrap_err();
        assert!(matches!(err, ApiError::AuthRequired(AuthFailure::Invalid)));
    }

    #[test]
    fn test_authorize_membership() {
        assert!(authorize(&[Role::Admin], Role::Admin).is_ok());
        assert!(authorize(&[Role::User, Role::Admin], Role::User).is_ok());
        assert!(matches!(
            authorize(&[Role::Admin], Role::User),
            Err(ApiError::Forbidden)
        ));
        // Membership, not hierarchy
        assert!(authorize(&[Role::User], Role::Admin).is_err());
        assert!(authorize(&[], Role::Admin).is_err());
    }

    #[test]
    fn test_extract_claims_from_request() {
        let mut req = HttpRequest::new(Body::empty());
        assert!(extract_claims(&req).is_none());

        req.extensions_mut().insert(Claims {
            sub: "user-1".into(),
            role: Role::User,
            iat: 0,
            exp: 1,
        });

        assert_eq!(extract_claims(&req).unwrap().sub, "user-1");
    }
}
