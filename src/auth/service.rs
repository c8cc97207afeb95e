//! Signup / Login Orchestration
//! Mission: Turn credentials into sanitized users and signed token pairs

use crate::auth::{
    jwt::{JwtHandler, TokenError},
    models::{
        Claims, LoginRequest, LoginResponse, NewUser, Role, SignupRequest, User, UserResponse,
    },
    password::{hash_password_async, verify_password_async},
    user_store::CredentialStore,
};
use crate::error::{ApiError, AuthFailure};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Shared auth services
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    jwt: Arc<JwtHandler>,
}

impl AuthService {
    pub fn new(store: Arc<dyn CredentialStore>, jwt: Arc<JwtHandler>) -> Self {
        Self { store, jwt }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn jwt(&self) -> &Arc<JwtHandler> {
        &self.jwt
    }

    /// Register a new USER account.
    pub async fn signup(&self, payload: SignupRequest) -> Result<UserResponse, ApiError> {
        self.register(payload, Role::User).await
    }

    /// Register an account with an explicit role (admin-side creation).
    pub async fn register(&self, payload: SignupRequest, role: Role) -> Result<UserResponse, ApiError> {
        if self.store.find_by_email(&payload.email).await?.is_some() {
            return Err(ApiError::DuplicateEntry(
                "You have an account with us".to_string(),
            ));
        }

        let password_hash = hash_password_async(payload.password).await?;

        // A concurrent signup for the same email surfaces as a store conflict.
        let user = self
            .store
            .create(NewUser {
                fullname: payload.fullname,
                email: payload.email,
                password_hash,
                role,
            })
            .await?;

        Ok(UserResponse::from(&user))
    }

    /// Check credentials and issue a token pair.
    pub async fn login(&self, payload: LoginRequest) -> Result<LoginResponse, ApiError> {
        let user = self
            .store
            .find_by_email(&payload.email)
            .await?
            .ok_or_else(|| ApiError::ResourceNotFound("User not found".to_string()))?;

        let matches = verify_password_async(payload.password, user.password_hash.clone()).await?;
        if !matches {
            warn!("❌ Failed login attempt for user {}", user.id);
            return Err(ApiError::InvalidCredentials);
        }

        let tokens = self.jwt.issue(&user.id.to_string(), user.role)?;

        info!("✅ Login successful: {} ({})", user.id, user.role);

        Ok(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: UserResponse::from(&user),
        })
    }

    /// Exchange a refresh token for a fresh pair.
    ///
    /// The role is re-read from the store so a changed role takes effect here.
    pub async fn refresh(&self, refresh_token: &str) -> Result<LoginResponse, ApiError> {
        let claims = self
            .jwt
            .verify_refresh(refresh_token)
            .map_err(|e| {
                ApiError::AuthRequired(match e {
                    TokenError::Expired => AuthFailure::RefreshExpired,
                    TokenError::Invalid => AuthFailure::RefreshInvalid,
                })
            })?;

        let user = self
            .find_subject(&claims)
            .await?
            .ok_or_else(|| ApiError::ResourceNotFound("User not found".to_string()))?;

        let tokens = self.jwt.issue(&user.id.to_string(), user.role)?;

        Ok(LoginResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            user: UserResponse::from(&user),
        })
    }

    /// Sanitized record of the authenticated subject.
    pub async fn current_user(&self, claims: &Claims) -> Result<UserResponse, ApiError> {
        self.find_subject(claims)
            .await?
            .map(|user| UserResponse::from(&user))
            .ok_or_else(|| ApiError::ResourceNotFound("User not found".to_string()))
    }

    async fn find_subject(&self, claims: &Claims) -> Result<Option<User>, ApiError> {
        // Our own tokens always carry a UUID subject.
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| ApiError::AuthRequired(AuthFailure::Invalid))?;
        Ok(self.store.find_by_id(&id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserUpdate;
    use crate::auth::password::hash_password;
    use crate::auth::user_store::{Page, SqliteUserStore, StoreError, StoreResult};
    use crate::config::{AuthConfig, TokenSettings};
    use async_trait::async_trait;
    use std::time::Duration;

    fn jwt() -> Arc<JwtHandler> {
        Arc::new(JwtHandler::new(&AuthConfig {
            access: TokenSettings {
                secret: "access-secret".into(),
                ttl: Duration::from_secs(900),
            },
            refresh: TokenSettings {
                secret: "refresh-secret".into(),
                ttl: Duration::from_secs(7 * 24 * 3600),
            },
        }))
    }

    fn service() -> (AuthService, Arc<SqliteUserStore>) {
        let store = Arc::new(SqliteUserStore::in_memory().unwrap());
        (AuthService::new(store.clone(), jwt()), store)
    }

    async fn seed(store: &SqliteUserStore, email: &str, password: &str) -> User {
        store
            .create(NewUser {
                fullname: "Seeded".into(),
                email: email.into(),
                password_hash: hash_password(password).unwrap(),
                role: Role::User,
            })
            .await
            .unwrap()
    }

    fn signup_payload(email: &str) -> SignupRequest {
        SignupRequest {
            fullname: "New Person".into(),
            email: email.into(),
            password: "Str0ng!pass".into(),
        }
    }

    #[tokio::test]
    async fn test_signup_creates_user_without_hash() {
        let (service, store) = service();

        let user = service.signup(signup_payload("new@mail.com")).await.unwrap();
        assert_eq!(user.email, "new@mail.com");
        assert_eq!(user.role, Role::User);

        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());

        let stored = store.find_by_email("new@mail.com").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "Str0ng!pass");
    }

    #[tokio::test]
    async fn test_signup_duplicate_email() {
        let (service, store) = service();
        seed(&store, "test@mail.com", "whatever").await;

        let err = service.signup(signup_payload("test@mail.com")).await.unwrap_err();
        assert!(matches!(err, ApiError::DuplicateEntry(_)));
    }

    #[tokio::test]
    async fn test_login_unknown_email() {
        let (service, _store) = service();

        let err = service
            .login(LoginRequest {
                email: "ghost@mail.com".into(),
                password: "anything".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (service, store) = service();
        seed(&store, "a@mail.com", "correct").await;

        let err = service
            .login(LoginRequest {
                email: "a@mail.com".into(),
                password: "incorrect".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_success_issues_matching_tokens() {
        let (service, store) = service();
        let user = seed(&store, "a@mail.com", "correct").await;

        let response = service
            .login(LoginRequest {
                email: "a@mail.com".into(),
                password: "correct".into(),
            })
            .await
            .unwrap();

        let access = service.jwt().verify_access(&response.access_token).unwrap();
        let refresh = service.jwt().verify_refresh(&response.refresh_token).unwrap();
        assert_eq!(access.sub, user.id.to_string());
        assert_eq!(refresh.sub, access.sub);
        assert_eq!(response.user.id, user.id.to_string());

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["user"].get("password").is_none());
        assert_eq!(json["user"]["email"], "a@mail.com");
        assert_eq!(json["user"]["role"], "USER");
    }

    #[tokio::test]
    async fn test_refresh_rotates_pair() {
        let (service, store) = service();
        let user = seed(&store, "a@mail.com", "correct").await;
        let pair = service.jwt().issue(&user.id.to_string(), Role::User).unwrap();

        let refreshed = service.refresh(&pair.refresh_token).await.unwrap();
        let access = service.jwt().verify_access(&refreshed.access_token).unwrap();
        assert_eq!(access.sub, user.id.to_string());
    }

    #[tokio::test]
    async fn test_refresh_rejects_access_token() {
        let (service, store) = service();
        let user = seed(&store, "a@mail.com", "correct").await;
        let pair = service.jwt().issue(&user.id.to_string(), Role::User).unwrap();

        let err = service.refresh(&pair.access_token).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::AuthRequired(AuthFailure::RefreshInvalid)
        ));
        assert_eq!(err.to_string(), "Invalid refresh token");
    }

    #[tokio::test]
    async fn test_refresh_reports_expired_refresh_token() {
        let (service, store) = service();
        let user = seed(&store, "a@mail.com", "correct").await;
        let now = chrono::Utc::now().timestamp();
        let token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &Claims {
                sub: user.id.to_string(),
                role: Role::User,
                iat: now - 120,
                exp: now - 60,
            },
            &jsonwebtoken::EncodingKey::from_secret(b"refresh-secret"),
        )
        .unwrap();

        let err = service.refresh(&token).await.unwrap_err();
        assert!(matches!(
            err,
            ApiError::AuthRequired(AuthFailure::RefreshExpired)
        ));
        assert_eq!(err.to_string(), "Refresh token has expired");
    }

    #[tokio::test]
    async fn test_refresh_for_deleted_user() {
        let (service, store) = service();
        let user = seed(&store, "a@mail.com", "correct").await;
        let pair = service.jwt().issue(&user.id.to_string(), Role::User).unwrap();
        store.delete(&user.id).await.unwrap();

        let err = service.refresh(&pair.refresh_token).await.unwrap_err();
        assert!(matches!(err, ApiError::ResourceNotFound(_)));
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_change() {
        let (service, store) = service();
        let user = seed(&store, "a@mail.com", "correct").await;
        let pair = service.jwt().issue(&user.id.to_string(), Role::User).unwrap();
        store
            .update(
                &user.id,
                UserUpdate {
                    fullname: None,
                    role: Some(Role::Admin),
                },
            )
            .await
            .unwrap();

        let refreshed = service.refresh(&pair.refresh_token).await.unwrap();
        let access = service.jwt().verify_access(&refreshed.access_token).unwrap();
        assert_eq!(access.role, Role::Admin);
    }

    /// Store whose backend is always down.
    struct BrokenStore;

    #[async_trait]
    impl CredentialStore for BrokenStore {
        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Err(StoreError::Backend(anyhow::anyhow!("database is locked")))
        }
        async fn find_by_id(&self, _id: &Uuid) -> StoreResult<Option<User>> {
            Err(StoreError::Backend(anyhow::anyhow!("database is locked")))
        }
        async fn create(&self, _user: NewUser) -> StoreResult<User> {
            Err(StoreError::Backend(anyhow::anyhow!("database is locked")))
        }
        async fn update(&self, _id: &Uuid, _update: UserUpdate) -> StoreResult<User> {
            Err(StoreError::Backend(anyhow::anyhow!("database is locked")))
        }
        async fn delete(&self, _id: &Uuid) -> StoreResult<User> {
            Err(StoreError::Backend(anyhow::anyhow!("database is locked")))
        }
        async fn list(&self, _q: Option<&str>, _p: u32, _l: u32) -> StoreResult<Page<User>> {
            Err(StoreError::Backend(anyhow::anyhow!("database is locked")))
        }
    }

    #[tokio::test]
    async fn test_backend_failure_is_server_error() {
        let service = AuthService::new(Arc::new(BrokenStore), jwt());

        let err = service
            .login(LoginRequest {
                email: "a@mail.com".into(),
                password: "correct".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), "SERVER_ERROR");
    }
}
