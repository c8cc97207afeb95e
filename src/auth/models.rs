//! Authentication Models
//! Mission: Define credential, claims and request/response shapes for the auth gate

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Stored credential
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub fullname: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub role: Role,
    pub created_at: String,
}

/// Access tiers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "USER" => Some(Role::User),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims payload, shared by access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String, // subject (user id)
    pub role: Role,
    pub iat: i64, // issued at, unix seconds
    pub exp: i64, // expiry, unix seconds
}

/// Record to insert; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub fullname: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update applied by admins
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserUpdate {
    pub fullname: Option<String>,
    pub role: Option<Role>,
}

impl UserUpdate {
    pub fn is_empty(&self) -> bool {
        self.fullname.is_none() && self.role.is_none()
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        if self.is_empty() {
            problems.push("at least one of fullname or role must be provided".to_string());
        }
        if let Some(name) = &self.fullname {
            check_fullname(name, &mut problems);
        }
        finish(problems)
    }
}

/// Signup request body
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

impl SignupRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        check_fullname(&self.fullname, &mut problems);
        check_email(&self.email, &mut problems);
        check_password_length(&self.password, &mut problems);
        check_password_strength(&self.password, &mut problems);
        finish(problems)
    }
}

/// Login request body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut problems = Vec::new();
        check_email(&self.email, &mut problems);
        check_password_length(&self.password, &mut problems);
        finish(problems)
    }
}

/// Refresh request body
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Admin-side account creation
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub fullname: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        SignupRequest {
            fullname: self.fullname.clone(),
            email: self.email.clone(),
            password: self.password.clone(),
        }
        .validate()
    }
}

/// Signed token pair handed out at login
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Login response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserResponse,
}

/// User response (sanitized)
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub fullname: String,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.to_string(),
            fullname: user.fullname.clone(),
            email: user.email.clone(),
            role: user.role,
            created_at: user.created_at.clone(),
        }
    }
}

const PASSWORD_MIN_LEN: usize = 8;
const PASSWORD_MAX_LEN: usize = 32;
const PASSWORD_SPECIALS: &str = "!@#$%^&*()_+[]{};':\"\\|,.<>/?-";

fn check_fullname(name: &str, problems: &mut Vec<String>) {
    if name.trim().is_empty() {
        problems.push("fullname must not be empty".to_string());
    }
}

/// Shape check only: one `@`, non-empty local part, dotted domain.
fn check_email(email: &str, problems: &mut Vec<String>) {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
                && domain.contains('.')
                && domain.split('.').all(|part| !part.is_empty())
        }
        None => false,
    };

    if !valid {
        problems.push("email must be a valid email address".to_string());
    }
}

fn check_password_length(password: &str, problems: &mut Vec<String>) {
    let len = password.chars().count();
    if len < PASSWORD_MIN_LEN {
        problems.push(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters long"
        ));
    } else if len > PASSWORD_MAX_LEN {
        problems.push(format!("password cannot exceed {PASSWORD_MAX_LEN} characters"));
    }
}

fn check_password_strength(password: &str, problems: &mut Vec<String>) {
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        problems.push("password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        problems.push("password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SPECIALS.contains(c)) {
        problems.push("password must contain at least one special character".to_string());
    }
}

fn finish(problems: Vec<String>) -> Result<(), ApiError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(ApiError::InvalidInput(problems))
    }
}
