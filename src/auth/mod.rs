//! Authentication Module
//! Mission: Secure API access with bcrypt credentials, JWT token pairs and role gates

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod service;
pub mod user_store;

pub use jwt::JwtHandler;
pub use middleware::{access_gate, role_gate, RoleGuard};
pub use models::{Claims, Role};
pub use service::AuthService;
pub use user_store::{CredentialStore, SqliteUserStore};
