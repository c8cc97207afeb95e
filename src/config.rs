//! Application configuration.
//!
//! Built once at startup from the process environment (after `.env` loading)
//! and handed to the components that need it. Nothing reads the environment
//! after `AppConfig::from_env` returns.

use std::env;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

/// Default SQLite file for credentials.
const DEFAULT_AUTH_DB_PATH: &str = "movieshelf_auth.db";
const DEFAULT_PORT: u16 = 3000;
/// Longest accepted token lifetime: ten years.
pub const MAX_TOKEN_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
    #[error("{name} has an invalid duration value {value:?} (expected e.g. 900, 15m, 12h, 7d)")]
    InvalidDuration { name: &'static str, value: String },
    #[error("{name} has an invalid value {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Secret and lifetime for one kind of token.
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub ttl: Duration,
}

impl std::fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// Signing material for the access and refresh tokens.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub access: TokenSettings,
    pub refresh: TokenSettings,
}

impl AuthConfig {
    /// Read the four token variables through `lookup`. All are required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access = TokenSettings {
            secret: required(&lookup, "ACCESS_TOKEN_SECRET")?,
            ttl: required_duration(&lookup, "ACCESS_TOKEN_EXPIRES_IN")?,
        };
        let refresh = TokenSettings {
            secret: required(&lookup, "REFRESH_TOKEN_SECRET")?,
            ttl: required_duration(&lookup, "REFRESH_TOKEN_EXPIRES_IN")?,
        };

        Ok(Self { access, refresh })
    }
}

/// Credentials for the admin account created on first start.
#[derive(Clone)]
pub struct AdminSeed {
    pub fullname: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("fullname", &self.fullname)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub auth_db_path: String,
    pub auth: AuthConfig,
    pub admin_seed: Option<AdminSeed>,
}

impl AppConfig {
    /// Load `.env` (if any) and build the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        load_env();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let auth = AuthConfig::from_lookup(&lookup)?;

        let port = match non_empty(&lookup, "PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let bind_addr = non_empty(&lookup, "BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string());
        let auth_db_path =
            non_empty(&lookup, "AUTH_DB_PATH").unwrap_or_else(|| DEFAULT_AUTH_DB_PATH.to_string());

        // Both halves must be present; a lone email or password is ignored.
        let admin_seed = match (
            non_empty(&lookup, "ADMIN_EMAIL"),
            non_empty(&lookup, "ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(AdminSeed {
                fullname: non_empty(&lookup, "ADMIN_FULLNAME")
                    .unwrap_or_else(|| "Administrator".to_string()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            port,
            auth_db_path,
            auth,
            admin_seed,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

/// Parse a token lifetime.
///
/// A bare integer is a number of seconds. Otherwise the number must carry one
/// of the unit suffixes `s`, `m`, `h`, `d` or `w`. Zero and anything above
/// [`MAX_TOKEN_TTL_SECS`] are rejected.
pub fn parse_duration(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);

    let value: u64 = digits.parse().ok()?;
    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 24 * 60 * 60,
        "w" => 7 * 24 * 60 * 60,
        _ => return None,
    };

    let secs = value.checked_mul(multiplier)?;
    if secs == 0 || secs > MAX_TOKEN_TTL_SECS {
        return None;
    }
    Some(Duration::from_secs(secs))
}

fn non_empty<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    non_empty(lookup, name).ok_or(ConfigError::Missing(name))
}

fn required_duration<F>(lookup: &F, name: &'static str) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = required(lookup, name)?;
    parse_duration(&raw).ok_or(ConfigError::InvalidDuration { name, value: raw })
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv::dotenv();

    // 2) Crate-root .env, for runs started from another directory
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
