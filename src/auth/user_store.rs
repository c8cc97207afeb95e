//! User Storage
//! Mission: Persist credentials behind a small lookup/CRUD interface, SQLite by default

use crate::auth::models::{NewUser, Role, User, UserUpdate};
use crate::auth::password::hash_password_async;
use crate::config::AdminSeed;
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Failures surfaced by a credential store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique column already holds this value.
    #[error("a record with this {0} already exists")]
    Conflict(String),
    /// The addressed record does not exist.
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// One page of a user listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Credential lookup and record CRUD by unique key.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_by_id(&self, id: &Uuid) -> StoreResult<Option<User>>;

    /// Insert a credential. A taken email yields [`StoreError::Conflict`].
    async fn create(&self, user: NewUser) -> StoreResult<User>;

    async fn update(&self, id: &Uuid, update: UserUpdate) -> StoreResult<User>;

    async fn delete(&self, id: &Uuid) -> StoreResult<User>;

    /// Case-insensitive substring search on fullname and email, newest first.
    /// `page` starts at 1.
    async fn list(&self, query: Option<&str>, page: u32, limit: u32) -> StoreResult<Page<User>>;
}

const USER_COLUMNS: &str = "id, fullname, email, password_hash, role, created_at";

/// User storage with SQLite backend
#[derive(Clone)]
pub struct SqliteUserStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteUserStore {
    /// Open (or create) the store at `path` and initialize the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path).context("Failed to open auth database")?;
        Self::from_connection(conn)
    }

    /// Create an in-memory store (for testing).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory database")?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                fullname TEXT NOT NULL,
                email TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_users_created_at ON users(created_at);",
        )
        .context("Failed to initialize users schema")?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run `f` against the connection on the blocking pool.
    async fn with_conn<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn.lock();
            f(&guard)
        })
        .await
        .map_err(|e| StoreError::Backend(anyhow!("store task failed: {e}")))?
    }

    /// Create the initial admin account unless its email is already taken.
    ///
    /// Returns whether an account was created.
    pub async fn seed_admin(&self, seed: &AdminSeed) -> StoreResult<bool> {
        if self.find_by_email(&seed.email).await?.is_some() {
            debug!("Admin seed skipped, {} already exists", seed.email);
            return Ok(false);
        }

        let password_hash = hash_password_async(seed.password.clone()).await?;

        self.create(NewUser {
            fullname: seed.fullname.clone(),
            email: seed.email.clone(),
            password_hash,
            role: Role::Admin,
        })
        .await?;

        Ok(true)
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let role: String = row.get(4)?;

    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let role = Role::parse(&role).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            4,
            rusqlite::types::Type::Text,
            format!("unknown role {role:?}").into(),
        )
    })?;

    Ok(User {
        id,
        fullname: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role,
        created_at: row.get(5)?,
    })
}

/// Remap SQLite failures onto the store taxonomy.
fn map_sqlite(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::SqliteFailure(ref e, ref msg)
            if e.code == ErrorCode::ConstraintViolation
                && msg.as_deref().is_some_and(|m| m.starts_with("UNIQUE")) =>
        {
            // "UNIQUE constraint failed: users.email"
            let column = msg
                .as_deref()
                .and_then(|m| m.rsplit('.').next())
                .unwrap_or("key")
                .to_string();
            StoreError::Conflict(column)
        }
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Backend(other.into()),
    }
}

fn select_one(conn: &Connection, column: &str, value: &str) -> StoreResult<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"),
        params![value],
        row_to_user,
    )
    .optional()
    .map_err(map_sqlite)
}

#[async_trait]
impl CredentialStore for SqliteUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = email.to_string();
        self.with_conn(move |conn| select_one(conn, "email", &email))
            .await
    }

    async fn find_by_id(&self, id: &Uuid) -> StoreResult<Option<User>> {
        let id = id.to_string();
        self.with_conn(move |conn| select_one(conn, "id", &id)).await
    }

    async fn create(&self, new_user: NewUser) -> StoreResult<User> {
        let user = User {
            id: Uuid::new_v4(),
            fullname: new_user.fullname,
            email: new_user.email,
            password_hash: new_user.password_hash,
            role: new_user.role,
            created_at: Utc::now().to_rfc3339(),
        };

        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO users (id, fullname, email, password_hash, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id.to_string(),
                    user.fullname,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    user.created_at,
                ],
            )
            .map_err(map_sqlite)?;

            info!("✅ Created user: {} ({})", user.id, user.role.as_str());
            Ok(user)
        })
        .await
    }

    async fn update(&self, id: &Uuid, update: UserUpdate) -> StoreResult<User> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let rows = conn
                .execute(
                    "UPDATE users
                     SET fullname = COALESCE(?2, fullname),
                         role = COALESCE(?3, role)
                     WHERE id = ?1",
                    params![id, update.fullname, update.role.map(|r| r.as_str())],
                )
                .map_err(map_sqlite)?;

            if rows == 0 {
                return Err(StoreError::NotFound);
            }

            select_one(conn, "id", &id)?.ok_or(StoreError::NotFound)
        })
        .await
    }

    async fn delete(&self, id: &Uuid) -> StoreResult<User> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let user = select_one(conn, "id", &id)?.ok_or(StoreError::NotFound)?;
            conn.execute("DELETE FROM users WHERE id = ?1", params![id])
                .map_err(map_sqlite)?;

            info!("🗑️  Deleted user: {}", id);
            Ok(user)
        })
        .await
    }

    async fn list(&self, query: Option<&str>, page: u32, limit: u32) -> StoreResult<Page<User>> {
        let pattern = query
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", q.to_lowercase()));
        let limit = limit.max(1);
        let offset = (page.max(1) as u64 - 1) * limit as u64;

        self.with_conn(move |conn| {
            let filter = "(?1 IS NULL OR lower(fullname) LIKE ?1 OR lower(email) LIKE ?1)";

            let total: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM users WHERE {filter}"),
                    params![pattern],
                    |row| row.get(0),
                )
                .map_err(map_sqlite)?;

            let mut stmt = conn
                .prepare(&format!(
                    "SELECT {USER_COLUMNS} FROM users WHERE {filter}
                     ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
                ))
                .map_err(map_sqlite)?;

            let items = stmt
                .query_map(params![pattern, limit as i64, offset as i64], row_to_user)
                .map_err(map_sqlite)?
                .collect::<Result<Vec<_>, _>>()
                .map_err(map_sqlite)?;

            Ok(Page {
                items,
                total: total as u64,
            })
        })
        .await
    }
}
