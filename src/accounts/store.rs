//! User storage backends.

use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::accounts::types::{AccountError, AccountResult, NewUser, User};
use crate::config::DatabaseConfig;

/// Postgres SQLSTATE for a unique constraint violation.
const UNIQUE_VIOLATION: &str = "23505";

const CREATE_USERS_TABLE: &str = "CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL
)";

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a user. Fails with `DuplicateEmail` if the email is taken.
    async fn create(&self, user: NewUser) -> AccountResult<User>;

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>>;
}

/// Users table in Postgres.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    /// Build the pool without connecting; connections open on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> AccountResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
            .connect_lazy(&config.url)
            .map_err(database_error)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the users table if it does not exist.
    pub async fn ensure_schema(&self) -> AccountResult<()> {
        sqlx::query(CREATE_USERS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(database_error)?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, user: NewUser) -> AccountResult<User> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (name, email, password) VALUES ($1, $2, $3) \
             RETURNING id, name, email, password",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(database_error)
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        sqlx::query_as::<_, User>("SELECT id, name, email, password FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(database_error)
    }
}

fn database_error(err: sqlx::Error) -> AccountError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return AccountError::DuplicateEmail;
        }
    }
    AccountError::Database(err.to_string())
}

/// In-process store keyed by email.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<DashMap<String, User>>,
    next_id: Arc<AtomicI32>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, user: NewUser) -> AccountResult<User> {
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AccountError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let record = User {
                    id: self.next_id.fetch_add(1, Ordering::Relaxed) + 1,
                    name: user.name,
                    email: user.email,
                    password: user.password,
                };
                slot.insert(record.clone());
                Ok(record)
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> AccountResult<Option<User>> {
        Ok(self.users.get(email).map(|r| r.value().clone()))
    }
}
