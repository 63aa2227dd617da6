//! Account records and errors.

use serde::Serialize;
use thiserror::Error;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Registration input.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Error)]
pub enum AccountError {
    /// The email is already registered.
    #[error("email already exists")]
    DuplicateEmail,

    #[error("database error: {0}")]
    Database(String),
}

pub type AccountResult<T> = Result<T, AccountError>;
