//! User accounts.
//!
//! # Data Flow
//! ```text
//! /api/register ──▶ UserStore::create ──▶ users table (unique email)
//! /api/login ─────▶ UserStore::find_by_email ──▶ password compare ──▶ token
//! ```
//!
//! # Design Decisions
//! - Records are created once and never updated or deleted
//! - Passwords are stored and compared as plain text, matching the
//!   existing user table
//! - The Postgres store shares one lazily connected pool; a connection is
//!   held only for the duration of a single query

pub mod store;
pub mod types;

pub use store::{MemoryUserStore, PgUserStore, UserStore};
pub use types::{AccountError, AccountResult, NewUser, User};
