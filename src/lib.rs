//! # Rolodex - Person Directory Service
//!
//! A small directory of people and the roles they hold, served over a REST API.
//!
//! Rolodex provides:
//! - Short, time-prefixed record identifiers
//! - A SQLite image that is loaded into memory and flushed whole after every write
//! - Repositories for people, roles and user-role assignments
//! - First-run seeding of a fixed set of roles and people
//! - An axum HTTP layer over the repositories

pub mod id;
pub mod model;
pub mod storage;
pub mod server;
pub mod config;
pub mod ui;


// Re-exports for convenient access
pub use model::{Person, Role};
pub use storage::{Database, PersonRepository, RoleRepository, UserRoleRepository};

/// Result type alias for Rolodex operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Rolodex operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid data: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Database image at {path} is unreadable: {reason}")]
    CorruptImage { path: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ref failure, ref message)
                if failure.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Error::Constraint(
                    message.clone().unwrap_or_else(|| failure.to_string()),
                )
            }
            other => Error::Storage(other),
        }
    }
}
