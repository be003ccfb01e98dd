//! Storage Layer
//!
//! Persists storm events and the user stories attached to them. Events are
//! deduplicated on (event type, start time) with atomic get-or-create.

mod memory;
mod model;
mod sqlite;
mod store;

pub use memory::MemoryEventStore;
pub use model::{
    EventAttributes, EventType, NewStory, StormEvent, UserStory, DEFAULT_AUTHOR, MAX_AUTHOR_LEN,
};
pub use sqlite::{DatabaseConfig, SqliteEventStore};
pub use store::{EventStore, START_TIME_PRECISION};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Record not found")]
    NotFound,
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StorageError::NotFound,
            other => StorageError::DatabaseError(other.to_string()),
        }
    }
}
