//! Persistence adapters for tasks and projects.
//!
//! Both backends implement [`ProjectStore`] and [`TaskStore`]; services only
//! ever see the traits, so the backend is picked once at startup.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

use crate::project::Project;
use crate::task::{NewTask, Task};

pub mod database;
pub mod json_file;

pub use database::DatabaseStore;
pub use json_file::JsonFileStore;

/// Error type for store operations.
///
/// Every variant renders as the same generic message; the underlying cause is
/// kept as the error source for logging.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Represents a failure reported by the relational database.
    #[error("Database operation failed")]
    Database(#[from] sea_orm::DbErr),
    /// Represents a failure reading or writing a data file.
    #[error("Database operation failed")]
    Io(#[from] std::io::Error),
    /// Represents a data file that could not be (de)serialized.
    #[error("Database operation failed")]
    Serialization(#[from] serde_json::Error),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Returns every stored project.
    async fn list(&self) -> Result<Vec<Project>, StoreError>;

    /// Looks up a single project.
    async fn get_by_id(&self, id: &str) -> Result<Option<Project>, StoreError>;

    /// Stores a new project under a freshly generated id.
    async fn insert(&self, name: String) -> Result<Project, StoreError>;

    /// Renames a project. Returns `None` if the id is unknown.
    async fn update(&self, id: &str, name: String) -> Result<Option<Project>, StoreError>;

    /// Removes a project and returns it. Returns `None` if the id is unknown.
    async fn remove(&self, id: &str) -> Result<Option<Project>, StoreError>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Returns every stored task.
    async fn list(&self) -> Result<Vec<Task>, StoreError>;

    /// Looks up a single task.
    async fn get_by_id(&self, id: &str) -> Result<Option<Task>, StoreError>;

    /// Stores a new task under a freshly generated id.
    async fn insert(&self, new_task: NewTask) -> Result<Task, StoreError>;

    /// Sets the completion flag of a task. Returns `None` if the id is unknown.
    async fn set_completed(&self, id: &str, completed: bool) -> Result<Option<Task>, StoreError>;

    /// Removes a task and returns it. Returns `None` if the id is unknown.
    async fn remove(&self, id: &str) -> Result<Option<Task>, StoreError>;
}

/// Hands out record ids derived from the creation time in milliseconds.
///
/// Two records created within the same millisecond still get distinct ids:
/// each id is at least one greater than the previous one.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: AtomicI64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id for a record created at `now`.
    pub fn next_id(&self, now: DateTime<Utc>) -> String {
        let millis = now.timestamp_millis();
        let previous = self
            .last
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(millis.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        millis.max(previous + 1).to_string()
    }
}
