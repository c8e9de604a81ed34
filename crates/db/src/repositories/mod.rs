use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use raboneko_core::{NewProgressLog, ProgressLog};

pub mod memory;
pub mod progress_log;

pub use memory::InMemoryProgressLogRepository;
pub use progress_log::SqlProgressLogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

#[async_trait]
pub trait ProgressLogRepository: Send + Sync {
    /// Persists a new log. The store assigns `id` and `created_at`.
    async fn create(&self, new_log: NewProgressLog) -> Result<ProgressLog, RepositoryError>;

    /// All logs with `created_at` inside the inclusive window, oldest first.
    async fn find_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProgressLog>, RepositoryError>;
}
