use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use raboneko_core::{NewProgressLog, ProgressLog};

use super::{ProgressLogRepository, RepositoryError};

/// Test double with the same contract as the SQL store. `seed` accepts rows
/// with fixed timestamps so window queries can be exercised deterministically.
#[derive(Default)]
pub struct InMemoryProgressLogRepository {
    rows: RwLock<Vec<ProgressLog>>,
}

impl InMemoryProgressLogRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, log: ProgressLog) {
        self.rows.write().await.push(log);
    }

    pub async fn all(&self) -> Vec<ProgressLog> {
        self.rows.read().await.clone()
    }
}

#[async_trait::async_trait]
impl ProgressLogRepository for InMemoryProgressLogRepository {
    async fn create(&self, new_log: NewProgressLog) -> Result<ProgressLog, RepositoryError> {
        let mut rows = self.rows.write().await;
        let next_id = rows.iter().map(|row| row.id).max().unwrap_or(0) + 1;

        let log = ProgressLog {
            id: next_id,
            user_id: new_log.user_id,
            log_type: new_log.log_type,
            product: new_log.product,
            summary: new_log.summary,
            created_at: Utc::now(),
        };
        rows.push(log.clone());

        Ok(log)
    }

    async fn find_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProgressLog>, RepositoryError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<ProgressLog> = rows
            .iter()
            .filter(|row| row.created_at >= start && row.created_at <= end)
            .cloned()
            .collect();
        matched.sort_by_key(|row| row.id);

        Ok(matched)
    }
}
