use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use raboneko_core::{LogType, NewProgressLog, Product, ProgressLog};

use super::{ProgressLogRepository, RepositoryError};
use crate::DbPool;

pub struct SqlProgressLogRepository {
    pool: DbPool,
}

impl SqlProgressLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProgressLogRepository for SqlProgressLogRepository {
    async fn create(&self, new_log: NewProgressLog) -> Result<ProgressLog, RepositoryError> {
        let created_at = Utc::now();

        let row = sqlx::query(
            "INSERT INTO progress_log (user_id, log_type, product, summary, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             RETURNING id, user_id, log_type, product, summary, created_at",
        )
        .bind(&new_log.user_id)
        .bind(new_log.log_type.wire())
        .bind(new_log.product.wire())
        .bind(&new_log.summary)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;

        decode_row(&row)
    }

    async fn find_in_window(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<ProgressLog>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, log_type, product, summary, created_at \
             FROM progress_log \
             WHERE created_at >= ?1 AND created_at <= ?2 \
             ORDER BY id ASC",
        )
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(decode_row).collect()
    }
}

fn decode_row(row: &SqliteRow) -> Result<ProgressLog, RepositoryError> {
    let log_type_wire: i64 = row.try_get("log_type")?;
    let product_wire: i64 = row.try_get("product")?;

    Ok(ProgressLog {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        log_type: LogType::from_wire(log_type_wire)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        product: Product::from_wire(product_wire)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?,
        summary: row.try_get("summary")?,
        created_at: row.try_get("created_at")?,
    })
}
