use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::log_type::LogType;
use crate::domain::product::Product;

/// A persisted weekly status update.
///
/// Created exactly once by the `/progress` command and never updated or
/// deleted; `id` and `created_at` are assigned by the persistence layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressLog {
    pub id: i64,
    pub user_id: String,
    pub log_type: LogType,
    pub product: Product,
    pub summary: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new log; everything the author supplies.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewProgressLog {
    pub user_id: String,
    pub log_type: LogType,
    pub product: Product,
    pub summary: String,
}
