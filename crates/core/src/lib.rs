pub mod config;
pub mod domain;
pub mod report;

pub use domain::log_type::LogType;
pub use domain::product::Product;
pub use domain::progress_log::{NewProgressLog, ProgressLog};
pub use report::{ChanceSource, ReportWindow, ThreadRngChance, EMBED_FIELD_BUDGET};
