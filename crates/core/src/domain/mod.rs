pub mod log_type;
pub mod product;
pub mod progress_log;
