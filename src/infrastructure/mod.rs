//! 基础设施：日志、日志脱敏、数据库连接池

pub mod db;
pub mod log_redact;
pub mod logging;
