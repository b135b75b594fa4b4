use thiserror::Error;

/// Every way a chart run can fail
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Usage error: {0}")]
    Usage(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Store unavailable: {0}")]
    ConnectionFailure(String),
    #[error("No data found for symbol {symbol}")]
    NotFound { symbol: String },
    #[error("Corrupt data: {0}")]
    DataCorruption(String),
    #[error("Render failed: {0}")]
    Render(String),
}

impl ChartError {
    /// Wrap a driver error, keeping only the message the database produced
    pub fn store(context: &str, err: sqlx::Error) -> Self {
        ChartError::ConnectionFailure(format!("{}: {}", context, extract_clean_error(&err.to_string())))
    }
}

/// Extract clean error message from database error strings
///
/// Removes the driver prefix like:
/// "error returned from database: relation \"spikes\" does not exist"
///
/// Returns only the meaningful error message:
/// "relation \"spikes\" does not exist"
pub fn extract_clean_error(error_msg: &str) -> String {
    match error_msg.strip_prefix("error returned from database:") {
        Some(rest) => rest.trim().to_string(),
        None => error_msg.to_string(),
    }
}
