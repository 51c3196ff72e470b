use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("failed to decode stored {field} for {key}: {message}")]
    Decode {
        field: &'static str,
        key: String,
        message: String,
    },

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Failures while resolving a tool call. None of these are protocol errors;
/// they reach the caller as an `isError` tool result.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("No current matchweek found for {league}")]
    NoCurrentMatchweek { league: String },

    #[error("No matches found for {league} matchweek {matchweek}")]
    NoMatches { league: String, matchweek: i64 },

    #[error("Prediction data unavailable: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API request failed: {0}")]
    Status(reqwest::StatusCode),

    #[error("{0}")]
    Rpc(String),

    #[error("{0}")]
    Tool(String),

    #[error("Failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),
}
