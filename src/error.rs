use thiserror::Error;

/// Failure talking to an external nutrition database. Never crosses the
/// source-client boundary: clients log it and report "no match".
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{source_name} request failed: {error}")]
    Http {
        source_name: &'static str,
        #[source]
        error: reqwest::Error,
    },
    #[error("{source_name} returned HTTP {status}")]
    Status {
        source_name: &'static str,
        status: u16,
    },
    #[error("{source_name} response could not be decoded: {message}")]
    Decode {
        source_name: &'static str,
        message: String,
    },
    #[error("{0} credentials are not configured")]
    Disabled(&'static str),
}

/// Failure in the cache backing store. Reads treat it as a miss, writes drop it.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("cache document is malformed: {0}")]
    Malformed(String),
    #[error("cache store unavailable: {0}")]
    Unavailable(String),
}
