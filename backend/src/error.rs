use thiserror::Error;

/// Why a snapshot could not be obtained for one (symbol, window).
///
/// Always recovered locally: the key is skipped for that tick.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("symbol not found: {0}")]
    NotFound(String),

    #[error("snapshot source unavailable: {0}")]
    Unavailable(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("fetch timed out after {0} ms")]
    Timeout(u64),
}

/// Why a notification could not be delivered. Logged, never retried.
#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("rejected by sink (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("delivery timed out after {0} ms")]
    Timeout(u64),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {var}: `{value}` ({reason})")]
    Invalid {
        var: String,
        value: String,
        reason: String,
    },

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

impl ConfigError {
    pub fn invalid(var: &str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            var: var.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}
