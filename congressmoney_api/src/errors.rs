//! Error types for the upstream feed clients.

/// Errors that can occur when fetching from the transaction or price feeds.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// An HTTP request failed (network error, timeout, or unreadable body).
    #[error("Request failed")]
    RequestFailed,
    /// The upstream returned a non-success status with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// The price provider refused the call because the key's call budget is spent.
    #[error("Rate limited by price provider: {0}")]
    RateLimited(String),
    /// The body could not be decoded into the expected shape.
    #[error("Failed to parse response: {0}")]
    ParseFailed(String),
}

impl Error {
    /// Whether retrying the same request later could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RequestFailed | Error::RateLimited(_) => true,
            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            Error::ParseFailed(_) => false,
        }
    }
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...[truncated]", &body[..end])
    }
}
