/// Failure of a backend call
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The transport call itself failed (connect, DNS, timeout, reset).
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// The backend answered outside the 2xx range.
    #[error("HTTP {status}: {status_text}")]
    Request { status: u16, status_text: String },

    /// The backend answered 2xx but the body was not the expected JSON.
    #[error("Unexpected response body: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Request { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, ApiError::Network(e) if e.is_timeout())
    }
}
