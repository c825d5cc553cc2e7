use thiserror::Error;

/// Failures surfaced by the service clients
///
/// `Auth` and `Network` from a library fetch halt an audit. `Network` from a
/// catalog search only means "no match for this alias". `DataShape` covers
/// responses missing a field the audit needs.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("unexpected response shape: {0}")]
    DataShape(String),
}

impl SourceError {
    pub fn is_auth(&self) -> bool {
        matches!(self, SourceError::Auth(_))
    }

    /// Classify a non-success HTTP status
    pub fn from_status(status: reqwest::StatusCode, context: &str, body: &str) -> Self {
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            SourceError::Auth(format!("{}: {} - {}", context, status, body))
        } else {
            SourceError::Network(format!("{}: {} - {}", context, status, body))
        }
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SourceError::DataShape(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}
