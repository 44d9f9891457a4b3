use thiserror::Error;

/// Failure of a single completion round trip.
///
/// Carries whatever diagnostic the provider handed back so it can be shown
/// inline in the conversation instead of aborting the session.
#[derive(Debug, Clone, Error)]
pub enum RequestError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),
}

impl RequestError {
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedPayload(msg.into())
    }

    /// HTTP status reported by the provider, if the call got that far.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Provider error body. JSON bodies are returned parsed, anything else as a string.
    pub fn payload(&self) -> Option<serde_json::Value> {
        match self {
            Self::Status { body, .. } if !body.trim().is_empty() => Some(
                serde_json::from_str(body)
                    .unwrap_or_else(|_| serde_json::Value::String(body.clone())),
            ),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("A completion request is already in flight")]
    Busy,

    #[error("Response belongs to a superseded submission")]
    StaleResponse,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No API key configured")]
    MissingCredential,

    #[error("Request error: {0}")]
    Request(#[from] RequestError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Busy)
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::StaleResponse)
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}
