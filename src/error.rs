use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Form3Error {
    #[error("invalid uri: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(&'static str),

    #[error("failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to decode error response body (status {status}): {source}")]
    InvalidErrorBody {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid or unexpected response format")]
    InvalidResponse,

    #[error("api rejected request: {0}")]
    Api(#[from] ApiError),
}

impl Form3Error {
    /// The API error carried by this error, if the server answered with a
    /// non-2xx status.
    pub fn api_error(&self) -> Option<&ApiError> {
        match self {
            Form3Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// HTTP status of a rejected request. Transport failures have none.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Form3Error::Api(err) => Some(err.status),
            Form3Error::InvalidErrorBody { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the underlying transport gave up waiting for the server.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Form3Error::Http(err) if err.is_timeout())
    }
}

/// A non-2xx answer from the Form3 API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("request failed with status code {}: {message}", .status.as_u16())]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Error for a response without a body, described by the status reason phrase.
    pub fn from_status(status: StatusCode) -> Self {
        Self {
            status,
            message: status.canonical_reason().unwrap_or_default().to_string(),
        }
    }
}
