pub const STATUS_UNAUTHORIZED: u16 = 401;

/// Errors that carry the HTTP status the transport layer observed, if any.
pub trait StatusCoded {
    fn status(&self) -> Option<u16>;

    fn is_unauthorized(&self) -> bool {
        self.status() == Some(STATUS_UNAUTHORIZED)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("api error ({status:?}): {message}")]
pub struct ApiError {
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }
}

impl StatusCoded for ApiError {
    fn status(&self) -> Option<u16> {
        self.status
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        Self {
            status: error.status().map(|s| s.as_u16()),
            message: error.to_string(),
        }
    }
}
