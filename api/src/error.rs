use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// Failure classes surfaced by the feed clients.
///
/// A "nothing found" outcome is not an error: clients return an empty
/// collection or `None` for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// Upstream unreachable, connection dropped or the request timed out.
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },
    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Http,
    Parse,
    QuotaExceeded,
    InvalidCredential,
}

impl ApiError {
    pub(crate) fn network(url: &str, err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_owned()
        } else {
            err.to_string()
        };
        ApiError::Network { url: url.to_owned(), message }
    }

    pub(crate) fn parse(url: &str, message: impl ToString) -> Self {
        ApiError::Parse { url: url.to_owned(), message: message.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Network { .. } => ErrorKind::Network,
            ApiError::Http { .. } => ErrorKind::Http,
            ApiError::Parse { .. } => ErrorKind::Parse,
            ApiError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            ApiError::InvalidCredential(_) => ErrorKind::InvalidCredential,
        }
    }

    /// Quota and credential failures will not clear up by retrying.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, ApiError::QuotaExceeded(_) | ApiError::InvalidCredential(_))
    }

    /// One line suitable for showing to a person.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Network { .. } => {
                "Could not connect to the data service. It may be temporarily unavailable.".into()
            }
            ApiError::Http { status, .. } => {
                format!("The data service returned an error (status: {status}).")
            }
            ApiError::Parse { .. } => {
                "Failed to read the data service response. It may have returned an invalid format."
                    .into()
            }
            ApiError::QuotaExceeded(_) => {
                "The summarization quota is used up for now. Try again later.".into()
            }
            ApiError::InvalidCredential(_) => {
                "The summarization API key is missing or was rejected.".into()
            }
        }
    }
}
