use strum::{AsRefStr, Display};

/// Closed set of failure causes reported by the repository client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum RepoErrorCode {
    AuthRequired,
    InitError,
    RepoAccessError,
    RepoExists,
    RepoCreateError,
    PermissionError,
    Unauthorized,
    Forbidden,
    NotFound,
    ValidationFailed,
    UnknownError,
}

impl RepoErrorCode {
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            422 => Self::ValidationFailed,
            _ => Self::UnknownError,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RepoError {
    pub code: RepoErrorCode,
    pub message: String,
    /// HTTP status reported by the remote, if the request got that far.
    pub status: Option<u16>,
}

impl RepoError {
    pub fn new(code: RepoErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self {
            code: RepoErrorCode::from_status(status),
            message: message.into(),
            status: Some(status),
        }
    }

    pub fn not_initialized() -> Self {
        Self::new(RepoErrorCode::InitError, "service not initialized")
    }

    pub fn timeout(operation: &str) -> Self {
        Self::new(
            RepoErrorCode::UnknownError,
            format!("{operation} timed out"),
        )
    }

    /// Timeouts, transport failures and 5xx answers are worth another attempt.
    pub fn is_transient(&self) -> bool {
        match self.status {
            Some(status) => status >= 500,
            None => self.code == RepoErrorCode::UnknownError,
        }
    }

    pub fn is_already_exists(&self) -> bool {
        self.code == RepoErrorCode::ValidationFailed && self.message.contains("already exists")
    }

    /// Replaces the code while keeping the remote's explanation.
    pub fn with_code(mut self, code: RepoErrorCode) -> Self {
        self.code = code;
        self
    }
}

impl From<octocrab::Error> for RepoError {
    fn from(err: octocrab::Error) -> Self {
        match err {
            octocrab::Error::GitHub { source, .. } => {
                let details = source
                    .errors
                    .clone()
                    .unwrap_or_default()
                    .iter()
                    .filter_map(|e| e.get("message").and_then(|m| m.as_str()))
                    .collect::<Vec<_>>()
                    .join("; ");
                let message = if details.is_empty() {
                    source.message.clone()
                } else {
                    format!("{} ({details})", source.message)
                };
                Self::from_status(source.status_code.as_u16(), message)
            }
            other => Self::new(RepoErrorCode::UnknownError, other.to_string()),
        }
    }
}
