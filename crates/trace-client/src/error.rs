//! Errors returned by collaborator services

/// Failure talking to a collaborator service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Network failure, timeout or connection refused
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx status without a usable error body
    #[error("service returned {status}: {reason}")]
    Status { status: u16, reason: String },

    /// Non-2xx status with a server-supplied `{error}` body
    #[error("service rejected request ({status}): {reason}")]
    Rejected { status: u16, reason: String },

    /// Body did not match the expected record shape
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// Base URL cannot carry path segments
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// Scripted or injected failure (fakes, adapters)
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Rejection carrying a server reason
    pub fn rejected(status: u16, reason: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            reason: reason.into(),
        }
    }

    /// Worth retrying later with the same request
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(err) => err.is_timeout() || err.is_connect(),
            Self::Status { status, .. } | Self::Rejected { status, .. } => *status >= 500,
            Self::Unavailable(_) => true,
            Self::Decode(_) | Self::InvalidBaseUrl(_) => false,
        }
    }

    /// HTTP status, when the service answered
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Rejected { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Message suitable for an end-user notification
    ///
    /// Prefers the server-provided reason.
    #[must_use]
    pub fn user_reason(&self) -> String {
        match self {
            Self::Rejected { reason, .. } | Self::Unavailable(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type alias for service calls
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_surfaces_server_reason() {
        let err = ServiceError::rejected(404, "Node not found");
        assert_eq!(err.user_reason(), "Node not found");
        assert_eq!(err.status(), Some(404));
        assert!(!err.is_retryable());
    }

    #[test]
    fn server_errors_are_retryable() {
        let err = ServiceError::Status {
            status: 503,
            reason: "busy".to_string(),
        };
        assert!(err.is_retryable());
        assert_eq!(err.user_reason(), "service returned 503: busy");
    }

    #[test]
    fn decode_errors_are_not_retryable() {
        let err: ServiceError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(!err.is_retryable());
        assert_eq!(err.status(), None);
    }
}
