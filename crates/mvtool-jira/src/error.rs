//! Error types for Jira access.

/// Errors raised while talking to Jira.
#[derive(Debug, thiserror::Error)]
pub enum JiraError {
    /// Jira answered with a non-success HTTP status.
    #[error("Jira responded with status {status}")]
    Status { status: u16 },

    /// The request never got an answer (DNS, TLS, timeout, ...).
    #[error("Jira request failed: {0}")]
    Transport(String),

    /// The answer could not be decoded.
    #[error("invalid Jira response: {0}")]
    Decode(String),

    /// No Jira connection is configured.
    #[error("Jira is not configured")]
    NotConfigured,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JiraError>;

impl JiraError {
    pub fn status(status: u16) -> Self {
        Self::Status { status }
    }

    /// Returns `true` when the entity does not exist or the configured user
    /// may not see it. Both are reported as an absent entity, not a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 403 | 404 })
    }
}

impl From<ureq::Error> for JiraError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => Self::Status { status },
            other => Self::Transport(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_and_missing_count_as_not_found() {
        assert!(JiraError::status(404).is_not_found());
        assert!(JiraError::status(403).is_not_found());
        assert!(!JiraError::status(500).is_not_found());
        assert!(!JiraError::NotConfigured.is_not_found());
        assert!(!JiraError::Transport("timeout".into()).is_not_found());
    }

    #[test]
    fn status_codes_map_from_ureq() {
        let err: JiraError = ureq::Error::StatusCode(401).into();
        assert_eq!(err.to_string(), "Jira responded with status 401");
    }
}
