use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    /// Transport-level failure (connection refused, timeout, TLS)
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The hosted service answered with an error. `message` is the provider's own text.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Backend configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl BackendError {
    pub(crate) fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether the service rejected the request itself (bad credentials, invalid input)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Api { status, .. } if (400..500).contains(status))
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

impl From<url::ParseError> for BackendError {
    fn from(err: url::ParseError) -> Self {
        Self::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_displays_provider_text_verbatim() {
        let err = BackendError::api(400, "Invalid login credentials");
        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            BackendError::Http("connection refused".to_string()).to_string(),
            "HTTP request failed: connection refused"
        );
        assert_eq!(
            BackendError::Decode("eof".to_string()).to_string(),
            "Failed to decode response: eof"
        );
        assert_eq!(
            BackendError::NotFound("profiles/1".to_string()).to_string(),
            "Not found: profiles/1"
        );
    }

    #[test]
    fn test_is_client_error() {
        assert!(BackendError::api(422, "User already registered").is_client_error());
        assert!(!BackendError::api(503, "Service temporarily unavailable").is_client_error());
        assert!(!BackendError::Http("timeout".to_string()).is_client_error());
    }

    #[test]
    fn test_from_serde_error() {
        let serde_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            BackendError::from(serde_error),
            BackendError::Decode(_)
        ));
    }

    #[test]
    fn test_from_url_error() {
        let err = url::Url::parse("not a url").unwrap_err();
        assert!(matches!(BackendError::from(err), BackendError::Config(_)));
    }

    #[test]
    fn test_error_is_sync_and_send() {
        fn assert_sync_send<T: Sync + Send>() {}
        assert_sync_send::<BackendError>();
    }
}
