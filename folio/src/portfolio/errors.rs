use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PortfolioError {
    /// A submitted form is missing a required field or carries an invalid value
    #[error("Validation error: {0}")]
    Validation(String),

    /// A stored row could not be read as the expected record
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Unknown record kind: {0}")]
    UnknownKind(String),
}

impl From<serde_json::Error> for PortfolioError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidRecord(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            PortfolioError::Validation("title is required".to_string()).to_string(),
            "Validation error: title is required"
        );
        assert_eq!(
            PortfolioError::UnknownKind("widgets".to_string()).to_string(),
            "Unknown record kind: widgets"
        );
    }
}
