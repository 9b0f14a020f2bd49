//! Error types for the loan eligibility assistant

use thiserror::Error;

/// Result type alias for assistant operations
pub type Result<T> = std::result::Result<T, AssistantError>;

#[derive(Error, Debug)]
pub enum AssistantError {

    // =============================
    // Domain Errors
    // =============================

    #[error("Invalid loan terms: {0}")]
    InvalidLoanTerms(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_errors_convert() {
        fn decode(raw: &str) -> Result<serde_json::Value> {
            Ok(serde_json::from_str(raw)?)
        }

        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, AssistantError::SerializationError(_)));
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_domain_error_messages() {
        let err = AssistantError::InvalidLoanTerms("tenure must be positive".into());
        assert_eq!(err.to_string(), "Invalid loan terms: tenure must be positive");

        let err = AssistantError::Configuration("PORT".into());
        assert_eq!(err.to_string(), "Configuration error: PORT");
    }
}
