use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProjectFinanceError {
    /// Structural problem with the scenario: a required field with no sane
    /// zero default, or a malformed shape.
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl ProjectFinanceError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ProjectFinanceError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for ProjectFinanceError {
    fn from(e: serde_json::Error) -> Self {
        ProjectFinanceError::SerializationError(e.to_string())
    }
}
