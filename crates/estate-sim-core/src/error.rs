use thiserror::Error;

#[derive(Debug, Error)]
pub enum EstateSimError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl EstateSimError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        EstateSimError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl EstateSimError {
    pub(crate) fn overflow(context: impl Into<String>) -> Self {
        EstateSimError::Overflow {
            context: context.into(),
        }
    }
}

impl From<serde_json::Error> for EstateSimError {
    fn from(e: serde_json::Error) -> Self {
        EstateSimError::SerializationError(e.to_string())
    }
}
