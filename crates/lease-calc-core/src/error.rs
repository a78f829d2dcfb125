use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaseError {
    #[error("Invalid term: {field} — {reason}")]
    InvalidTerm { field: String, reason: String },

    #[error("Invalid payment amount: {field} must be non-negative, got {value}")]
    InvalidPaymentAmount { field: String, value: Decimal },

    #[error("Invalid rate: {field} must be non-negative, got {value}")]
    InvalidRate { field: String, value: Decimal },

    #[error("Unparseable date: '{input}' is not a YYYY-MM-DD calendar date")]
    UnparseableDate { input: String },

    #[error("Date error: {0}")]
    DateOverflow(String),

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for LeaseError {
    fn from(e: serde_json::Error) -> Self {
        LeaseError::SerializationError(e.to_string())
    }
}

impl LeaseError {
    /// Arithmetic on `field` left the 96-bit decimal range.
    pub(crate) fn overflow(field: &str) -> Self {
        LeaseError::InvalidInput {
            field: field.into(),
            reason: "overflows decimal range".into(),
        }
    }
}
