use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvestmentMetricsError {
    #[error("Invalid input: {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Financial impossibility: {0}")]
    FinancialImpossibility(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl InvestmentMetricsError {
    /// Shorthand for the most common rejection.
    pub fn invalid(field: impl Into<String>, reason: impl Into<String>) -> Self {
        InvestmentMetricsError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for InvestmentMetricsError {
    fn from(e: serde_json::Error) -> Self {
        InvestmentMetricsError::SerializationError(e.to_string())
    }
}
