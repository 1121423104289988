use thiserror::Error;

/// Errors surfaced by discovery, pagination and the listing services.
///
/// Validation variants (`InvalidCoordinate`, `InvalidCursor`, `InvalidLimit`,
/// `Validation`) are raised before any I/O. `DataSource` is transient and safe
/// for the caller to retry; nothing in this crate retries on its own.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),
    #[error("invalid cursor: {0}")]
    InvalidCursor(String),
    #[error("invalid limit: {0}")]
    InvalidLimit(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("data source error during {operation}: {message}")]
    DataSource { operation: &'static str, message: String },
    #[error("strategy unavailable: {0}")]
    StrategyUnavailable(String),
    #[error("model error: {0}")]
    Model(#[from] models::errors::ModelError),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    /// Wrap a store failure with the name of the operation that failed.
    pub fn data_source(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::DataSource { operation, message: err.to_string() }
    }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::InvalidCoordinate(_) => 2001,
            ServiceError::InvalidCursor(_) => 2002,
            ServiceError::InvalidLimit(_) => 2003,
            ServiceError::Validation(_) => 2004,
            ServiceError::NotFound(_) => 2005,
            ServiceError::Model(_) => 2006,
            ServiceError::DataSource { .. } => 2101,
            ServiceError::StrategyUnavailable(_) => 2201,
        }
    }

    /// Whether the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ServiceError::DataSource { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_source_keeps_operation_name() {
        let e = ServiceError::data_source("count", "connection reset");
        assert_eq!(e.to_string(), "data source error during count: connection reset");
        assert!(e.is_retryable());
        assert_eq!(e.code(), 2101);
    }

    #[test]
    fn validation_errors_are_not_retryable() {
        assert!(!ServiceError::InvalidCursor("x".into()).is_retryable());
        assert!(!ServiceError::InvalidLimit("x".into()).is_retryable());
    }
}
