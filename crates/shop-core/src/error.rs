//! Error types for the shop core.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while interpreting domain values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A decimal amount could not be parsed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// An amount does not fit the target integer representation.
    #[error("amount out of range: {0}")]
    AmountOutOfRange(String),

    /// An order status string is not one of the known statuses.
    #[error("invalid order status: {0}")]
    InvalidStatus(String),

    /// An admin role string is not one of the known roles.
    #[error("invalid admin role: {0}")]
    InvalidRole(String),
}
