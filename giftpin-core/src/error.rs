//! Error types for gift input validation

use thiserror::Error;

/// Result type alias for core gift operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while validating user-supplied gift input
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Amount is empty, malformed or not strictly positive
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Amount has more decimal places than the native currency supports
    #[error("Amount has too many decimal places (max 18): {0}")]
    TooManyDecimalPlaces(String),

    /// Gift code is not six characters from [0-9a-z]
    #[error("Invalid gift code: {0}")]
    InvalidCode(String),

    /// PIN shorter than the minimum length
    #[error("PIN must be at least {0} characters")]
    PinTooShort(usize),

    /// PIN longer than the maximum length
    #[error("PIN must be at most {0} characters")]
    PinTooLong(usize),

    /// Message exceeds the maximum length
    #[error("Message must be at most {0} characters")]
    MessageTooLong(usize),

    /// Address is not a 0x-prefixed 20-byte hex string
    #[error("Invalid address format: {0}")]
    InvalidAddress(String),

    /// Share link could not be built or parsed
    #[error("Invalid share link: {0}")]
    InvalidLink(String),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}
