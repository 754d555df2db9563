//! User-facing flow errors.

use giftpin_contract::ContractError;
use thiserror::Error;

/// Errors surfaced by the create, claim and admin flows.
///
/// Messages are shown to the user as-is. Flows keep the last error in their
/// state as well as returning it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// Bad amount, PIN, message, address or link.
    #[error(transparent)]
    Validation(#[from] giftpin_core::Error),

    #[error("Please enter a gift code")]
    EmptyCode,

    #[error("Invalid gift code: {0}")]
    InvalidCode(String),

    #[error("Please enter the PIN")]
    EmptyPin,

    #[error("Please connect your wallet")]
    WalletNotConnected,

    #[error("Please sign in before creating a gift")]
    NotSignedIn,

    /// The wallet refused to sign, or signed with another account.
    #[error("Sign-in failed: {0}")]
    SignIn(String),

    #[error("Gift not found")]
    NotFound,

    #[error("This gift has already been claimed")]
    AlreadyClaimed,

    #[error("Invalid PIN")]
    InvalidPin,

    #[error("Only the contract admin can do this")]
    AccessDenied,

    #[error("Only the gift creator can cancel it")]
    NotCreator,

    #[error("Batch count must be greater than 0")]
    EmptyBatch,

    /// An action was invoked from a step that does not allow it.
    #[error("Cannot {action} while {step}")]
    WrongStep {
        action: &'static str,
        step: &'static str,
    },

    #[error(transparent)]
    Contract(ContractError),

    #[error("Unknown code scheme: {0} (expected random or deterministic)")]
    UnknownScheme(String),

    /// The code registry could not be read or written.
    #[error("code registry error: {0}")]
    Registry(String),
}

impl From<ContractError> for FlowError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::NotConnected => FlowError::WalletNotConnected,
            other => FlowError::Contract(other),
        }
    }
}

impl From<std::io::Error> for FlowError {
    fn from(err: std::io::Error) -> Self {
        FlowError::Registry(err.to_string())
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        FlowError::Registry(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_maps_to_wallet_error() {
        let err: FlowError = ContractError::NotConnected.into();
        assert_eq!(err, FlowError::WalletNotConnected);

        let err: FlowError = ContractError::Reverted("Gift already claimed".into()).into();
        assert!(matches!(err, FlowError::Contract(_)));
    }

    #[test]
    fn test_messages() {
        assert_eq!(FlowError::InvalidPin.to_string(), "Invalid PIN");
        let err = FlowError::WrongStep {
            action: "claim",
            step: "awaiting a code",
        };
        assert_eq!(err.to_string(), "Cannot claim while awaiting a code");
    }
}
