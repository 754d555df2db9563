//! Error types for contract access.

use thiserror::Error;

/// Errors from calling the gift contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// The node, signer or network failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The contract rejected the call (revert or failed receipt).
    #[error("call reverted: {0}")]
    Reverted(String),

    /// The contract returned data that does not match the expected shape.
    #[error("decode error: {0}")]
    Decode(String),

    /// ABI lookup or argument encoding failed.
    #[error("abi error: {0}")]
    Abi(String),

    /// A write or dry-run was attempted without a connected wallet.
    #[error("wallet not connected")]
    NotConnected,

    /// A confirmed receipt did not carry the expected event.
    #[error("event {0} not found in receipt")]
    MissingEvent(&'static str),
}

impl From<ethers::abi::Error> for ContractError {
    fn from(err: ethers::abi::Error) -> Self {
        ContractError::Abi(err.to_string())
    }
}
