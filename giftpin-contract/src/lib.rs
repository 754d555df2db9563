//! giftpin-contract
//!
//! Typed access to the gift escrow contract. The contract interface is fixed
//! (see [`abi`]); each function is exposed as a [`ContractCall`] struct and
//! driven through a [`GiftContractClient`] over any [`ContractTransport`].
//!
//! ```text
//! ClaimGift { id, pin_hash }
//!   -> abi::function("claimGift").encode_input(..)
//!   -> ContractTransport::call / send
//!   -> decode_output -> ContractCall::decode -> domain type
//! ```

pub mod abi;
mod calls;
mod client;
mod error;
mod evm;
mod transport;

pub use calls::{
    Admin, CancelGift, ChangeAdmin, ClaimGift, ContractBalance, ContractCall, CreateGift,
    EmergencyPaused, EmergencyWithdraw, GetGift, GetGiftAdmin, GetGiftsBatch, GetPlatformStats,
    GetUserClaims, GetUserGiftCount, GetUserGifts, GiftEntry, HasClaimedGift, HasCreatedGift,
    IsAdmin, ToggleEmergencyPause, TotalClaimers, TotalCreators, TotalGiftsClaimed,
    TotalGiftsCreated, TotalValueClaimed, TotalValueLocked,
};
pub use client::GiftContractClient;
pub use error::ContractError;
pub use evm::EvmTransport;
pub use transport::{CallRequest, ContractTransport, LogEntry, TxReceipt};

/// Chain types used in the public API.
pub use ethers::types::{Address, Bytes, TxHash, H256, U256};
