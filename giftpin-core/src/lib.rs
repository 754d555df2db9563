//! # PIN-protected gifts
//!
//! Core types shared by every giftpin crate.
//!
//! A gift is an amount of native currency escrowed by an external contract.
//! Whoever knows the gift's PIN can redeem it exactly once. The creator shares
//! a short code (or a link embedding it) with the recipient and passes the PIN
//! out of band.
//!
//! ## Gift codes
//!
//! Two code schemes exist:
//! - **deterministic**: base-36 rendering of the numeric gift id, zero-padded
//!   to six characters ([`encode_gift_id`] / [`decode_gift_id`]).
//! - **random**: six characters with at least one letter and one digit
//!   ([`generate_random_code`]), bound to a gift id by a client-side registry.
//!
//! ```text
//! 100  <->  00002s            (deterministic)
//! 7    <->  k3x9a2            (random, registry lookup)
//! ```

mod amount;
mod code;
mod error;
mod gift;
mod link;
mod pin;

pub use amount::{format_ether_amount, parse_ether_amount};
pub use code::{
    decode_gift_id, encode_gift_id, generate_random_code, is_valid_gift_id_code,
    is_valid_random_code, GiftCode,
};
pub use error::{Error, Result};
pub use gift::{
    parse_address, validate_message, validate_pin, ClaimInfo, GiftAdminRecord, GiftId,
    GiftRecord, GiftStatus, PlatformStats,
};
pub use link::{truncate_address, ShareLink};
pub use pin::{hash_pin, PinHash};

/// Re-exported Ethereum primitives used across the public API
pub use ethers_core::types::{Address, H256, U256};

/// Length of every gift code
pub const CODE_LENGTH: usize = 6;

/// Radix of the deterministic gift-code encoding
pub const CODE_RADIX: u32 = 36;

/// Minimum PIN length accepted at creation time
pub const MIN_PIN_LENGTH: usize = 4;

/// Maximum PIN length accepted at creation time
pub const MAX_PIN_LENGTH: usize = 20;

/// Maximum length of the optional gift message, in characters
pub const MAX_MESSAGE_LENGTH: usize = 200;

/// Decimal places of the native currency (wei per ether = 10^18)
pub const ETHER_DECIMALS: usize = 18;

/// Path segment under which share links carry the gift code
pub const CLAIM_PATH: &str = "claim";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(CODE_LENGTH, 6);
        assert_eq!(CODE_RADIX, 36);
        assert_eq!(MIN_PIN_LENGTH, 4);
        assert!(MAX_PIN_LENGTH > MIN_PIN_LENGTH);
    }
}
