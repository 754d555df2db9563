//! Gift records as reported by the gift contract

use ethers_core::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::{Error, PinHash, Result, MAX_MESSAGE_LENGTH, MAX_PIN_LENGTH, MIN_PIN_LENGTH};

/// Numeric gift identifier, assigned sequentially by the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GiftId(pub u64);

impl From<u64> for GiftId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for GiftId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Claim details, present only once a gift has been claimed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimInfo {
    /// Account that redeemed the gift
    pub claimed_by: Address,
    /// Unix timestamp of the claim
    pub claimed_at: u64,
}

/// Observable status of a gift
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiftStatus {
    /// Funds are escrowed and the gift can be claimed
    Unclaimed,
    /// Funds have been released
    Claimed,
}

/// Public view of a gift
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftRecord {
    /// Gift identifier
    pub id: GiftId,
    /// Account that funded the gift
    pub creator: Address,
    /// Escrowed amount in wei
    pub amount: U256,
    /// Optional message from the creator (empty when none)
    pub message: String,
    /// Unix timestamp of creation
    pub created_at: u64,
    /// Set exactly once, when the gift is claimed
    pub claim: Option<ClaimInfo>,
}

impl GiftRecord {
    /// Whether the gift has been claimed
    pub fn is_claimed(&self) -> bool {
        self.claim.is_some()
    }

    /// Current status of the gift
    pub fn status(&self) -> GiftStatus {
        if self.is_claimed() {
            GiftStatus::Claimed
        } else {
            GiftStatus::Unclaimed
        }
    }

    /// Account that claimed the gift, if any
    pub fn claimed_by(&self) -> Option<Address> {
        self.claim.map(|c| c.claimed_by)
    }
}

/// Privileged view of a gift, including the stored PIN hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GiftAdminRecord {
    /// Public fields
    #[serde(flatten)]
    pub record: GiftRecord,
    /// Keccak-256 hash of the PIN
    pub pin_hash: PinHash,
}

/// Aggregate platform statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformStats {
    pub total_gifts_created: U256,
    pub total_gifts_claimed: U256,
    /// Value currently escrowed, in wei
    pub total_value_locked: U256,
    /// Value released to claimers, in wei
    pub total_value_claimed: U256,
    pub total_creators: U256,
    pub total_claimers: U256,
    pub unclaimed_gifts: U256,
}

/// Check a PIN against the creation-time length bounds
pub fn validate_pin(pin: &str) -> Result<()> {
    let len = pin.chars().count();
    if len < MIN_PIN_LENGTH {
        return Err(Error::PinTooShort(MIN_PIN_LENGTH));
    }
    if len > MAX_PIN_LENGTH {
        return Err(Error::PinTooLong(MAX_PIN_LENGTH));
    }
    Ok(())
}

/// Check a gift message against the maximum length
pub fn validate_message(message: &str) -> Result<()> {
    if message.chars().count() > MAX_MESSAGE_LENGTH {
        return Err(Error::MessageTooLong(MAX_MESSAGE_LENGTH));
    }
    Ok(())
}

/// Parse a `0x`-prefixed, 40-hex-digit account address
pub fn parse_address(input: &str) -> Result<Address> {
    let input = input.trim();
    if !input.starts_with("0x") || input.len() != 42 {
        return Err(Error::InvalidAddress(input.to_string()));
    }
    let bytes = hex::decode(&input[2..]).map_err(|_| Error::InvalidAddress(input.to_string()))?;
    Ok(Address::from_slice(&bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(claim: Option<ClaimInfo>) -> GiftRecord {
        GiftRecord {
            id: GiftId(1),
            creator: Address::repeat_byte(0x11),
            amount: U256::from(10u64).pow(U256::from(17u64)),
            message: "Merry Christmas".to_string(),
            created_at: 1_700_000_000,
            claim,
        }
    }

    #[test]
    fn test_status_follows_claim() {
        let open = record(None);
        assert_eq!(open.status(), GiftStatus::Unclaimed);
        assert_eq!(open.claimed_by(), None);

        let claimed = record(Some(ClaimInfo {
            claimed_by: Address::repeat_byte(0x22),
            claimed_at: 1_700_000_100,
        }));
        assert!(claimed.is_claimed());
        assert_eq!(claimed.claimed_by(), Some(Address::repeat_byte(0x22)));
    }

    #[test]
    fn test_pin_bounds() {
        assert_eq!(validate_pin("123"), Err(Error::PinTooShort(MIN_PIN_LENGTH)));
        assert!(validate_pin("1234").is_ok());
        assert!(validate_pin(&"9".repeat(MAX_PIN_LENGTH)).is_ok());
        assert_eq!(
            validate_pin(&"9".repeat(MAX_PIN_LENGTH + 1)),
            Err(Error::PinTooLong(MAX_PIN_LENGTH))
        );
    }

    #[test]
    fn test_message_bound() {
        assert!(validate_message("").is_ok());
        assert!(validate_message(&"x".repeat(MAX_MESSAGE_LENGTH)).is_ok());
        assert!(validate_message(&"x".repeat(MAX_MESSAGE_LENGTH + 1)).is_err());
    }

    #[test]
    fn test_parse_address() {
        let addr = parse_address("0x1111111111111111111111111111111111111111").unwrap();
        assert_eq!(addr, Address::repeat_byte(0x11));
        assert!(parse_address("1111111111111111111111111111111111111111").is_err());
        assert!(parse_address("0x1111").is_err());
        assert!(parse_address("0xzz11111111111111111111111111111111111111").is_err());
    }
}
