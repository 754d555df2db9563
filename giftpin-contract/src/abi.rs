//! Fixed interface of the gift escrow contract.

use ethers::abi::{parse_abi, Abi, Event, Function, Param, ParamType, StateMutability};
use ethers::types::H256;
use once_cell::sync::Lazy;

use crate::ContractError;

/// Name of the creation event whose first indexed field is the gift id.
pub const GIFT_CREATED_EVENT: &str = "GiftCreated";

/// Human-readable ABI of every function and event the client touches, except
/// `getGiftsBatch` (see [`gifts_batch_function`]).
pub const GIFT_CONTRACT_ABI: &[&str] = &[
    // Admin and pause state
    "function admin() view returns (address)",
    "function isAdmin(address account) view returns (bool)",
    "function emergencyPaused() view returns (bool)",
    "function getContractBalance() view returns (uint256)",
    // Gift lookups
    "function getGift(uint256 giftId) view returns (address creator, uint256 amount, bool claimed, address claimedBy, uint256 createdAt, uint256 claimedAt, string message)",
    "function getGiftAdmin(uint256 giftId) view returns (address creator, uint256 amount, bytes32 pinHash, bool claimed, address claimedBy, uint256 createdAt, uint256 claimedAt, string message)",
    "function gifts(uint256 giftId) view returns (address creator, uint256 amount, bytes32 pinHash, bool claimed, address claimedBy, uint256 createdAt, uint256 claimedAt, string message)",
    // Per-user lookups
    "function getUserGifts(address user) view returns (uint256[])",
    "function getUserClaims(address user) view returns (uint256[])",
    "function getUserGiftCount(address user) view returns (uint256)",
    "function hasCreatedGift(address user) view returns (bool)",
    "function hasClaimedGift(address user) view returns (bool)",
    // Statistics
    "function getPlatformStats() view returns (uint256 totalGiftsCreated, uint256 totalGiftsClaimed, uint256 totalValueLocked, uint256 totalValueClaimed, uint256 totalCreators, uint256 totalClaimers, uint256 unclaimedGifts)",
    "function totalGiftsCreated() view returns (uint256)",
    "function totalGiftsClaimed() view returns (uint256)",
    "function totalValueLocked() view returns (uint256)",
    "function totalValueClaimed() view returns (uint256)",
    "function totalCreators() view returns (uint256)",
    "function totalClaimers() view returns (uint256)",
    // Writes
    "function createGift(bytes32 pinHash, string message) payable returns (uint256)",
    "function claimGift(uint256 giftId, bytes32 pinHash)",
    "function cancelGift(uint256 giftId)",
    "function toggleEmergencyPause()",
    "function emergencyWithdraw(address recipient)",
    "function changeAdmin(address newAdmin)",
    // Events
    "event GiftCreated(uint256 indexed giftId, address indexed creator, uint256 amount, string message)",
    "event GiftClaimed(uint256 indexed giftId, address indexed claimer, uint256 amount)",
];

/// Name of the privileged batch lookup.
pub const GIFTS_BATCH_FUNCTION: &str = "getGiftsBatch";

/// `getGiftsBatch(uint256,uint256)` returning one array of gift tuples.
///
/// The human-readable parser flattens an unnamed `tuple[]` return into its
/// fields, so this entry is built from param types.
#[allow(deprecated)]
fn gifts_batch_function() -> Function {
    let param = |name: &str, kind: ParamType| Param {
        name: name.to_string(),
        kind,
        internal_type: None,
    };
    let gift = ParamType::Tuple(vec![
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::FixedBytes(32),
        ParamType::Bool,
        ParamType::Address,
        ParamType::Uint(256),
        ParamType::Uint(256),
        ParamType::String,
    ]);
    Function {
        name: GIFTS_BATCH_FUNCTION.to_string(),
        inputs: vec![
            param("startId", ParamType::Uint(256)),
            param("count", ParamType::Uint(256)),
        ],
        outputs: vec![param("gifts", ParamType::Array(Box::new(gift)))],
        constant: None,
        state_mutability: StateMutability::View,
    }
}

static GIFT_ABI: Lazy<Abi> = Lazy::new(|| {
    let mut abi = parse_abi(GIFT_CONTRACT_ABI).expect("gift contract ABI is well-formed");
    abi.functions
        .insert(GIFTS_BATCH_FUNCTION.to_string(), vec![gifts_batch_function()]);
    abi
});

/// The parsed contract ABI.
pub fn gift_abi() -> &'static Abi {
    &GIFT_ABI
}

/// Look up a contract function by name.
pub fn function(name: &str) -> Result<&'static Function, ContractError> {
    gift_abi()
        .function(name)
        .map_err(|_| ContractError::Abi(format!("unknown function {}", name)))
}

/// Look up a contract function by its four-byte selector.
pub fn function_by_selector(selector: &[u8]) -> Option<&'static Function> {
    gift_abi()
        .functions()
        .find(|f| f.short_signature().as_slice() == selector)
}

/// Look up a contract event by name.
pub fn event(name: &str) -> Result<&'static Event, ContractError> {
    gift_abi()
        .event(name)
        .map_err(|_| ContractError::Abi(format!("unknown event {}", name)))
}

/// Topic-0 of the `GiftCreated` event.
pub fn gift_created_topic() -> H256 {
    event(GIFT_CREATED_EVENT)
        .map(Event::signature)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::abi::Token;
    use ethers::types::{Address, U256};

    #[test]
    fn test_abi_parses() {
        assert_eq!(gift_abi().functions().count(), 26);
        assert!(function("createGift").is_ok());
        assert!(function("transfer").is_err());
    }

    #[test]
    fn test_batch_returns_one_tuple_array() {
        let batch = function("getGiftsBatch").unwrap();
        assert_eq!(batch.outputs.len(), 1);
        assert_eq!(
            batch.short_signature(),
            ethers::utils::id("getGiftsBatch(uint256,uint256)")
        );

        let gift = Token::Tuple(vec![
            Token::Address(Address::repeat_byte(0xa1)),
            Token::Uint(U256::from(5u64)),
            Token::FixedBytes(vec![7u8; 32]),
            Token::Bool(false),
            Token::Address(Address::zero()),
            Token::Uint(U256::from(1_700_000_000u64)),
            Token::Uint(U256::zero()),
            Token::String("hi".to_string()),
        ]);
        let encoded = ethers::abi::encode(&[Token::Array(vec![gift.clone(), gift.clone()])]);
        let decoded = batch.decode_output(&encoded).unwrap();
        assert_eq!(decoded, vec![Token::Array(vec![gift.clone(), gift])]);
    }

    #[test]
    fn test_selector_lookup() {
        let claim = function("claimGift").unwrap();
        let found = function_by_selector(&claim.short_signature()).unwrap();
        assert_eq!(found.name, "claimGift");
        assert!(function_by_selector(&[0, 0, 0, 0]).is_none());
    }

    #[test]
    fn test_created_topic_is_signature_hash() {
        let expected = ethers::utils::keccak256("GiftCreated(uint256,address,uint256,string)");
        assert_eq!(gift_created_topic(), H256::from(expected));
    }
}
