//! Typed contract calls.
//!
//! Every contract function the client uses has one struct here. A call knows
//! its ABI function name, how to turn itself into argument tokens, and how to
//! decode the returned tokens into a domain type. Decoding happens once, at
//! this boundary; nothing above it sees raw tuples.

use ethers::abi::Token;
use ethers::types::{Address, U256};
use giftpin_core::{ClaimInfo, GiftAdminRecord, GiftId, GiftRecord, PinHash, PlatformStats};

use crate::ContractError;

/// A single typed call against the gift contract.
pub trait ContractCall {
    /// ABI function name.
    const FUNCTION: &'static str;

    /// Decoded return value.
    type Output;

    /// Argument tokens, in ABI order.
    fn tokens(&self) -> Vec<Token>;

    /// Decode the function's output tokens.
    fn decode(&self, tokens: Vec<Token>) -> Result<Self::Output, ContractError>;
}

/// Sequential reader over a function's output tokens.
struct Outputs {
    function: &'static str,
    tokens: std::vec::IntoIter<Token>,
}

impl Outputs {
    fn new(function: &'static str, tokens: Vec<Token>) -> Self {
        Self {
            function,
            tokens: tokens.into_iter(),
        }
    }

    fn next(&mut self, expected: &str) -> Result<Token, ContractError> {
        self.tokens.next().ok_or_else(|| {
            ContractError::Decode(format!("{}: missing {} output", self.function, expected))
        })
    }

    fn mismatch(&self, expected: &str, got: &Token) -> ContractError {
        ContractError::Decode(format!(
            "{}: expected {}, got {:?}",
            self.function, expected, got
        ))
    }

    fn address(&mut self) -> Result<Address, ContractError> {
        match self.next("address")? {
            Token::Address(addr) => Ok(addr),
            other => Err(self.mismatch("address", &other)),
        }
    }

    fn uint(&mut self) -> Result<U256, ContractError> {
        match self.next("uint256")? {
            Token::Uint(value) => Ok(value),
            other => Err(self.mismatch("uint256", &other)),
        }
    }

    fn u64(&mut self) -> Result<u64, ContractError> {
        let value = self.uint()?;
        to_u64(self.function, value)
    }

    fn bool(&mut self) -> Result<bool, ContractError> {
        match self.next("bool")? {
            Token::Bool(value) => Ok(value),
            other => Err(self.mismatch("bool", &other)),
        }
    }

    fn string(&mut self) -> Result<String, ContractError> {
        match self.next("string")? {
            Token::String(value) => Ok(value),
            other => Err(self.mismatch("string", &other)),
        }
    }

    fn bytes32(&mut self) -> Result<[u8; 32], ContractError> {
        match self.next("bytes32")? {
            Token::FixedBytes(bytes) if bytes.len() == 32 => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&bytes);
                Ok(out)
            }
            other => Err(self.mismatch("bytes32", &other)),
        }
    }

    fn array(&mut self) -> Result<Vec<Token>, ContractError> {
        match self.next("array")? {
            Token::Array(items) => Ok(items),
            other => Err(self.mismatch("array", &other)),
        }
    }

    fn gift_ids(&mut self) -> Result<Vec<GiftId>, ContractError> {
        let function = self.function;
        self.array()?
            .into_iter()
            .map(|token| match token {
                Token::Uint(value) => to_u64(function, value).map(GiftId),
                other => Err(ContractError::Decode(format!(
                    "{}: expected uint256 element, got {:?}",
                    function, other
                ))),
            })
            .collect()
    }
}

fn to_u64(function: &str, value: U256) -> Result<u64, ContractError> {
    if value > U256::from(u64::MAX) {
        return Err(ContractError::Decode(format!(
            "{}: value {} does not fit in u64",
            function, value
        )));
    }
    Ok(value.as_u64())
}

/// Gift fields in the order the contract returns them.
struct RawGift {
    creator: Address,
    amount: U256,
    pin_hash: Option<[u8; 32]>,
    claimed: bool,
    claimed_by: Address,
    created_at: u64,
    claimed_at: u64,
    message: String,
}

impl RawGift {
    fn read(out: &mut Outputs, with_pin_hash: bool) -> Result<Self, ContractError> {
        Ok(Self {
            creator: out.address()?,
            amount: out.uint()?,
            pin_hash: if with_pin_hash {
                Some(out.bytes32()?)
            } else {
                None
            },
            claimed: out.bool()?,
            claimed_by: out.address()?,
            created_at: out.u64()?,
            claimed_at: out.u64()?,
            message: out.string()?,
        })
    }

    /// `None` when the contract reports the gift as absent (zero creator).
    fn into_record(self, id: GiftId) -> Option<GiftRecord> {
        if self.creator.is_zero() {
            return None;
        }
        let claim = self.claimed.then_some(ClaimInfo {
            claimed_by: self.claimed_by,
            claimed_at: self.claimed_at,
        });
        Some(GiftRecord {
            id,
            creator: self.creator,
            amount: self.amount,
            message: self.message,
            created_at: self.created_at,
            claim,
        })
    }

    fn into_admin_record(mut self, id: GiftId) -> Option<GiftAdminRecord> {
        let pin_hash = PinHash::from_bytes(self.pin_hash.take().unwrap_or_default());
        self.into_record(id)
            .map(|record| GiftAdminRecord { record, pin_hash })
    }
}

fn id_token(id: GiftId) -> Token {
    Token::Uint(U256::from(id.0))
}

fn pin_token(pin_hash: &PinHash) -> Token {
    Token::FixedBytes(pin_hash.as_bytes().to_vec())
}

// ---- Admin and pause state ----

/// `admin()`: the current admin account.
#[derive(Debug, Clone, Copy)]
pub struct Admin;

impl ContractCall for Admin {
    const FUNCTION: &'static str = "admin";
    type Output = Address;

    fn tokens(&self) -> Vec<Token> {
        Vec::new()
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<Address, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).address()
    }
}

/// `isAdmin(account)`
#[derive(Debug, Clone, Copy)]
pub struct IsAdmin {
    pub account: Address,
}

impl ContractCall for IsAdmin {
    const FUNCTION: &'static str = "isAdmin";
    type Output = bool;

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.account)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<bool, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).bool()
    }
}

/// `emergencyPaused()`
#[derive(Debug, Clone, Copy)]
pub struct EmergencyPaused;

impl ContractCall for EmergencyPaused {
    const FUNCTION: &'static str = "emergencyPaused";
    type Output = bool;

    fn tokens(&self) -> Vec<Token> {
        Vec::new()
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<bool, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).bool()
    }
}

/// `getContractBalance()`: escrowed balance in wei.
#[derive(Debug, Clone, Copy)]
pub struct ContractBalance;

impl ContractCall for ContractBalance {
    const FUNCTION: &'static str = "getContractBalance";
    type Output = U256;

    fn tokens(&self) -> Vec<Token> {
        Vec::new()
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<U256, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).uint()
    }
}

// ---- Gift lookups ----

/// `getGift(id)`: public view, `None` when the gift does not exist.
#[derive(Debug, Clone, Copy)]
pub struct GetGift {
    pub id: GiftId,
}

impl ContractCall for GetGift {
    const FUNCTION: &'static str = "getGift";
    type Output = Option<GiftRecord>;

    fn tokens(&self) -> Vec<Token> {
        vec![id_token(self.id)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<Self::Output, ContractError> {
        let mut out = Outputs::new(Self::FUNCTION, tokens);
        Ok(RawGift::read(&mut out, false)?.into_record(self.id))
    }
}

/// `getGiftAdmin(id)`: privileged view including the PIN hash.
#[derive(Debug, Clone, Copy)]
pub struct GetGiftAdmin {
    pub id: GiftId,
}

impl ContractCall for GetGiftAdmin {
    const FUNCTION: &'static str = "getGiftAdmin";
    type Output = Option<GiftAdminRecord>;

    fn tokens(&self) -> Vec<Token> {
        vec![id_token(self.id)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<Self::Output, ContractError> {
        let mut out = Outputs::new(Self::FUNCTION, tokens);
        Ok(RawGift::read(&mut out, true)?.into_admin_record(self.id))
    }
}

/// `gifts(id)`: the raw storage getter.
#[derive(Debug, Clone, Copy)]
pub struct GiftEntry {
    pub id: GiftId,
}

impl ContractCall for GiftEntry {
    const FUNCTION: &'static str = "gifts";
    type Output = Option<GiftAdminRecord>;

    fn tokens(&self) -> Vec<Token> {
        vec![id_token(self.id)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<Self::Output, ContractError> {
        let mut out = Outputs::new(Self::FUNCTION, tokens);
        Ok(RawGift::read(&mut out, true)?.into_admin_record(self.id))
    }
}

/// `getGiftsBatch(start, count)`
///
/// Entries are numbered from `start`; absent gifts are dropped.
#[derive(Debug, Clone, Copy)]
pub struct GetGiftsBatch {
    pub start: GiftId,
    pub count: u64,
}

impl ContractCall for GetGiftsBatch {
    const FUNCTION: &'static str = "getGiftsBatch";
    type Output = Vec<GiftAdminRecord>;

    fn tokens(&self) -> Vec<Token> {
        vec![id_token(self.start), Token::Uint(U256::from(self.count))]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<Self::Output, ContractError> {
        let entries = Outputs::new(Self::FUNCTION, tokens).array()?;
        let mut records = Vec::with_capacity(entries.len());
        for (offset, entry) in entries.into_iter().enumerate() {
            let fields = match entry {
                Token::Tuple(fields) => fields,
                other => {
                    return Err(ContractError::Decode(format!(
                        "{}: expected tuple element, got {:?}",
                        Self::FUNCTION,
                        other
                    )))
                }
            };
            let id = GiftId(self.start.0 + offset as u64);
            let mut out = Outputs::new(Self::FUNCTION, fields);
            if let Some(record) = RawGift::read(&mut out, true)?.into_admin_record(id) {
                records.push(record);
            }
        }
        Ok(records)
    }
}

// ---- Per-user lookups ----

/// `getUserGifts(user)`: ids of gifts created by `user`.
#[derive(Debug, Clone, Copy)]
pub struct GetUserGifts {
    pub user: Address,
}

impl ContractCall for GetUserGifts {
    const FUNCTION: &'static str = "getUserGifts";
    type Output = Vec<GiftId>;

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.user)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<Self::Output, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).gift_ids()
    }
}

/// `getUserClaims(user)`: ids of gifts claimed by `user`.
#[derive(Debug, Clone, Copy)]
pub struct GetUserClaims {
    pub user: Address,
}

impl ContractCall for GetUserClaims {
    const FUNCTION: &'static str = "getUserClaims";
    type Output = Vec<GiftId>;

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.user)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<Self::Output, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).gift_ids()
    }
}

/// `getUserGiftCount(user)`
#[derive(Debug, Clone, Copy)]
pub struct GetUserGiftCount {
    pub user: Address,
}

impl ContractCall for GetUserGiftCount {
    const FUNCTION: &'static str = "getUserGiftCount";
    type Output = u64;

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.user)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<u64, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).u64()
    }
}

/// `hasCreatedGift(user)`
#[derive(Debug, Clone, Copy)]
pub struct HasCreatedGift {
    pub user: Address,
}

impl ContractCall for HasCreatedGift {
    const FUNCTION: &'static str = "hasCreatedGift";
    type Output = bool;

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.user)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<bool, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).bool()
    }
}

/// `hasClaimedGift(user)`
#[derive(Debug, Clone, Copy)]
pub struct HasClaimedGift {
    pub user: Address,
}

impl ContractCall for HasClaimedGift {
    const FUNCTION: &'static str = "hasClaimedGift";
    type Output = bool;

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.user)]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<bool, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).bool()
    }
}

// ---- Statistics ----

/// `getPlatformStats()`
#[derive(Debug, Clone, Copy)]
pub struct GetPlatformStats;

impl ContractCall for GetPlatformStats {
    const FUNCTION: &'static str = "getPlatformStats";
    type Output = PlatformStats;

    fn tokens(&self) -> Vec<Token> {
        Vec::new()
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<PlatformStats, ContractError> {
        let mut out = Outputs::new(Self::FUNCTION, tokens);
        Ok(PlatformStats {
            total_gifts_created: out.uint()?,
            total_gifts_claimed: out.uint()?,
            total_value_locked: out.uint()?,
            total_value_claimed: out.uint()?,
            total_creators: out.uint()?,
            total_claimers: out.uint()?,
            unclaimed_gifts: out.uint()?,
        })
    }
}

macro_rules! stat_counter {
    ($(#[$doc:meta])* $name:ident => $function:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name;

        impl ContractCall for $name {
            const FUNCTION: &'static str = $function;
            type Output = U256;

            fn tokens(&self) -> Vec<Token> {
                Vec::new()
            }

            fn decode(&self, tokens: Vec<Token>) -> Result<U256, ContractError> {
                Outputs::new(Self::FUNCTION, tokens).uint()
            }
        }
    };
}

stat_counter!(
    /// `totalGiftsCreated()`
    TotalGiftsCreated => "totalGiftsCreated"
);
stat_counter!(
    /// `totalGiftsClaimed()`
    TotalGiftsClaimed => "totalGiftsClaimed"
);
stat_counter!(
    /// `totalValueLocked()`, in wei
    TotalValueLocked => "totalValueLocked"
);
stat_counter!(
    /// `totalValueClaimed()`, in wei
    TotalValueClaimed => "totalValueClaimed"
);
stat_counter!(
    /// `totalCreators()`
    TotalCreators => "totalCreators"
);
stat_counter!(
    /// `totalClaimers()`
    TotalClaimers => "totalClaimers"
);

// ---- Writes ----

/// `createGift(pinHash, message)`, payable with the gift amount.
///
/// A dry-run returns the id the gift would receive.
#[derive(Debug, Clone)]
pub struct CreateGift {
    pub pin_hash: PinHash,
    pub message: String,
}

impl ContractCall for CreateGift {
    const FUNCTION: &'static str = "createGift";
    type Output = GiftId;

    fn tokens(&self) -> Vec<Token> {
        vec![pin_token(&self.pin_hash), Token::String(self.message.clone())]
    }

    fn decode(&self, tokens: Vec<Token>) -> Result<GiftId, ContractError> {
        Outputs::new(Self::FUNCTION, tokens).u64().map(GiftId)
    }
}

/// `claimGift(id, pinHash)`
#[derive(Debug, Clone, Copy)]
pub struct ClaimGift {
    pub id: GiftId,
    pub pin_hash: PinHash,
}

impl ContractCall for ClaimGift {
    const FUNCTION: &'static str = "claimGift";
    type Output = ();

    fn tokens(&self) -> Vec<Token> {
        vec![id_token(self.id), pin_token(&self.pin_hash)]
    }

    fn decode(&self, _tokens: Vec<Token>) -> Result<(), ContractError> {
        Ok(())
    }
}

/// `cancelGift(id)`
#[derive(Debug, Clone, Copy)]
pub struct CancelGift {
    pub id: GiftId,
}

impl ContractCall for CancelGift {
    const FUNCTION: &'static str = "cancelGift";
    type Output = ();

    fn tokens(&self) -> Vec<Token> {
        vec![id_token(self.id)]
    }

    fn decode(&self, _tokens: Vec<Token>) -> Result<(), ContractError> {
        Ok(())
    }
}

/// `toggleEmergencyPause()`
#[derive(Debug, Clone, Copy)]
pub struct ToggleEmergencyPause;

impl ContractCall for ToggleEmergencyPause {
    const FUNCTION: &'static str = "toggleEmergencyPause";
    type Output = ();

    fn tokens(&self) -> Vec<Token> {
        Vec::new()
    }

    fn decode(&self, _tokens: Vec<Token>) -> Result<(), ContractError> {
        Ok(())
    }
}

/// `emergencyWithdraw(recipient)`
#[derive(Debug, Clone, Copy)]
pub struct EmergencyWithdraw {
    pub recipient: Address,
}

impl ContractCall for EmergencyWithdraw {
    const FUNCTION: &'static str = "emergencyWithdraw";
    type Output = ();

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.recipient)]
    }

    fn decode(&self, _tokens: Vec<Token>) -> Result<(), ContractError> {
        Ok(())
    }
}

/// `changeAdmin(newAdmin)`
#[derive(Debug, Clone, Copy)]
pub struct ChangeAdmin {
    pub new_admin: Address,
}

impl ContractCall for ChangeAdmin {
    const FUNCTION: &'static str = "changeAdmin";
    type Output = ();

    fn tokens(&self) -> Vec<Token> {
        vec![Token::Address(self.new_admin)]
    }

    fn decode(&self, _tokens: Vec<Token>) -> Result<(), ContractError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use giftpin_core::hash_pin;

    fn gift_tokens(creator: Address, claimed: bool) -> Vec<Token> {
        vec![
            Token::Address(creator),
            Token::Uint(U256::from(1_000u64)),
            Token::Bool(claimed),
            Token::Address(if claimed {
                Address::repeat_byte(0x22)
            } else {
                Address::zero()
            }),
            Token::Uint(U256::from(1_700_000_000u64)),
            Token::Uint(U256::from(if claimed { 1_700_000_100u64 } else { 0 })),
            Token::String("hi".to_string()),
        ]
    }

    #[test]
    fn test_get_gift_decodes_open_gift() {
        let call = GetGift { id: GiftId(3) };
        let record = call
            .decode(gift_tokens(Address::repeat_byte(0x11), false))
            .unwrap()
            .unwrap();
        assert_eq!(record.id, GiftId(3));
        assert_eq!(record.amount, U256::from(1_000u64));
        assert_eq!(record.message, "hi");
        assert!(record.claim.is_none());
    }

    #[test]
    fn test_get_gift_decodes_claim() {
        let call = GetGift { id: GiftId(3) };
        let record = call
            .decode(gift_tokens(Address::repeat_byte(0x11), true))
            .unwrap()
            .unwrap();
        let claim = record.claim.unwrap();
        assert_eq!(claim.claimed_by, Address::repeat_byte(0x22));
        assert_eq!(claim.claimed_at, 1_700_000_100);
    }

    #[test]
    fn test_zero_creator_is_absent() {
        let call = GetGift { id: GiftId(9) };
        assert_eq!(call.decode(gift_tokens(Address::zero(), false)).unwrap(), None);
    }

    #[test]
    fn test_short_output_is_decode_error() {
        let call = GetGift { id: GiftId(1) };
        let err = call.decode(vec![Token::Address(Address::zero())]).unwrap_err();
        assert!(matches!(err, ContractError::Decode(_)));
    }

    #[test]
    fn test_wrong_token_kind_is_decode_error() {
        let err = IsAdmin {
            account: Address::zero(),
        }
        .decode(vec![Token::Uint(U256::one())])
        .unwrap_err();
        assert!(matches!(err, ContractError::Decode(_)));
    }

    #[test]
    fn test_admin_record_keeps_pin_hash() {
        let hash = hash_pin("1234");
        let mut tokens = gift_tokens(Address::repeat_byte(0x11), false);
        tokens.insert(2, Token::FixedBytes(hash.as_bytes().to_vec()));
        let record = GetGiftAdmin { id: GiftId(1) }.decode(tokens).unwrap().unwrap();
        assert_eq!(record.pin_hash, hash);
        assert_eq!(record.record.id, GiftId(1));
    }

    #[test]
    fn test_batch_numbers_from_start_and_skips_absent() {
        let hash = hash_pin("1234");
        let entry = |creator: Address| {
            let mut fields = gift_tokens(creator, false);
            fields.insert(2, Token::FixedBytes(hash.as_bytes().to_vec()));
            Token::Tuple(fields)
        };
        let tokens = vec![Token::Array(vec![
            entry(Address::repeat_byte(0x11)),
            entry(Address::zero()),
            entry(Address::repeat_byte(0x33)),
        ])];
        let call = GetGiftsBatch {
            start: GiftId(5),
            count: 3,
        };
        let records = call.decode(tokens).unwrap();
        let ids: Vec<_> = records.iter().map(|r| r.record.id).collect();
        assert_eq!(ids, vec![GiftId(5), GiftId(7)]);
    }

    #[test]
    fn test_user_gift_ids() {
        let tokens = vec![Token::Array(vec![
            Token::Uint(U256::from(1u64)),
            Token::Uint(U256::from(4u64)),
        ])];
        let ids = GetUserGifts {
            user: Address::zero(),
        }
        .decode(tokens)
        .unwrap();
        assert_eq!(ids, vec![GiftId(1), GiftId(4)]);
    }

    #[test]
    fn test_oversized_id_is_rejected() {
        let tokens = vec![Token::Uint(U256::from(u64::MAX) + U256::one())];
        let err = CreateGift {
            pin_hash: hash_pin("1234"),
            message: String::new(),
        }
        .decode(tokens)
        .unwrap_err();
        assert!(matches!(err, ContractError::Decode(_)));
    }

    #[test]
    fn test_platform_stats_order() {
        let tokens = (1..=7u64).map(|n| Token::Uint(U256::from(n))).collect();
        let stats = GetPlatformStats.decode(tokens).unwrap();
        assert_eq!(stats.total_gifts_created, U256::from(1u64));
        assert_eq!(stats.total_value_locked, U256::from(3u64));
        assert_eq!(stats.unclaimed_gifts, U256::from(7u64));
    }

    #[test]
    fn test_claim_tokens() {
        let hash = hash_pin("1234");
        let tokens = ClaimGift {
            id: GiftId(2),
            pin_hash: hash,
        }
        .tokens();
        assert_eq!(tokens[0], Token::Uint(U256::from(2u64)));
        assert_eq!(tokens[1], Token::FixedBytes(hash.as_bytes().to_vec()));
    }
}
