//! In-memory stand-in for the gift escrow contract.
//!
//! [`FakeGiftContract`] implements [`ContractTransport`] by decoding real ABI
//! calldata, executing it against shared in-memory state and encoding real
//! ABI outputs. Dry-runs execute on a copy and never commit. Every request is
//! recorded so tests can assert what did (or did not) reach the chain.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use ethers::abi::Token;
use giftpin_contract::{
    abi, Address, Bytes, CallRequest, ContractError, ContractTransport, LogEntry, TxHash,
    TxReceipt, H256, U256,
};
use giftpin_core::{hash_pin, GiftId};

/// Timestamp the fake clock starts at.
pub const CREATED_AT_UNIX: u64 = 1_700_000_000;

/// Address the fake contract lives at.
pub fn contract_address() -> Address {
    Address::repeat_byte(0xc0)
}

/// Default admin account.
pub fn admin() -> Address {
    Address::repeat_byte(0xad)
}

/// A gift creator account.
pub fn alice() -> Address {
    Address::repeat_byte(0xa1)
}

/// A gift recipient account.
pub fn bob() -> Address {
    Address::repeat_byte(0xb0)
}

/// Whether a request was evaluated or submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Call,
    Send,
}

/// A request the fake has seen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub kind: CallKind,
    pub function: String,
    pub from: Option<Address>,
    pub value: U256,
}

#[derive(Debug, Clone)]
struct StoredGift {
    creator: Address,
    amount: U256,
    pin_hash: [u8; 32],
    claimed: bool,
    claimed_by: Address,
    created_at: u64,
    claimed_at: u64,
    message: String,
}

#[derive(Debug, Clone)]
struct FakeState {
    admin: Address,
    paused: bool,
    next_id: u64,
    gifts: BTreeMap<u64, StoredGift>,
    user_gifts: HashMap<Address, Vec<u64>>,
    user_claims: HashMap<Address, Vec<u64>>,
    balance: U256,
    total_created: u64,
    total_claimed: u64,
    value_claimed: U256,
    creators: BTreeSet<Address>,
    claimers: BTreeSet<Address>,
    payouts: HashMap<Address, U256>,
    clock: u64,
    tx_counter: u64,
    receipts: HashMap<TxHash, TxReceipt>,
    calls: Vec<RecordedCall>,
    fail_next_send: Option<String>,
}

impl FakeState {
    fn new(admin: Address) -> Self {
        Self {
            admin,
            paused: false,
            next_id: 1,
            gifts: BTreeMap::new(),
            user_gifts: HashMap::new(),
            user_claims: HashMap::new(),
            balance: U256::zero(),
            total_created: 0,
            total_claimed: 0,
            value_claimed: U256::zero(),
            creators: BTreeSet::new(),
            claimers: BTreeSet::new(),
            payouts: HashMap::new(),
            clock: CREATED_AT_UNIX,
            tx_counter: 0,
            receipts: HashMap::new(),
            calls: Vec::new(),
            fail_next_send: None,
        }
    }
}

/// Result of executing one call.
struct Outcome {
    output: Vec<Token>,
    logs: Vec<LogEntry>,
}

impl Outcome {
    fn returns(output: Vec<Token>) -> Self {
        Self {
            output,
            logs: Vec::new(),
        }
    }

    fn empty() -> Self {
        Self::returns(Vec::new())
    }
}

fn revert(reason: &str) -> ContractError {
    ContractError::Reverted(reason.to_string())
}

fn uint(n: u64) -> Token {
    Token::Uint(U256::from(n))
}

fn word(value: U256) -> H256 {
    let mut bytes = [0u8; 32];
    value.to_big_endian(&mut bytes);
    H256::from(bytes)
}

/// Positional argument reader over decoded calldata.
struct Args(std::vec::IntoIter<Token>);

impl Args {
    fn next(&mut self) -> Result<Token, ContractError> {
        self.0
            .next()
            .ok_or_else(|| ContractError::Decode("missing argument".to_string()))
    }

    fn uint(&mut self) -> Result<U256, ContractError> {
        match self.next()? {
            Token::Uint(v) => Ok(v),
            other => Err(ContractError::Decode(format!("expected uint, got {:?}", other))),
        }
    }

    fn u64(&mut self) -> Result<u64, ContractError> {
        let v = self.uint()?;
        if v > U256::from(u64::MAX) {
            return Err(ContractError::Decode(format!("{} out of range", v)));
        }
        Ok(v.as_u64())
    }

    fn address(&mut self) -> Result<Address, ContractError> {
        match self.next()? {
            Token::Address(a) => Ok(a),
            other => Err(ContractError::Decode(format!("expected address, got {:?}", other))),
        }
    }

    fn bytes32(&mut self) -> Result<[u8; 32], ContractError> {
        match self.next()? {
            Token::FixedBytes(b) if b.len() == 32 => {
                let mut out = [0u8; 32];
                out.copy_from_slice(&b);
                Ok(out)
            }
            other => Err(ContractError::Decode(format!("expected bytes32, got {:?}", other))),
        }
    }

    fn string(&mut self) -> Result<String, ContractError> {
        match self.next()? {
            Token::String(s) => Ok(s),
            other => Err(ContractError::Decode(format!("expected string, got {:?}", other))),
        }
    }
}

fn gift_tokens(gift: Option<&StoredGift>, with_pin_hash: bool) -> Vec<Token> {
    let empty = StoredGift {
        creator: Address::zero(),
        amount: U256::zero(),
        pin_hash: [0u8; 32],
        claimed: false,
        claimed_by: Address::zero(),
        created_at: 0,
        claimed_at: 0,
        message: String::new(),
    };
    let gift = gift.unwrap_or(&empty);

    let mut tokens = vec![Token::Address(gift.creator), Token::Uint(gift.amount)];
    if with_pin_hash {
        tokens.push(Token::FixedBytes(gift.pin_hash.to_vec()));
    }
    tokens.extend([
        Token::Bool(gift.claimed),
        Token::Address(gift.claimed_by),
        uint(gift.created_at),
        uint(gift.claimed_at),
        Token::String(gift.message.clone()),
    ]);
    tokens
}

fn only_admin(state: &FakeState, sender: Address) -> Result<(), ContractError> {
    if sender == state.admin {
        Ok(())
    } else {
        Err(revert("Only admin can call this function"))
    }
}

fn id_list(ids: Option<&Vec<u64>>) -> Vec<Token> {
    let ids: Vec<Token> = ids.map(|v| v.iter().map(|id| uint(*id)).collect()).unwrap_or_default();
    vec![Token::Array(ids)]
}

fn execute(
    state: &mut FakeState,
    contract: Address,
    from: Option<Address>,
    value: U256,
    data: &[u8],
) -> Result<Outcome, ContractError> {
    if data.len() < 4 {
        return Err(ContractError::Decode("calldata shorter than a selector".to_string()));
    }
    let function = abi::function_by_selector(&data[..4])
        .ok_or_else(|| ContractError::Abi("unknown selector".to_string()))?;
    let mut args = Args(function.decode_input(&data[4..])?.into_iter());
    let sender = from.unwrap_or_default();

    let outcome = match function.name.as_str() {
        "admin" => Outcome::returns(vec![Token::Address(state.admin)]),
        "isAdmin" => {
            let account = args.address()?;
            Outcome::returns(vec![Token::Bool(account == state.admin)])
        }
        "emergencyPaused" => Outcome::returns(vec![Token::Bool(state.paused)]),
        "getContractBalance" => Outcome::returns(vec![Token::Uint(state.balance)]),
        "getGift" => {
            let id = args.u64()?;
            Outcome::returns(gift_tokens(state.gifts.get(&id), false))
        }
        "getGiftAdmin" => {
            only_admin(state, sender)?;
            let id = args.u64()?;
            Outcome::returns(gift_tokens(state.gifts.get(&id), true))
        }
        "gifts" => {
            let id = args.u64()?;
            Outcome::returns(gift_tokens(state.gifts.get(&id), true))
        }
        "getGiftsBatch" => {
            only_admin(state, sender)?;
            let start = args.u64()?;
            let count = args.u64()?;
            let entries = (start..start.saturating_add(count))
                .map(|id| Token::Tuple(gift_tokens(state.gifts.get(&id), true)))
                .collect();
            Outcome::returns(vec![Token::Array(entries)])
        }
        "getUserGifts" => {
            let user = args.address()?;
            Outcome::returns(id_list(state.user_gifts.get(&user)))
        }
        "getUserClaims" => {
            let user = args.address()?;
            Outcome::returns(id_list(state.user_claims.get(&user)))
        }
        "getUserGiftCount" => {
            let user = args.address()?;
            let count = state.user_gifts.get(&user).map_or(0, Vec::len);
            Outcome::returns(vec![uint(count as u64)])
        }
        "hasCreatedGift" => {
            let user = args.address()?;
            Outcome::returns(vec![Token::Bool(state.creators.contains(&user))])
        }
        "hasClaimedGift" => {
            let user = args.address()?;
            Outcome::returns(vec![Token::Bool(state.claimers.contains(&user))])
        }
        "getPlatformStats" => {
            let unclaimed = state.gifts.values().filter(|g| !g.claimed).count() as u64;
            Outcome::returns(vec![
                uint(state.total_created),
                uint(state.total_claimed),
                Token::Uint(state.balance),
                Token::Uint(state.value_claimed),
                uint(state.creators.len() as u64),
                uint(state.claimers.len() as u64),
                uint(unclaimed),
            ])
        }
        "totalGiftsCreated" => Outcome::returns(vec![uint(state.total_created)]),
        "totalGiftsClaimed" => Outcome::returns(vec![uint(state.total_claimed)]),
        "totalValueLocked" => Outcome::returns(vec![Token::Uint(state.balance)]),
        "totalValueClaimed" => Outcome::returns(vec![Token::Uint(state.value_claimed)]),
        "totalCreators" => Outcome::returns(vec![uint(state.creators.len() as u64)]),
        "totalClaimers" => Outcome::returns(vec![uint(state.claimers.len() as u64)]),
        "createGift" => {
            let pin_hash = args.bytes32()?;
            let message = args.string()?;
            if state.paused {
                return Err(revert("Contract is paused"));
            }
            if value.is_zero() {
                return Err(revert("Amount must be greater than 0"));
            }

            let id = state.next_id;
            state.next_id += 1;
            state.gifts.insert(
                id,
                StoredGift {
                    creator: sender,
                    amount: value,
                    pin_hash,
                    claimed: false,
                    claimed_by: Address::zero(),
                    created_at: state.clock,
                    claimed_at: 0,
                    message: message.clone(),
                },
            );
            state.user_gifts.entry(sender).or_default().push(id);
            state.creators.insert(sender);
            state.total_created += 1;
            state.balance += value;

            let log = LogEntry {
                address: contract,
                topics: vec![
                    abi::gift_created_topic(),
                    word(U256::from(id)),
                    H256::from(sender),
                ],
                data: Bytes::from(ethers::abi::encode(&[
                    Token::Uint(value),
                    Token::String(message),
                ])),
            };
            Outcome {
                output: vec![uint(id)],
                logs: vec![log],
            }
        }
        "claimGift" => {
            let id = args.u64()?;
            let pin_hash = args.bytes32()?;
            if state.paused {
                return Err(revert("Contract is paused"));
            }
            let clock = state.clock;
            let gift = state
                .gifts
                .get_mut(&id)
                .ok_or_else(|| revert("Gift does not exist"))?;
            if gift.claimed {
                return Err(revert("Gift already claimed"));
            }
            if gift.pin_hash != pin_hash {
                return Err(revert("Invalid PIN"));
            }

            gift.claimed = true;
            gift.claimed_by = sender;
            gift.claimed_at = clock;
            let amount = gift.amount;

            state.user_claims.entry(sender).or_default().push(id);
            state.claimers.insert(sender);
            state.total_claimed += 1;
            state.value_claimed += amount;
            state.balance -= amount;
            *state.payouts.entry(sender).or_default() += amount;

            let claimed_topic = abi::event("GiftClaimed")?.signature();
            let log = LogEntry {
                address: contract,
                topics: vec![claimed_topic, word(U256::from(id)), H256::from(sender)],
                data: Bytes::from(ethers::abi::encode(&[Token::Uint(amount)])),
            };
            Outcome {
                output: Vec::new(),
                logs: vec![log],
            }
        }
        "cancelGift" => {
            let id = args.u64()?;
            let gift = state
                .gifts
                .get(&id)
                .ok_or_else(|| revert("Gift does not exist"))?;
            if gift.creator != sender {
                return Err(revert("Only creator can cancel"));
            }
            if gift.claimed {
                return Err(revert("Gift already claimed"));
            }
            let amount = gift.amount;
            state.gifts.remove(&id);
            state.balance -= amount;
            *state.payouts.entry(sender).or_default() += amount;
            Outcome::empty()
        }
        "toggleEmergencyPause" => {
            only_admin(state, sender)?;
            state.paused = !state.paused;
            Outcome::empty()
        }
        "emergencyWithdraw" => {
            only_admin(state, sender)?;
            let recipient = args.address()?;
            if recipient.is_zero() {
                return Err(revert("Invalid recipient"));
            }
            let amount = std::mem::take(&mut state.balance);
            *state.payouts.entry(recipient).or_default() += amount;
            Outcome::empty()
        }
        "changeAdmin" => {
            only_admin(state, sender)?;
            let new_admin = args.address()?;
            if new_admin.is_zero() {
                return Err(revert("Invalid admin address"));
            }
            state.admin = new_admin;
            Outcome::empty()
        }
        other => return Err(ContractError::Abi(format!("unsupported function {}", other))),
    };
    Ok(outcome)
}

fn function_name(data: &[u8]) -> String {
    data.get(..4)
        .and_then(abi::function_by_selector)
        .map(|f| f.name.clone())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Handle onto a shared fake contract, bound to one wallet account.
#[derive(Debug, Clone)]
pub struct FakeGiftContract {
    state: Arc<Mutex<FakeState>>,
    account: Option<Address>,
}

impl Default for FakeGiftContract {
    fn default() -> Self {
        Self::new(admin())
    }
}

impl FakeGiftContract {
    /// A fresh contract administered by `admin`, with no wallet connected.
    pub fn new(admin: Address) -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState::new(admin))),
            account: None,
        }
    }

    /// Start numbering new gifts at `id`.
    pub fn with_next_id(self, id: u64) -> Self {
        self.lock().next_id = id;
        self
    }

    /// A handle on the same contract with `account` connected.
    pub fn connect(&self, account: Address) -> Self {
        Self {
            state: Arc::clone(&self.state),
            account: Some(account),
        }
    }

    /// A handle on the same contract with no wallet connected.
    pub fn disconnected(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            account: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        // A panicking test poisons the lock; the state is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fund a gift directly, bypassing the transport.
    pub fn seed_gift(&self, creator: Address, amount: U256, pin: &str, message: &str) -> GiftId {
        let mut state = self.lock();
        let data = abi::function("createGift")
            .and_then(|f| {
                f.encode_input(&[
                    Token::FixedBytes(hash_pin(pin).as_bytes().to_vec()),
                    Token::String(message.to_string()),
                ])
                .map_err(ContractError::from)
            })
            .expect("createGift encodes");
        let outcome = execute(&mut state, contract_address(), Some(creator), amount, &data)
            .expect("seeded gift is valid");
        match outcome.output.first() {
            Some(Token::Uint(id)) => GiftId(id.as_u64()),
            _ => unreachable!("createGift returns an id"),
        }
    }

    /// Every request seen so far, across all handles.
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Number of submitted transactions.
    pub fn send_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.kind == CallKind::Send)
            .count()
    }

    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    /// Make the next `send` fail before reaching the contract.
    pub fn fail_next_send(&self, reason: &str) {
        self.lock().fail_next_send = Some(reason.to_string());
    }

    pub fn advance_clock(&self, secs: u64) {
        self.lock().clock += secs;
    }

    pub fn set_paused(&self, paused: bool) {
        self.lock().paused = paused;
    }

    pub fn current_admin(&self) -> Address {
        self.lock().admin
    }

    pub fn balance(&self) -> U256 {
        self.lock().balance
    }

    /// Total paid out to `account` by claims, cancellations and withdrawals.
    pub fn paid_to(&self, account: Address) -> U256 {
        self.lock().payouts.get(&account).copied().unwrap_or_default()
    }
}

#[async_trait]
impl ContractTransport for FakeGiftContract {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, ContractError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            kind: CallKind::Call,
            function: function_name(&request.data),
            from: request.from,
            value: request.value,
        });

        let mut scratch = state.clone();
        let outcome = execute(
            &mut scratch,
            request.to,
            request.from,
            request.value,
            &request.data,
        )?;
        Ok(Bytes::from(ethers::abi::encode(&outcome.output)))
    }

    async fn send(&self, request: &CallRequest) -> Result<TxHash, ContractError> {
        let mut state = self.lock();
        state.calls.push(RecordedCall {
            kind: CallKind::Send,
            function: function_name(&request.data),
            from: request.from,
            value: request.value,
        });
        if let Some(reason) = state.fail_next_send.take() {
            return Err(ContractError::Transport(reason));
        }
        if request.from.is_none() {
            return Err(ContractError::NotConnected);
        }

        state.tx_counter += 1;
        let tx_hash = TxHash::from_low_u64_be(state.tx_counter);

        // Reverts are mined as failed transactions, like a chain would.
        let mut scratch = state.clone();
        let receipt = match execute(
            &mut scratch,
            request.to,
            request.from,
            request.value,
            &request.data,
        ) {
            Ok(outcome) => {
                *state = scratch;
                TxReceipt {
                    tx_hash,
                    success: true,
                    logs: outcome.logs,
                }
            }
            Err(ContractError::Reverted(_)) => TxReceipt {
                tx_hash,
                success: false,
                logs: Vec::new(),
            },
            Err(other) => return Err(other),
        };
        state.receipts.insert(tx_hash, receipt);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ContractError> {
        self.lock()
            .receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| ContractError::Transport(format!("unknown transaction {:?}", tx_hash)))
    }
}
