//! Transport seam between typed calls and a chain.

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TransactionReceipt, TransactionRequest, TxHash, H256, U256, U64};

use crate::ContractError;

/// A contract call, ready to evaluate or sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    /// Contract address.
    pub to: Address,
    /// Caller; dry-runs evaluate as this account.
    pub from: Option<Address>,
    /// ABI-encoded calldata, selector included.
    pub data: Bytes,
    /// Native value attached to the call.
    pub value: U256,
}

impl CallRequest {
    pub fn to_transaction(&self) -> TransactionRequest {
        let mut tx = TransactionRequest::new()
            .to(self.to)
            .data(self.data.clone())
            .value(self.value);
        if let Some(from) = self.from {
            tx = tx.from(from);
        }
        tx
    }
}

/// A single log emitted by a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
}

/// The parts of a transaction receipt the client reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    /// False when the transaction was mined but reverted.
    pub success: bool,
    pub logs: Vec<LogEntry>,
}

impl From<TransactionReceipt> for TxReceipt {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            success: receipt.status == Some(U64::from(1u64)),
            logs: receipt
                .logs
                .into_iter()
                .map(|log| LogEntry {
                    address: log.address,
                    topics: log.topics,
                    data: log.data,
                })
                .collect(),
        }
    }
}

/// Chain access used by [`crate::GiftContractClient`].
///
/// `send` returns as soon as the signer hands back a transaction hash;
/// `wait_for_receipt` suspends until the transaction is included or fails.
#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// The connected wallet account, if any.
    fn account(&self) -> Option<Address>;

    /// Evaluate a call without submitting it (reads and dry-runs).
    async fn call(&self, request: &CallRequest) -> Result<Bytes, ContractError>;

    /// Sign and broadcast a call from the connected account.
    async fn send(&self, request: &CallRequest) -> Result<TxHash, ContractError>;

    /// Wait for a submitted transaction to be confirmed.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ContractError>;
}
