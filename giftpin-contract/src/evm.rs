//! EVM transport backed by an ethers HTTP provider.

use async_trait::async_trait;
use ethers::prelude::*;
use ethers::types::transaction::eip2718::TypedTransaction;
use tracing::{debug, info};

use crate::{CallRequest, ContractError, ContractTransport, TxReceipt};

/// JSON-RPC transport with an optional local signing wallet.
///
/// Without a private key the transport can read but every write or dry-run
/// fails with [`ContractError::NotConnected`].
pub struct EvmTransport {
    provider: Provider<Http>,
    signer: Option<SignerMiddleware<Provider<Http>, LocalWallet>>,
    confirmations: usize,
}

impl EvmTransport {
    pub fn new(
        rpc_url: &str,
        chain_id: u64,
        private_key: Option<&str>,
        confirmations: usize,
    ) -> Result<Self, ContractError> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| ContractError::Transport(format!("Invalid RPC URL: {}", e)))?;

        let signer = match private_key {
            Some(key) => {
                let wallet = key
                    .trim()
                    .parse::<LocalWallet>()
                    .map_err(|e| ContractError::Transport(format!("Invalid private key: {}", e)))?
                    .with_chain_id(chain_id);
                info!(address = ?wallet.address(), chain_id, "Wallet connected");
                Some(SignerMiddleware::new(provider.clone(), wallet))
            }
            None => None,
        };

        Ok(Self {
            provider,
            signer,
            confirmations,
        })
    }
}

/// Node errors carrying a revert reason become [`ContractError::Reverted`].
fn classify(err: impl std::fmt::Display) -> ContractError {
    let message = err.to_string();
    if message.to_ascii_lowercase().contains("revert") {
        ContractError::Reverted(message)
    } else {
        ContractError::Transport(message)
    }
}

/// `eth_call` payload for a request; the sender is kept so `msg.sender`
/// checks see the connected account.
fn call_transaction(request: &CallRequest) -> TypedTransaction {
    request.to_transaction().into()
}

#[async_trait]
impl ContractTransport for EvmTransport {
    fn account(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn call(&self, request: &CallRequest) -> Result<Bytes, ContractError> {
        let tx = call_transaction(request);
        debug!(to = ?request.to, "eth_call");
        self.provider.call(&tx, None).await.map_err(classify)
    }

    async fn send(&self, request: &CallRequest) -> Result<TxHash, ContractError> {
        let signer = self.signer.as_ref().ok_or(ContractError::NotConnected)?;
        debug!(to = ?request.to, value = %request.value, "Sending transaction");
        let pending = signer
            .send_transaction(request.to_transaction(), None)
            .await
            .map_err(classify)?;
        Ok(pending.tx_hash())
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<TxReceipt, ContractError> {
        debug!(?tx_hash, confirmations = self.confirmations, "Waiting for receipt");
        let receipt = PendingTransaction::new(tx_hash, &self.provider)
            .confirmations(self.confirmations)
            .await
            .map_err(classify)?
            .ok_or_else(|| {
                ContractError::Transport(format!("transaction {:?} was dropped", tx_hash))
            })?;
        Ok(receipt.into())
    }
}
