//! Typed client over a [`ContractTransport`].

use ethers::types::{Address, Bytes, TxHash, U256};
use giftpin_core::GiftId;
use tracing::{debug, info, warn};

use crate::abi::{self, GIFT_CREATED_EVENT};
use crate::{CallRequest, ContractCall, ContractError, ContractTransport, TxReceipt};

/// Client for the gift contract at a fixed address.
#[derive(Debug, Clone)]
pub struct GiftContractClient<T> {
    transport: T,
    address: Address,
}

impl<T: ContractTransport> GiftContractClient<T> {
    pub fn new(transport: T, address: Address) -> Self {
        Self { transport, address }
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The connected wallet account, if any.
    pub fn account(&self) -> Option<Address> {
        self.transport.account()
    }

    fn request<C: ContractCall>(
        &self,
        call: &C,
        from: Option<Address>,
        value: U256,
    ) -> Result<CallRequest, ContractError> {
        let function = abi::function(C::FUNCTION)?;
        let data = function.encode_input(&call.tokens())?;
        Ok(CallRequest {
            to: self.address,
            from,
            data: Bytes::from(data),
            value,
        })
    }

    fn decode_output<C: ContractCall>(call: &C, raw: &Bytes) -> Result<C::Output, ContractError> {
        let function = abi::function(C::FUNCTION)?;
        let tokens = function
            .decode_output(raw)
            .map_err(|e| ContractError::Decode(format!("{}: {}", C::FUNCTION, e)))?;
        call.decode(tokens)
    }

    /// Evaluate a read-only call, as the connected account when there is one.
    pub async fn read<C: ContractCall>(&self, call: &C) -> Result<C::Output, ContractError> {
        debug!(function = C::FUNCTION, "Reading contract");
        let request = self.request(call, self.account(), U256::zero())?;
        let raw = self.transport.call(&request).await?;
        Self::decode_output(call, &raw)
    }

    /// Dry-run a state-changing call from the connected account.
    ///
    /// Nothing is submitted; a revert surfaces as [`ContractError::Reverted`].
    pub async fn simulate<C: ContractCall>(
        &self,
        call: &C,
        value: U256,
    ) -> Result<C::Output, ContractError> {
        let account = self.account().ok_or(ContractError::NotConnected)?;
        debug!(function = C::FUNCTION, ?account, "Simulating call");
        let request = self.request(call, Some(account), value)?;
        let raw = self.transport.call(&request).await?;
        Self::decode_output(call, &raw)
    }

    /// Sign and broadcast a state-changing call from the connected account.
    pub async fn submit<C: ContractCall>(
        &self,
        call: &C,
        value: U256,
    ) -> Result<TxHash, ContractError> {
        let account = self.account().ok_or(ContractError::NotConnected)?;
        let request = self.request(call, Some(account), value)?;
        let tx_hash = self.transport.send(&request).await?;
        info!(function = C::FUNCTION, ?tx_hash, "Transaction submitted");
        Ok(tx_hash)
    }

    /// Wait for a submitted transaction. A mined-but-failed transaction is
    /// reported as [`ContractError::Reverted`].
    pub async fn confirm(&self, tx_hash: TxHash) -> Result<TxReceipt, ContractError> {
        let receipt = self.transport.wait_for_receipt(tx_hash).await?;
        if !receipt.success {
            warn!(?tx_hash, "Transaction reverted");
            return Err(ContractError::Reverted(format!(
                "transaction {:?} failed",
                tx_hash
            )));
        }
        info!(?tx_hash, logs = receipt.logs.len(), "Transaction confirmed");
        Ok(receipt)
    }

    /// Gift id from the `GiftCreated` log this contract emitted.
    pub fn created_gift_id(&self, receipt: &TxReceipt) -> Result<GiftId, ContractError> {
        let topic = abi::gift_created_topic();
        let log = receipt
            .logs
            .iter()
            .find(|log| log.address == self.address && log.topics.first() == Some(&topic))
            .ok_or(ContractError::MissingEvent(GIFT_CREATED_EVENT))?;
        let id_topic = log.topics.get(1).ok_or_else(|| {
            ContractError::Decode(format!("{} log has no indexed gift id", GIFT_CREATED_EVENT))
        })?;

        let id = U256::from_big_endian(id_topic.as_bytes());
        if id > U256::from(u64::MAX) {
            return Err(ContractError::Decode(format!(
                "gift id {} does not fit in u64",
                id
            )));
        }
        Ok(GiftId(id.as_u64()))
    }
}
