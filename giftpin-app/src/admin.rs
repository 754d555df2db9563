//! Administrative dashboard.

use giftpin_contract::{
    Admin, ChangeAdmin, ContractBalance, ContractCall, ContractTransport, EmergencyPaused,
    EmergencyWithdraw, GetGiftAdmin, GetGiftsBatch, GetPlatformStats, GiftContractClient, IsAdmin,
    ToggleEmergencyPause, TxHash, U256,
};
use giftpin_core::{parse_address, Address, GiftAdminRecord, GiftId, PlatformStats};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FlowError, Result};
use crate::session::WalletSession;

/// Snapshot of contract-wide state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdminOverview {
    pub admin: Address,
    pub stats: PlatformStats,
    /// Contract balance in wei.
    pub balance: U256,
    pub paused: bool,
}

/// Dashboard for the contract admin. Opening it checks `isAdmin`.
pub struct AdminDashboard<'a, T> {
    client: &'a GiftContractClient<T>,
    admin: Address,
}

impl<'a, T: ContractTransport> AdminDashboard<'a, T> {
    /// Open the dashboard for the session's wallet.
    pub async fn open(client: &'a GiftContractClient<T>, session: &WalletSession) -> Result<Self> {
        let account = session.require_connected()?;
        if !client.read(&IsAdmin { account }).await? {
            warn!(?account, "Access denied. Admin only.");
            return Err(FlowError::AccessDenied);
        }
        Ok(Self {
            client,
            admin: account,
        })
    }

    /// The account the dashboard was opened for.
    pub fn account(&self) -> Address {
        self.admin
    }

    pub async fn overview(&self) -> Result<AdminOverview> {
        Ok(AdminOverview {
            admin: self.client.read(&Admin).await?,
            stats: self.client.read(&GetPlatformStats).await?,
            balance: self.client.read(&ContractBalance).await?,
            paused: self.client.read(&EmergencyPaused).await?,
        })
    }

    async fn execute<C: ContractCall>(&self, call: &C) -> Result<TxHash> {
        let tx_hash = self.client.submit(call, U256::zero()).await?;
        self.client.confirm(tx_hash).await?;
        info!(function = C::FUNCTION, ?tx_hash, "Admin action confirmed");
        Ok(tx_hash)
    }

    /// Flip the emergency pause; returns the new pause state.
    pub async fn toggle_pause(&self) -> Result<bool> {
        self.execute(&ToggleEmergencyPause).await?;
        Ok(self.client.read(&EmergencyPaused).await?)
    }

    /// Withdraw the contract balance to `recipient`.
    pub async fn emergency_withdraw(&self, recipient: &str) -> Result<TxHash> {
        let recipient = parse_address(recipient.trim())?;
        self.execute(&EmergencyWithdraw { recipient }).await
    }

    /// Hand the admin role to `new_admin`.
    pub async fn change_admin(&self, new_admin: &str) -> Result<TxHash> {
        let new_admin = parse_address(new_admin.trim())?;
        self.execute(&ChangeAdmin { new_admin }).await
    }

    /// Privileged single lookup, including the PIN hash.
    pub async fn gift(&self, id: GiftId) -> Result<GiftAdminRecord> {
        self.client
            .read(&GetGiftAdmin { id })
            .await?
            .ok_or(FlowError::NotFound)
    }

    /// Up to `count` gifts starting at `start`; absent ids are skipped.
    pub async fn batch(&self, start: GiftId, count: u64) -> Result<Vec<GiftAdminRecord>> {
        if count == 0 {
            return Err(FlowError::EmptyBatch);
        }
        Ok(self.client.read(&GetGiftsBatch { start, count }).await?)
    }
}
