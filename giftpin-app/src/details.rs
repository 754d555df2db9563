//! Gift details, share links and per-user activity.

use giftpin_contract::{
    CancelGift, ContractTransport, GetGift, GetUserClaims, GetUserGiftCount, GetUserGifts,
    GiftContractClient, HasClaimedGift, HasCreatedGift, TxHash, U256,
};
use giftpin_core::{format_ether_amount, Address, GiftCode, GiftId, GiftRecord, ShareLink};
use serde::Serialize;
use tracing::info;

use crate::error::{FlowError, Result};
use crate::registry::GiftCodeBook;

/// A gift with the code and link to share it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GiftDetails {
    pub gift: GiftRecord,
    /// `None` when the local registry has no code for this gift.
    pub code: Option<GiftCode>,
    pub link: Option<String>,
}

impl GiftDetails {
    pub async fn load<T: ContractTransport>(
        client: &GiftContractClient<T>,
        book: &GiftCodeBook,
        share_base_url: &str,
        id: GiftId,
    ) -> Result<Self> {
        let gift = client.read(&GetGift { id }).await?.ok_or(FlowError::NotFound)?;
        let code = book.code_for(id);
        let link = match &code {
            Some(code) => Some(ShareLink::new(share_base_url, code.clone())?.to_string()),
            None => None,
        };
        Ok(Self { gift, code, link })
    }

    /// Amount in ether, for display.
    pub fn amount_ether(&self) -> String {
        format_ether_amount(self.gift.amount)
    }
}

/// Gifts an account has created and claimed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserActivity {
    pub account: Address,
    pub created: Vec<GiftId>,
    pub claimed: Vec<GiftId>,
    pub created_count: u64,
    pub has_created: bool,
    pub has_claimed: bool,
}

impl UserActivity {
    pub async fn load<T: ContractTransport>(
        client: &GiftContractClient<T>,
        account: Address,
    ) -> Result<Self> {
        Ok(Self {
            account,
            created: client.read(&GetUserGifts { user: account }).await?,
            claimed: client.read(&GetUserClaims { user: account }).await?,
            created_count: client.read(&GetUserGiftCount { user: account }).await?,
            has_created: client.read(&HasCreatedGift { user: account }).await?,
            has_claimed: client.read(&HasClaimedGift { user: account }).await?,
        })
    }
}

/// Cancel an unclaimed gift as its creator and wait for confirmation.
pub async fn cancel_gift<T: ContractTransport>(
    client: &GiftContractClient<T>,
    id: GiftId,
) -> Result<TxHash> {
    let account = client.account().ok_or(FlowError::WalletNotConnected)?;
    let gift = client.read(&GetGift { id }).await?.ok_or(FlowError::NotFound)?;
    if gift.is_claimed() {
        return Err(FlowError::AlreadyClaimed);
    }
    if gift.creator != account {
        return Err(FlowError::NotCreator);
    }

    let tx_hash = client.submit(&CancelGift { id }, U256::zero()).await?;
    client.confirm(tx_hash).await?;
    info!(gift_id = %id, ?tx_hash, "Gift cancelled");
    Ok(tx_hash)
}
