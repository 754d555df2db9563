//! Gift creation flow.
//!
//! `Draft -> Confirming -> Created`. A draft is validated locally before
//! anything is sent; a rejected draft never reaches the contract.

use giftpin_contract::{ContractTransport, CreateGift, GiftContractClient, TxHash, U256};
use giftpin_core::{
    format_ether_amount, hash_pin, parse_ether_amount, validate_message, validate_pin, Error,
    GiftCode, GiftId, PinHash, ShareLink,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{FlowError, Result};
use crate::registry::GiftCodeBook;
use crate::session::WalletSession;

/// Gift details as entered by the creator.
#[derive(Debug, Clone, Default)]
pub struct GiftDraft {
    /// Decimal ether amount, e.g. `"0.1"`.
    pub amount: String,
    pub pin: String,
    /// Optional message; empty for none.
    pub message: String,
}

/// A draft that passed local validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidDraft {
    pub amount: U256,
    pub pin_hash: PinHash,
    pub message: String,
}

impl GiftDraft {
    pub fn new(
        amount: impl Into<String>,
        pin: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            amount: amount.into(),
            pin: pin.into(),
            message: message.into(),
        }
    }

    /// Check amount > 0, PIN length and message length.
    pub fn validate(&self) -> Result<ValidDraft> {
        let amount = parse_ether_amount(&self.amount)?;
        if amount.is_zero() {
            return Err(Error::InvalidAmount("Amount must be greater than 0".to_string()).into());
        }
        validate_pin(&self.pin)?;
        validate_message(&self.message)?;

        Ok(ValidDraft {
            amount,
            pin_hash: hash_pin(&self.pin),
            message: self.message.trim().to_string(),
        })
    }
}

/// A confirmed gift with its shareable code and link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedGift {
    pub id: GiftId,
    pub code: GiftCode,
    pub link: String,
    pub amount: U256,
    pub tx_hash: TxHash,
}

impl CreatedGift {
    /// Amount in ether, for display.
    pub fn amount_ether(&self) -> String {
        format_ether_amount(self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateStep {
    /// Collecting the draft.
    Draft,
    /// `createGift` submitted, waiting for confirmation.
    Confirming { tx_hash: TxHash, amount: U256 },
    /// Terminal.
    Created(CreatedGift),
}

/// Creation flow for one signed-in user.
pub struct CreateFlow<'a, T> {
    client: &'a GiftContractClient<T>,
    book: &'a mut GiftCodeBook,
    session: &'a WalletSession,
    share_base_url: String,
    step: CreateStep,
    error: Option<FlowError>,
}

impl<'a, T: ContractTransport> CreateFlow<'a, T> {
    pub fn new(
        client: &'a GiftContractClient<T>,
        book: &'a mut GiftCodeBook,
        session: &'a WalletSession,
        share_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            book,
            session,
            share_base_url: share_base_url.into(),
            step: CreateStep::Draft,
            error: None,
        }
    }

    pub fn step(&self) -> &CreateStep {
        &self.step
    }

    pub fn error(&self) -> Option<&FlowError> {
        self.error.as_ref()
    }

    /// Start a new draft after a created gift.
    pub fn reset(&mut self) {
        self.step = CreateStep::Draft;
        self.error = None;
    }

    fn fail<R>(&mut self, err: FlowError) -> Result<R> {
        warn!("Create flow: {}", err);
        self.error = Some(err.clone());
        Err(err)
    }

    /// Validate and submit `createGift` with the amount attached.
    pub async fn submit(&mut self, draft: &GiftDraft) -> Result<TxHash> {
        if self.step != CreateStep::Draft {
            return self.fail(FlowError::WrongStep {
                action: "submit a gift",
                step: "a gift is already in progress",
            });
        }

        let valid = match draft.validate() {
            Ok(valid) => valid,
            Err(err) => return self.fail(err),
        };
        if let Err(err) = self.session.require_signed_in() {
            return self.fail(err);
        }
        if self.client.account().is_none() {
            return self.fail(FlowError::WalletNotConnected);
        }

        let call = CreateGift {
            pin_hash: valid.pin_hash,
            message: valid.message,
        };
        let tx_hash = match self.client.submit(&call, valid.amount).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => return self.fail(err.into()),
        };

        info!(?tx_hash, amount = %format_ether_amount(valid.amount), "Gift submitted");
        self.error = None;
        self.step = CreateStep::Confirming {
            tx_hash,
            amount: valid.amount,
        };
        Ok(tx_hash)
    }

    /// Wait for the creation, read the new id and mint its code.
    pub async fn confirm(&mut self) -> Result<CreatedGift> {
        let mut rng = StdRng::from_entropy();
        self.confirm_with_rng(&mut rng).await
    }

    /// [`CreateFlow::confirm`] with a caller-supplied code generator.
    pub async fn confirm_with_rng<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<CreatedGift> {
        let (tx_hash, amount) = match &self.step {
            CreateStep::Confirming { tx_hash, amount } => (*tx_hash, *amount),
            _ => {
                return self.fail(FlowError::WrongStep {
                    action: "confirm a gift",
                    step: "no gift is confirming",
                })
            }
        };

        let receipt = match self.client.confirm(tx_hash).await {
            Ok(receipt) => receipt,
            Err(err) => {
                self.step = CreateStep::Draft;
                return self.fail(err.into());
            }
        };
        let id = match self.client.created_gift_id(&receipt) {
            Ok(id) => id,
            Err(err) => {
                self.step = CreateStep::Draft;
                return self.fail(err.into());
            }
        };

        // Mint failures leave the flow confirming so the step can be retried.
        let code = match self.book.mint(id, rng) {
            Ok(code) => code,
            Err(err) => return self.fail(err),
        };
        let link = match ShareLink::new(&self.share_base_url, code.clone()) {
            Ok(link) => link.to_string(),
            Err(err) => return self.fail(err.into()),
        };

        let created = CreatedGift {
            id,
            code,
            link,
            amount,
            tx_hash,
        };
        info!(gift_id = %created.id, code = %created.code, "Gift created");
        self.error = None;
        self.step = CreateStep::Created(created.clone());
        Ok(created)
    }

    /// Submit and confirm in one go.
    pub async fn create(&mut self, draft: &GiftDraft) -> Result<CreatedGift> {
        self.submit(draft).await?;
        self.confirm().await
    }
}
