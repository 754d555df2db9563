//! Claim flow.
//!
//! ```text
//!  Input ──code──▶ Verify{Found} ──pin + dry-run──▶ Claim{Ready}
//!    │               │                                 │ submit
//!    │               └─▶ Verify{NotFound}              ▼
//!    │                                           Claim{Confirming}
//!    └──code of a claimed gift──▶ Claim{Claimed} ◀──────┘ confirm
//! ```
//!
//! A failed step keeps the flow where it was and records the error, except a
//! PIN check that finds the gift already claimed, which ends the flow. Nothing
//! is retried automatically.

use giftpin_contract::{
    ClaimGift, ContractError, ContractTransport, GetGift, GiftContractClient, TxHash, U256,
};
use giftpin_core::{hash_pin, GiftCode, GiftRecord, PinHash};
use tracing::{debug, info, warn};

use crate::error::{FlowError, Result};
use crate::registry::GiftCodeBook;

/// Outcome of resolving a code against the contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiftLookup {
    /// The code is unknown or the contract has no such gift.
    NotFound,
    /// An unclaimed gift.
    Found(GiftRecord),
}

/// Progress of the redeeming transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimPhase {
    /// PIN verified by dry-run; ready to submit.
    Ready { pin_hash: PinHash },
    /// Submitted and waiting for confirmation.
    Confirming { pin_hash: PinHash, tx_hash: TxHash },
    /// Terminal. `tx_hash` is `None` when the gift was already claimed on arrival.
    Claimed { tx_hash: Option<TxHash> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimStep {
    /// Awaiting a code.
    Input,
    /// Code entered; awaiting the PIN.
    Verify { code: GiftCode, lookup: GiftLookup },
    /// Redeeming, or showing a claimed gift.
    Claim {
        code: GiftCode,
        gift: GiftRecord,
        phase: ClaimPhase,
    },
}

impl ClaimStep {
    fn describe(&self) -> &'static str {
        match self {
            ClaimStep::Input => "awaiting a code",
            ClaimStep::Verify {
                lookup: GiftLookup::NotFound,
                ..
            } => "the gift was not found",
            ClaimStep::Verify { .. } => "awaiting the PIN",
            ClaimStep::Claim {
                phase: ClaimPhase::Ready { .. },
                ..
            } => "ready to claim",
            ClaimStep::Claim {
                phase: ClaimPhase::Confirming { .. },
                ..
            } => "a claim is confirming",
            ClaimStep::Claim {
                phase: ClaimPhase::Claimed { .. },
                ..
            } => "the gift is claimed",
        }
    }
}

/// Claim flow for one user, over a contract client and a code book.
pub struct ClaimFlow<'a, T> {
    client: &'a GiftContractClient<T>,
    book: &'a GiftCodeBook,
    step: ClaimStep,
    error: Option<FlowError>,
}

impl<'a, T: ContractTransport> ClaimFlow<'a, T> {
    /// A flow waiting for a code.
    pub fn new(client: &'a GiftContractClient<T>, book: &'a GiftCodeBook) -> Self {
        Self {
            client,
            book,
            step: ClaimStep::Input,
            error: None,
        }
    }

    /// Enter through a link or code parameter, skipping the input step.
    ///
    /// Resolution failures are kept in [`ClaimFlow::error`].
    pub async fn open(
        client: &'a GiftContractClient<T>,
        book: &'a GiftCodeBook,
        input: &str,
    ) -> Self {
        let mut flow = Self::new(client, book);
        let _ = flow.submit_code(input).await;
        flow
    }

    pub fn step(&self) -> &ClaimStep {
        &self.step
    }

    /// The last error, cleared by the next successful action.
    pub fn error(&self) -> Option<&FlowError> {
        self.error.as_ref()
    }

    /// The gift being claimed, once resolved.
    pub fn gift(&self) -> Option<&GiftRecord> {
        match &self.step {
            ClaimStep::Verify {
                lookup: GiftLookup::Found(gift),
                ..
            } => Some(gift),
            ClaimStep::Claim { gift, .. } => Some(gift),
            _ => None,
        }
    }

    pub fn is_claimed(&self) -> bool {
        matches!(
            self.step,
            ClaimStep::Claim {
                phase: ClaimPhase::Claimed { .. },
                ..
            }
        )
    }

    /// Back to the input step.
    pub fn reset(&mut self) {
        self.step = ClaimStep::Input;
        self.error = None;
    }

    fn fail<R>(&mut self, err: FlowError) -> Result<R> {
        warn!(step = self.step.describe(), "Claim flow: {}", err);
        self.error = Some(err.clone());
        Err(err)
    }

    fn wrong_step<R>(&mut self, action: &'static str) -> Result<R> {
        let step = self.step.describe();
        self.fail(FlowError::WrongStep { action, step })
    }

    /// Resolve a code (or claim link) and move to the PIN step.
    ///
    /// A malformed code stays in `Input`. An unknown code or absent gift
    /// moves to `Verify { NotFound }`. A gift that is already claimed moves
    /// straight to the terminal `Claim { Claimed }` step.
    pub async fn submit_code(&mut self, input: &str) -> Result<()> {
        if matches!(self.step, ClaimStep::Claim { .. }) {
            return self.wrong_step("enter a code");
        }

        let code = match self.book.parse_code(input) {
            Ok(code) => code,
            Err(err) => {
                self.step = ClaimStep::Input;
                return self.fail(err);
            }
        };

        let Some(id) = self.book.resolve(&code) else {
            debug!(%code, scheme = %self.book.scheme(), "Code not in registry");
            self.step = ClaimStep::Verify {
                code,
                lookup: GiftLookup::NotFound,
            };
            return self.fail(FlowError::NotFound);
        };

        let gift = match self.client.read(&GetGift { id }).await {
            Ok(gift) => gift,
            Err(err) => return self.fail(err.into()),
        };

        self.error = None;
        match gift {
            None => {
                self.step = ClaimStep::Verify {
                    code,
                    lookup: GiftLookup::NotFound,
                };
                self.fail(FlowError::NotFound)
            }
            Some(gift) if gift.is_claimed() => {
                info!(gift_id = %gift.id, "Gift already claimed");
                self.step = ClaimStep::Claim {
                    code,
                    gift,
                    phase: ClaimPhase::Claimed { tx_hash: None },
                };
                Ok(())
            }
            Some(gift) => {
                debug!(gift_id = %gift.id, %code, "Gift resolved");
                self.step = ClaimStep::Verify {
                    code,
                    lookup: GiftLookup::Found(gift),
                };
                Ok(())
            }
        }
    }

    /// Check the PIN by dry-running `claimGift` from the connected wallet.
    pub async fn verify_pin(&mut self, pin: &str) -> Result<()> {
        let (code, gift) = match &self.step {
            ClaimStep::Verify {
                code,
                lookup: GiftLookup::Found(gift),
            } => (code.clone(), gift.clone()),
            ClaimStep::Verify {
                lookup: GiftLookup::NotFound,
                ..
            } => return self.fail(FlowError::NotFound),
            _ => return self.wrong_step("verify a PIN"),
        };

        if pin.is_empty() {
            return self.fail(FlowError::EmptyPin);
        }
        if self.client.account().is_none() {
            return self.fail(FlowError::WalletNotConnected);
        }

        let pin_hash = hash_pin(pin);
        let call = ClaimGift {
            id: gift.id,
            pin_hash,
        };
        if let Err(err) = self.client.simulate(&call, U256::zero()).await {
            let err = dry_run_error(err);
            if err == FlowError::AlreadyClaimed {
                // Claimed by someone else since the lookup.
                self.settle_claimed(code, gift).await;
            }
            return self.fail(err);
        }

        info!(gift_id = %gift.id, "PIN verified");
        self.error = None;
        self.step = ClaimStep::Claim {
            code,
            gift,
            phase: ClaimPhase::Ready { pin_hash },
        };
        Ok(())
    }

    /// Re-read a gift found claimed and move to the terminal step.
    async fn settle_claimed(&mut self, code: GiftCode, gift: GiftRecord) {
        let gift = match self.client.read(&GetGift { id: gift.id }).await {
            Ok(Some(refreshed)) => refreshed,
            Ok(None) => gift,
            Err(err) => {
                warn!(gift_id = %gift.id, "Could not re-read claimed gift: {}", err);
                gift
            }
        };
        self.step = ClaimStep::Claim {
            code,
            gift,
            phase: ClaimPhase::Claimed { tx_hash: None },
        };
    }

    /// Submit the claim transaction.
    pub async fn submit_claim(&mut self) -> Result<TxHash> {
        let (id, pin_hash) = match &self.step {
            ClaimStep::Claim {
                gift,
                phase: ClaimPhase::Ready { pin_hash },
                ..
            } => (gift.id, *pin_hash),
            _ => return self.wrong_step("submit a claim"),
        };

        let tx_hash = match self.client.submit(&ClaimGift { id, pin_hash }, U256::zero()).await {
            Ok(tx_hash) => tx_hash,
            Err(err) => return self.fail(err.into()),
        };

        self.error = None;
        if let ClaimStep::Claim { phase, .. } = &mut self.step {
            *phase = ClaimPhase::Confirming { pin_hash, tx_hash };
        }
        Ok(tx_hash)
    }

    /// Wait for the claim transaction and re-read the gift.
    ///
    /// A reverted transaction goes back to `Ready` so the user can retry.
    pub async fn confirm_claim(&mut self) -> Result<()> {
        let (id, pin_hash, tx_hash) = match &self.step {
            ClaimStep::Claim {
                gift,
                phase: ClaimPhase::Confirming { pin_hash, tx_hash },
                ..
            } => (gift.id, *pin_hash, *tx_hash),
            _ => return self.wrong_step("confirm a claim"),
        };

        if let Err(err) = self.client.confirm(tx_hash).await {
            if let ClaimStep::Claim { phase, .. } = &mut self.step {
                *phase = ClaimPhase::Ready { pin_hash };
            }
            return self.fail(err.into());
        }

        let refreshed = match self.client.read(&GetGift { id }).await {
            Ok(gift) => gift,
            Err(err) => {
                warn!(gift_id = %id, "Could not re-read claimed gift: {}", err);
                None
            }
        };

        info!(gift_id = %id, ?tx_hash, "Gift claimed");
        self.error = None;
        if let ClaimStep::Claim { gift, phase, .. } = &mut self.step {
            if let Some(refreshed) = refreshed {
                *gift = refreshed;
            }
            *phase = ClaimPhase::Claimed {
                tx_hash: Some(tx_hash),
            };
        }
        Ok(())
    }

    /// Submit and confirm in one go.
    pub async fn claim(&mut self) -> Result<TxHash> {
        let tx_hash = self.submit_claim().await?;
        self.confirm_claim().await?;
        Ok(tx_hash)
    }
}

/// Map a failed `claimGift` dry-run to what the user should see.
fn dry_run_error(err: ContractError) -> FlowError {
    match err {
        ContractError::Reverted(reason) => {
            let lower = reason.to_ascii_lowercase();
            if lower.contains("already claimed") {
                FlowError::AlreadyClaimed
            } else if lower.contains("does not exist") {
                FlowError::NotFound
            } else if lower.contains("paused") {
                FlowError::Contract(ContractError::Reverted(reason))
            } else {
                FlowError::InvalidPin
            }
        }
        other => other.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dry_run_error_mapping() {
        assert_eq!(
            dry_run_error(ContractError::Reverted("Invalid PIN".into())),
            FlowError::InvalidPin
        );
        assert_eq!(
            dry_run_error(ContractError::Reverted("execution reverted".into())),
            FlowError::InvalidPin
        );
        assert_eq!(
            dry_run_error(ContractError::Reverted("Gift already claimed".into())),
            FlowError::AlreadyClaimed
        );
        assert_eq!(
            dry_run_error(ContractError::NotConnected),
            FlowError::WalletNotConnected
        );
        assert!(matches!(
            dry_run_error(ContractError::Transport("timeout".into())),
            FlowError::Contract(_)
        ));
    }

    #[test]
    fn test_step_descriptions() {
        assert_eq!(ClaimStep::Input.describe(), "awaiting a code");
    }
}
