//! Wallet session and sign-in.

use ethers::signers::Signer;
use ethers::types::Signature;
use giftpin_core::Address;
use tracing::{info, warn};

use crate::error::{FlowError, Result};

/// Consent message signed before gifts can be created.
pub const SIGN_IN_MESSAGE: &str = "I agree to create a Christmas gift";

/// The connected wallet, if any, and whether it has signed in.
#[derive(Debug, Clone, Default)]
pub struct WalletSession {
    address: Option<Address>,
    signature: Option<Signature>,
}

impl WalletSession {
    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn connected(address: Address) -> Self {
        Self {
            address: Some(address),
            signature: None,
        }
    }

    /// Session for whatever account a transport reports.
    pub fn for_account(account: Option<Address>) -> Self {
        Self {
            address: account,
            signature: None,
        }
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn is_signed_in(&self) -> bool {
        self.signature.is_some()
    }

    /// Signature over [`SIGN_IN_MESSAGE`], once signed in.
    pub fn signature(&self) -> Option<&Signature> {
        self.signature.as_ref()
    }

    pub fn require_connected(&self) -> Result<Address> {
        self.address.ok_or(FlowError::WalletNotConnected)
    }

    pub fn require_signed_in(&self) -> Result<Address> {
        let address = self.require_connected()?;
        if !self.is_signed_in() {
            return Err(FlowError::NotSignedIn);
        }
        Ok(address)
    }

    /// Sign the consent message with the connected wallet.
    ///
    /// The signature is checked against the session address before the
    /// session counts as signed in.
    pub async fn sign_in<S: Signer>(&mut self, signer: &S) -> Result<()> {
        let address = self.require_connected()?;
        if signer.address() != address {
            return Err(FlowError::SignIn(format!(
                "signer {:?} is not the connected account {:?}",
                signer.address(),
                address
            )));
        }

        let signature = signer.sign_message(SIGN_IN_MESSAGE).await.map_err(|e| {
            warn!("Sign-in rejected: {}", e);
            FlowError::SignIn(e.to_string())
        })?;
        signature
            .verify(SIGN_IN_MESSAGE, address)
            .map_err(|e| FlowError::SignIn(e.to_string()))?;

        info!(?address, "Signed in");
        self.signature = Some(signature);
        Ok(())
    }

    pub fn sign_out(&mut self) {
        self.signature = None;
    }

    pub fn disconnect(&mut self) {
        self.address = None;
        self.signature = None;
    }
}
