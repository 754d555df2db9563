//! giftpin-app
//!
//! Client-side flows for PIN-protected gifts held by the escrow contract:
//!
//! - [`CreateFlow`]: validate a draft, fund the gift, mint its share code.
//! - [`ClaimFlow`]: resolve a code, verify the PIN by dry-run, redeem.
//! - [`AdminDashboard`]: pause, withdraw, change admin, inspect gifts.
//!
//! All flows run over a [`GiftContractClient`](giftpin_contract::GiftContractClient)
//! and take their configuration explicitly from an [`AppConfig`].

pub mod admin;
pub mod claim;
pub mod config;
pub mod create;
pub mod details;
pub mod error;
pub mod registry;
pub mod session;

pub use admin::{AdminDashboard, AdminOverview};
pub use claim::{ClaimFlow, ClaimPhase, ClaimStep, GiftLookup};
pub use config::AppConfig;
pub use create::{CreateFlow, CreateStep, CreatedGift, GiftDraft, ValidDraft};
pub use details::{cancel_gift, GiftDetails, UserActivity};
pub use error::{FlowError, Result};
pub use registry::{CodeRegistry, CodeScheme, GiftCodeBook};
pub use session::{WalletSession, SIGN_IN_MESSAGE};
