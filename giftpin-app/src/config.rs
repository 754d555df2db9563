//! Client configuration.

use anyhow::{Context, Result};
use giftpin_contract::{EvmTransport, GiftContractClient};
use giftpin_core::{parse_address, Address};
use std::env;
use std::path::PathBuf;

use crate::registry::CodeScheme;

/// Base mainnet.
pub const DEFAULT_CHAIN_ID: u64 = 8453;
pub const DEFAULT_SHARE_BASE_URL: &str = "https://giftpin.app";
pub const DEFAULT_REGISTRY_PATH: &str = "giftpin-codes.json";
pub const DEFAULT_CONFIRMATIONS: usize = 1;

/// Client configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: String,
    /// Gift contract address.
    pub contract_address: Address,
    /// Wallet key; without one the client is read-only.
    pub private_key: Option<String>,
    pub chain_id: u64,
    /// Base URL share links are built under.
    pub share_base_url: String,
    /// How gift codes are minted and resolved.
    pub code_scheme: CodeScheme,
    /// Code registry file (random scheme).
    pub registry_path: PathBuf,
    /// Confirmations to wait for after submitting a transaction.
    pub confirmations: usize,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("rpc_url", &self.rpc_url)
            .field("contract_address", &self.contract_address)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("chain_id", &self.chain_id)
            .field("share_base_url", &self.share_base_url)
            .field("code_scheme", &self.code_scheme)
            .field("registry_path", &self.registry_path)
            .field("confirmations", &self.confirmations)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rpc_url = lookup("GIFTPIN_RPC_URL").context("GIFTPIN_RPC_URL must be set")?;

        let contract_address = lookup("GIFTPIN_CONTRACT_ADDRESS")
            .context("GIFTPIN_CONTRACT_ADDRESS must be set")?;
        let contract_address = parse_address(contract_address.trim())
            .context("GIFTPIN_CONTRACT_ADDRESS is not a valid address")?;

        let private_key = lookup("GIFTPIN_PRIVATE_KEY").filter(|k| !k.trim().is_empty());

        let chain_id = match lookup("GIFTPIN_CHAIN_ID") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid GIFTPIN_CHAIN_ID: {}", value))?,
            None => DEFAULT_CHAIN_ID,
        };

        let share_base_url = lookup("GIFTPIN_SHARE_BASE_URL")
            .unwrap_or_else(|| DEFAULT_SHARE_BASE_URL.to_string());

        let code_scheme = match lookup("GIFTPIN_CODE_SCHEME") {
            Some(value) => value.parse()?,
            None => CodeScheme::default(),
        };

        let registry_path = lookup("GIFTPIN_REGISTRY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH));

        let confirmations = match lookup("GIFTPIN_CONFIRMATIONS") {
            Some(value) => value
                .trim()
                .parse()
                .with_context(|| format!("Invalid GIFTPIN_CONFIRMATIONS: {}", value))?,
            None => DEFAULT_CONFIRMATIONS,
        };

        Ok(Self {
            rpc_url,
            contract_address,
            private_key,
            chain_id,
            share_base_url,
            code_scheme,
            registry_path,
            confirmations,
        })
    }

    /// Build a contract client over the configured RPC endpoint and wallet.
    pub fn connect(&self) -> Result<GiftContractClient<EvmTransport>> {
        let transport = EvmTransport::new(
            &self.rpc_url,
            self.chain_id,
            self.private_key.as_deref(),
            self.confirmations,
        )
        .context("Failed to create EVM transport")?;
        Ok(GiftContractClient::new(transport, self.contract_address))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const CONTRACT: &str = "0x1111111111111111111111111111111111111111";

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GIFTPIN_RPC_URL", "http://localhost:8545"),
            ("GIFTPIN_CONTRACT_ADDRESS", CONTRACT),
        ]))
        .unwrap();

        assert_eq!(config.chain_id, DEFAULT_CHAIN_ID);
        assert_eq!(config.share_base_url, DEFAULT_SHARE_BASE_URL);
        assert_eq!(config.code_scheme, CodeScheme::Random);
        assert_eq!(config.registry_path, PathBuf::from(DEFAULT_REGISTRY_PATH));
        assert_eq!(config.confirmations, 1);
        assert!(config.private_key.is_none());
        assert_eq!(config.contract_address, Address::repeat_byte(0x11));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GIFTPIN_RPC_URL", "http://localhost:8545"),
            ("GIFTPIN_CONTRACT_ADDRESS", CONTRACT),
            ("GIFTPIN_CHAIN_ID", "84532"),
            ("GIFTPIN_CODE_SCHEME", "deterministic"),
            ("GIFTPIN_CONFIRMATIONS", "3"),
            ("GIFTPIN_PRIVATE_KEY", "0xabc"),
        ]))
        .unwrap();

        assert_eq!(config.chain_id, 84532);
        assert_eq!(config.code_scheme, CodeScheme::Deterministic);
        assert_eq!(config.confirmations, 3);
        assert_eq!(config.private_key.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_required_and_invalid() {
        assert!(AppConfig::from_lookup(lookup(&[("GIFTPIN_CONTRACT_ADDRESS", CONTRACT)])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("GIFTPIN_RPC_URL", "http://x")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[
            ("GIFTPIN_RPC_URL", "http://x"),
            ("GIFTPIN_CONTRACT_ADDRESS", CONTRACT),
            ("GIFTPIN_CODE_SCHEME", "sequential"),
        ]))
        .is_err());
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GIFTPIN_RPC_URL", "http://localhost:8545"),
            ("GIFTPIN_CONTRACT_ADDRESS", CONTRACT),
            ("GIFTPIN_PRIVATE_KEY", "supersecret"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("supersecret"));
        assert!(rendered.contains("<redacted>"));
    }
}
