//! PIN hashing
//!
//! The contract never sees a PIN, only `keccak256(utf8(pin))`.

use ethers_core::types::H256;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

/// Keccak-256 hash of a gift PIN
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PinHash(pub H256);

impl PinHash {
    /// Raw hash bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.0.as_fixed_bytes()
    }

    /// Build from raw bytes, e.g. a decoded `bytes32`
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(H256::from(bytes))
    }
}

impl std::fmt::Display for PinHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.as_bytes()))
    }
}

// Keep the hash out of casual debug output.
impl std::fmt::Debug for PinHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let encoded = hex::encode(self.as_bytes());
        write!(f, "PinHash(0x{}...)", &encoded[..8])
    }
}

/// Hash a PIN for submission or comparison
pub fn hash_pin(pin: &str) -> PinHash {
    let digest = Keccak256::digest(pin.as_bytes());
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&digest);
    PinHash::from_bytes(bytes)
}
