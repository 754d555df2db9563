//! Gift-code registry and code-scheme selection.
//!
//! Under the random scheme the binding between a code and a gift id exists
//! only in a client-local JSON file. Two clients can mint different codes for
//! the same gift, and a client without the file cannot resolve a code minted
//! elsewhere. The deterministic scheme needs no registry at all. The two are
//! never mixed: a book resolves codes with its configured scheme only.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use giftpin_core::{
    decode_gift_id, encode_gift_id, generate_random_code, is_valid_random_code, GiftCode, GiftId,
    ShareLink,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{FlowError, Result};

/// Attempts at drawing an unused random code before giving up.
const MAX_MINT_ATTEMPTS: usize = 1_000;

/// How gift codes are minted and resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodeScheme {
    /// Random letter/digit codes bound through the local registry.
    #[default]
    Random,
    /// Base-36 rendering of the gift id.
    Deterministic,
}

impl FromStr for CodeScheme {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" => Ok(Self::Random),
            "deterministic" => Ok(Self::Deterministic),
            other => Err(FlowError::UnknownScheme(other.to_string())),
        }
    }
}

impl fmt::Display for CodeScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => f.write_str("random"),
            Self::Deterministic => f.write_str("deterministic"),
        }
    }
}

/// Client-local `code -> gift id` map, optionally backed by a JSON file.
#[derive(Debug, Clone, Default)]
pub struct CodeRegistry {
    path: Option<PathBuf>,
    codes: BTreeMap<GiftCode, GiftId>,
}

impl CodeRegistry {
    /// A registry that is never written to disk.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open the registry at `path`; a missing file is an empty registry.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let codes = if path.exists() {
            let raw = fs::read_to_string(&path)?;
            if raw.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&raw)?
            }
        } else {
            BTreeMap::new()
        };
        debug!(path = %path.display(), entries = codes.len(), "Opened code registry");
        Ok(Self {
            path: Some(path),
            codes,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    pub fn contains(&self, code: &GiftCode) -> bool {
        self.codes.contains_key(code)
    }

    pub fn lookup(&self, code: &GiftCode) -> Option<GiftId> {
        self.codes.get(code).copied()
    }

    /// Any code already bound to `id`.
    pub fn code_for(&self, id: GiftId) -> Option<GiftCode> {
        self.codes
            .iter()
            .find(|(_, bound)| **bound == id)
            .map(|(code, _)| code.clone())
    }

    /// Bind `code` to `id` and persist. Rebinding a code to another id fails.
    ///
    /// The binding is only visible once it is on disk; a failed write leaves
    /// the registry unchanged.
    pub fn insert(&mut self, code: GiftCode, id: GiftId) -> Result<()> {
        match self.codes.get(&code) {
            Some(existing) if *existing == id => return Ok(()),
            Some(existing) => {
                return Err(FlowError::Registry(format!(
                    "code {} is already bound to gift {}",
                    code, existing
                )))
            }
            None => {}
        }
        let mut codes = self.codes.clone();
        codes.insert(code, id);
        self.save(&codes)?;
        self.codes = codes;
        Ok(())
    }

    fn save(&self, codes: &BTreeMap<GiftCode, GiftId>) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(codes)?;
        fs::write(path, json)?;
        Ok(())
    }
}

/// A code scheme together with the registry it resolves through.
#[derive(Debug, Clone)]
pub struct GiftCodeBook {
    scheme: CodeScheme,
    registry: CodeRegistry,
}

impl GiftCodeBook {
    pub fn new(scheme: CodeScheme, registry: CodeRegistry) -> Self {
        Self { scheme, registry }
    }

    /// Deterministic codes, no registry.
    pub fn deterministic() -> Self {
        Self::new(CodeScheme::Deterministic, CodeRegistry::in_memory())
    }

    pub fn scheme(&self) -> CodeScheme {
        self.scheme
    }

    pub fn registry(&self) -> &CodeRegistry {
        &self.registry
    }

    /// Parse user input (bare code or claim link) into a code valid under
    /// this book's scheme.
    pub fn parse_code(&self, input: &str) -> Result<GiftCode> {
        let input = input.trim();
        if input.is_empty() {
            return Err(FlowError::EmptyCode);
        }
        let code = ShareLink::parse(input).ok_or_else(|| FlowError::InvalidCode(input.to_string()))?;
        if self.scheme == CodeScheme::Random && !is_valid_random_code(code.as_str()) {
            return Err(FlowError::InvalidCode(input.to_string()));
        }
        Ok(code)
    }

    /// Gift id a code stands for, if known.
    pub fn resolve(&self, code: &GiftCode) -> Option<GiftId> {
        match self.scheme {
            CodeScheme::Deterministic => decode_gift_id(code.as_str()),
            CodeScheme::Random => self.registry.lookup(code),
        }
    }

    /// Code to share for `id`, if one exists.
    pub fn code_for(&self, id: GiftId) -> Option<GiftCode> {
        match self.scheme {
            CodeScheme::Deterministic => Some(encode_gift_id(id)),
            CodeScheme::Random => self.registry.code_for(id),
        }
    }

    /// Produce the code for a newly created gift.
    ///
    /// Random codes are redrawn on collision and persisted before returning.
    /// A gift that already has a code keeps it.
    pub fn mint<R: Rng + ?Sized>(&mut self, id: GiftId, rng: &mut R) -> Result<GiftCode> {
        if self.scheme == CodeScheme::Deterministic {
            return Ok(encode_gift_id(id));
        }
        if let Some(existing) = self.registry.code_for(id) {
            return Ok(existing);
        }

        for _ in 0..MAX_MINT_ATTEMPTS {
            let code = generate_random_code(rng);
            if self.registry.contains(&code) {
                debug!(%code, "Code collision, redrawing");
                continue;
            }
            self.registry.insert(code.clone(), id)?;
            info!(%code, gift_id = %id, "Minted gift code");
            return Ok(code);
        }
        Err(FlowError::Registry(format!(
            "no unused code after {} attempts",
            MAX_MINT_ATTEMPTS
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn code(s: &str) -> GiftCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_scheme_parse() {
        assert_eq!("random".parse::<CodeScheme>().unwrap(), CodeScheme::Random);
        assert_eq!(
            " Deterministic ".parse::<CodeScheme>().unwrap(),
            CodeScheme::Deterministic
        );
        assert!("base36".parse::<CodeScheme>().is_err());
        assert_eq!(CodeScheme::Random.to_string(), "random");
    }

    #[test]
    fn test_insert_rejects_rebinding() {
        let mut registry = CodeRegistry::in_memory();
        registry.insert(code("k3x9a2"), GiftId(1)).unwrap();
        registry.insert(code("k3x9a2"), GiftId(1)).unwrap();
        assert!(registry.insert(code("k3x9a2"), GiftId(2)).is_err());
        assert_eq!(registry.lookup(&code("k3x9a2")), Some(GiftId(1)));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deterministic_book() {
        let mut book = GiftCodeBook::deterministic();
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(book.mint(GiftId(100), &mut rng).unwrap().as_str(), "00002s");
        assert_eq!(book.resolve(&code("00002s")), Some(GiftId(100)));
        assert!(book.registry().is_empty());
    }

    #[test]
    fn test_random_book_mints_and_resolves() {
        let mut book = GiftCodeBook::new(CodeScheme::Random, CodeRegistry::in_memory());
        let mut rng = StdRng::seed_from_u64(1);
        let minted = book.mint(GiftId(7), &mut rng).unwrap();
        assert!(is_valid_random_code(minted.as_str()));
        assert_eq!(book.resolve(&minted), Some(GiftId(7)));
        assert_eq!(book.mint(GiftId(7), &mut rng).unwrap(), minted);
    }

    #[test]
    fn test_schemes_do_not_fall_back() {
        let random = GiftCodeBook::new(CodeScheme::Random, CodeRegistry::in_memory());
        // "a0002s" is a valid random code but unknown to the registry.
        assert_eq!(random.resolve(&code("a0002s")), None);

        let mut registry = CodeRegistry::in_memory();
        registry.insert(code("k3x9a2"), GiftId(5)).unwrap();
        let deterministic = GiftCodeBook::new(CodeScheme::Deterministic, registry);
        assert_ne!(deterministic.resolve(&code("k3x9a2")), Some(GiftId(5)));
    }

    #[test]
    fn test_parse_code_per_scheme() {
        let random = GiftCodeBook::new(CodeScheme::Random, CodeRegistry::in_memory());
        assert_eq!(random.parse_code("  ").unwrap_err(), FlowError::EmptyCode);
        assert!(matches!(
            random.parse_code("123456").unwrap_err(),
            FlowError::InvalidCode(_)
        ));
        assert_eq!(
            random
                .parse_code("https://giftpin.app/claim/K3X9A2")
                .unwrap()
                .as_str(),
            "k3x9a2"
        );

        let deterministic = GiftCodeBook::deterministic();
        assert_eq!(deterministic.parse_code("00002S").unwrap().as_str(), "00002s");
        assert!(deterministic.parse_code("0002s").is_err());
    }

    #[test]
    fn test_registry_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("codes.json");

        let mut registry = CodeRegistry::open(&path).unwrap();
        assert!(registry.is_empty());
        registry.insert(code("k3x9a2"), GiftId(3)).unwrap();

        let reopened = CodeRegistry::open(&path).unwrap();
        assert_eq!(reopened.lookup(&code("k3x9a2")), Some(GiftId(3)));
        assert_eq!(reopened.code_for(GiftId(3)), Some(code("k3x9a2")));
    }

    #[test]
    fn test_failed_write_binds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.json");
        let mut book = GiftCodeBook::new(CodeScheme::Random, CodeRegistry::open(&path).unwrap());

        // A directory where the file should be makes the write fail.
        fs::create_dir(&path).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        assert!(matches!(
            book.mint(GiftId(9), &mut rng).unwrap_err(),
            FlowError::Registry(_)
        ));
        assert!(book.registry().is_empty());
        assert_eq!(book.code_for(GiftId(9)), None);

        // The retry mints afresh and the code is on disk.
        fs::remove_dir(&path).unwrap();
        let minted = book.mint(GiftId(9), &mut rng).unwrap();
        let reopened = CodeRegistry::open(&path).unwrap();
        assert_eq!(reopened.lookup(&minted), Some(GiftId(9)));
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_corrupt_registry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.json");
        fs::write(&path, "{\"bad\": 1}").unwrap();
        assert!(matches!(
            CodeRegistry::open(&path).unwrap_err(),
            FlowError::Registry(_)
        ));
    }
}
