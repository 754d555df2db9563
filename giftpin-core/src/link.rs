//! Share links
//!
//! ## Link Format
//!
//! ```text
//! https://giftpin.app/claim/k3x9a2
//! ```
//!
//! The last path segment after `claim` carries the gift code. The PIN is never
//! part of the link.

use std::str::FromStr;
use url::Url;

use crate::{Error, GiftCode, Result, CLAIM_PATH};

/// A shareable claim link for a gift code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    base: Url,
    code: GiftCode,
}

impl ShareLink {
    /// Build a link under `base_url` (scheme and host, optionally a path prefix)
    pub fn new(base_url: &str, code: GiftCode) -> Result<Self> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(Error::InvalidLink(format!("Not a base URL: {}", base_url)));
        }
        Ok(Self { base, code })
    }

    /// The gift code carried by this link
    pub fn code(&self) -> &GiftCode {
        &self.code
    }

    /// Render the full claim URL
    pub fn to_url(&self) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(CLAIM_PATH).push(self.code.as_str());
        }
        url
    }

    /// Extract a gift code from either a bare code or a full claim link.
    ///
    /// Returns `None` when neither form is recognised.
    pub fn parse(input: &str) -> Option<GiftCode> {
        let input = input.trim();
        if let Ok(code) = GiftCode::from_str(input) {
            return Some(code);
        }

        let url = Url::parse(input).ok()?;
        let segments: Vec<&str> = url.path_segments()?.filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            [.., claim, code] if *claim == CLAIM_PATH => GiftCode::from_str(code).ok(),
            _ => None,
        }
    }
}

impl std::fmt::Display for ShareLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_url())
    }
}

/// Shorten an address for display, e.g. `0x1234...5678`
pub fn truncate_address(address: &str, start_len: usize, end_len: usize) -> String {
    let chars: Vec<char> = address.chars().collect();
    if chars.len() <= start_len + end_len {
        return address.to_string();
    }
    let head: String = chars[..start_len].iter().collect();
    let tail: String = chars[chars.len() - end_len..].iter().collect();
    format!("{}...{}", head, tail)
}
