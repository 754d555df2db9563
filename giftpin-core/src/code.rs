//! Gift-code codec
//!
//! A gift code is a six-character token drawn from `[0-9a-z]`. Input is
//! accepted case-insensitively and normalised to lowercase.
//!
//! The deterministic scheme maps a gift id to its base-36 rendering. Ids whose
//! rendering is longer than six digits keep only the trailing six, so two
//! such ids can share a code.

use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Error, GiftId, Result, CODE_LENGTH, CODE_RADIX};

/// Letters and digits drawn into every random code
const RANDOM_LETTERS: usize = 3;
const RANDOM_DIGITS: usize = 3;

/// A validated, lowercase, six-character gift code
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GiftCode(String);

impl GiftCode {
    /// Get the code as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the code satisfies the random-scheme predicate
    pub fn has_letter_and_digit(&self) -> bool {
        is_valid_random_code(&self.0)
    }
}

impl FromStr for GiftCode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if !is_valid_gift_id_code(s) {
            return Err(Error::InvalidCode(s.trim().to_string()));
        }
        Ok(Self(s.trim().to_ascii_lowercase()))
    }
}

impl TryFrom<String> for GiftCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<GiftCode> for String {
    fn from(code: GiftCode) -> Self {
        code.0
    }
}

impl AsRef<str> for GiftCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GiftCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Encode a gift id as a six-character base-36 code.
///
/// Short renderings are left-padded with `0`; long ones keep the trailing
/// six digits.
pub fn encode_gift_id(id: GiftId) -> GiftCode {
    let mut digits = Vec::with_capacity(13);
    let mut n = id.0;
    loop {
        let digit = (n % CODE_RADIX as u64) as u32;
        // digit < 36 always maps to a character
        digits.push(char::from_digit(digit, CODE_RADIX).unwrap_or('0'));
        n /= CODE_RADIX as u64;
        if n == 0 {
            break;
        }
    }
    digits.truncate(CODE_LENGTH);
    digits.resize(CODE_LENGTH, '0');
    digits.reverse();

    GiftCode(digits.into_iter().collect())
}

/// Decode a six-character base-36 code back into a gift id.
///
/// Returns `None` for anything that is not exactly six characters from
/// `[0-9a-zA-Z]` after trimming.
pub fn decode_gift_id(encoded: &str) -> Option<GiftId> {
    let cleaned = encoded.trim().to_ascii_lowercase();
    if !is_valid_gift_id_code(&cleaned) {
        return None;
    }
    u64::from_str_radix(&cleaned, CODE_RADIX).ok().map(GiftId)
}

/// Whether `code` has the gift-code shape (case-insensitive)
pub fn is_valid_gift_id_code(code: &str) -> bool {
    let code = code.trim();
    code.len() == CODE_LENGTH && code.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Whether `code` is a valid random-scheme code: the gift-code shape plus at
/// least one letter and at least one digit.
pub fn is_valid_random_code(code: &str) -> bool {
    let code = code.trim();
    is_valid_gift_id_code(code)
        && code.bytes().any(|b| b.is_ascii_alphabetic())
        && code.bytes().any(|b| b.is_ascii_digit())
}

/// Generate a random gift code.
///
/// Three letters and three digits are drawn independently and the six
/// characters are shuffled with a uniform permutation.
pub fn generate_random_code<R: Rng + ?Sized>(rng: &mut R) -> GiftCode {
    let mut chars = Vec::with_capacity(CODE_LENGTH);
    for _ in 0..RANDOM_LETTERS {
        chars.push(rng.gen_range(b'a'..=b'z'));
    }
    for _ in 0..RANDOM_DIGITS {
        chars.push(rng.gen_range(b'0'..=b'9'));
    }
    chars.shuffle(rng);

    GiftCode(chars.into_iter().map(char::from).collect())
}
