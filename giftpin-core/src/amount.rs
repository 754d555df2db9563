//! Native-currency amount parsing and formatting
//!
//! Amounts are entered as decimal ether strings (`"0.1"`) and carried as wei.
//! The unit conversion is ethers' own; input is checked here first so that
//! signs, exponents and excess precision are rejected rather than coerced.

use ethers_core::types::U256;
use ethers_core::utils::{format_units, parse_units};

use crate::{Error, Result, ETHER_DECIMALS};

/// Parse a decimal ether amount into wei
pub fn parse_ether_amount(amount_str: &str) -> Result<U256> {
    let amount_str = amount_str.trim();

    if amount_str.is_empty() {
        return Err(Error::InvalidAmount("Empty amount".to_string()));
    }

    let (whole_part, frac_part) = match amount_str.split_once('.') {
        Some((_, frac)) if frac.contains('.') => {
            return Err(Error::InvalidAmount(format!("Multiple decimal points: {}", amount_str)))
        }
        Some((whole, frac)) => (whole, frac),
        None => (amount_str, ""),
    };

    if whole_part.is_empty() && frac_part.is_empty() {
        return Err(Error::InvalidAmount(format!("No digits: {}", amount_str)));
    }
    if !whole_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!("Invalid whole part: {}", whole_part)));
    }
    if !frac_part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAmount(format!("Invalid fractional part: {}", frac_part)));
    }
    if frac_part.len() > ETHER_DECIMALS {
        return Err(Error::TooManyDecimalPlaces(amount_str.to_string()));
    }

    // ".5" and "5." in the canonical form ethers expects
    let whole = if whole_part.is_empty() { "0" } else { whole_part };
    let normalized = if frac_part.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, frac_part)
    };

    parse_units(normalized, "ether")
        .map(U256::from)
        .map_err(|e| Error::InvalidAmount(format!("{}: {}", amount_str, e)))
}

/// Format wei as a decimal ether string without trailing zeros
pub fn format_ether_amount(wei: U256) -> String {
    // 18 decimals is always within the formatter's range.
    let formatted = format_units(wei, "ether").unwrap_or_else(|_| wei.to_string());
    match formatted.split_once('.') {
        Some((whole, frac)) => {
            let frac = frac.trim_end_matches('0');
            if frac.is_empty() {
                whole.to_string()
            } else {
                format!("{}.{}", whole, frac)
            }
        }
        None => formatted,
    }
}
