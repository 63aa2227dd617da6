//! User-entered amounts.
//!
//! ADA amounts are parsed as exact decimals (at most six fractional
//! digits) so "1.1" is 1_100_000 lovelace, never 1_099_999.

use crate::cardano::types::LOVELACE_PER_ADA;
use crate::workflows::types::{WorkflowError, WorkflowResult};

const ADA_DECIMALS: usize = 6;

/// Convert an ADA amount string to lovelace. Rejects empty, signed,
/// non-numeric, zero and over-precise input.
pub fn ada_to_lovelace(input: &str) -> WorkflowResult<u64> {
    let value = input.trim();
    let invalid = || WorkflowError::InvalidInput(format!("'{}' is not a valid ADA amount", input));

    if value.is_empty() {
        return Err(invalid());
    }

    let (whole, fraction) = match value.split_once('.') {
        Some((w, f)) => (w, f),
        None => (value, ""),
    };
    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid());
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(invalid());
    }
    if fraction.len() > ADA_DECIMALS {
        return Err(WorkflowError::InvalidInput(format!(
            "'{}' has more than {} decimal places",
            input, ADA_DECIMALS
        )));
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let fraction: u64 = format!("{:0<width$}", fraction, width = ADA_DECIMALS)
        .parse()
        .map_err(|_| invalid())?;

    let lovelace = whole
        .checked_mul(LOVELACE_PER_ADA)
        .and_then(|l| l.checked_add(fraction))
        .ok_or_else(invalid)?;

    if lovelace == 0 {
        return Err(WorkflowError::InvalidInput(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(lovelace)
}

/// Parse a strictly positive integer (token quantity, lock-up minutes).
pub fn positive_integer(field: &str, input: &str) -> WorkflowResult<u64> {
    match input.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(WorkflowError::InvalidInput(format!(
            "{} must be a positive integer, got '{}'",
            field, input
        ))),
    }
}
