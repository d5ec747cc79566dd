//! Exact decimal parsing, unit conversion and floor rounding

use std::cmp::Ordering;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::{AmountError, MAX_DECIMALS};

/// Parse a typed amount as an exact non-negative decimal
///
/// Accepts `12`, `12.`, `.5` and `12.50` (surrounding whitespace ignored).
/// Signs, exponents and any other character are rejected. The value is
/// never rounded: digits that cannot be held exactly are an error.
pub fn parse_amount(input: &str) -> Result<Decimal, AmountError> {
    let (whole, frac) = significant_digits(input)?;
    if frac.len() > MAX_DECIMALS as usize {
        return Err(AmountError::PrecisionExceeded);
    }

    let mut mantissa: i128 = 0;
    for b in whole.bytes().chain(frac.bytes()) {
        mantissa = mantissa
            .checked_mul(10)
            .and_then(|m| m.checked_add(i128::from(b - b'0')))
            .ok_or(AmountError::Overflow)?;
    }

    Decimal::try_from_i128_with_scale(mantissa, frac.len() as u32)
        .map_err(|_| AmountError::Overflow)
}

/// Whole digits without leading zeros and fraction without trailing zeros
fn significant_digits(input: &str) -> Result<(&str, &str), AmountError> {
    let s = input.trim();
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(AmountError::Malformed);
    }
    let is_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
    if !is_digits(whole) || !is_digits(frac) {
        return Err(AmountError::Malformed);
    }
    Ok((whole.trim_start_matches('0'), frac.trim_end_matches('0')))
}

/// Compare a typed amount with a decimal, digit by digit
///
/// Unlike [`parse_amount`] this has no range or precision limit, so an
/// amount too large for a `Decimal` still compares as greater.
pub fn compare_amount(input: &str, value: Decimal) -> Result<Ordering, AmountError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Ok(Ordering::Greater);
    }
    let (whole, frac) = significant_digits(input)?;
    let text = value.abs().normalize().to_string();
    let (value_whole, value_frac) = significant_digits(&text)?;

    // Fractions without trailing zeros order lexicographically
    Ok(whole
        .len()
        .cmp(&value_whole.len())
        .then_with(|| whole.cmp(value_whole))
        .then_with(|| frac.cmp(value_frac)))
}

/// Validation parse: anything unparsable counts as zero
pub fn parse_or_zero(input: &str) -> Decimal {
    parse_amount(input).unwrap_or(Decimal::ZERO)
}

/// Exact decimal value of a smallest-unit integer
pub fn from_units(units: u128, decimals: u32) -> Result<Decimal, AmountError> {
    if decimals > MAX_DECIMALS {
        return Err(AmountError::ScaleTooLarge);
    }
    let mantissa = i128::try_from(units).map_err(|_| AmountError::Overflow)?;
    Decimal::try_from_i128_with_scale(mantissa, decimals).map_err(|_| AmountError::Overflow)
}

/// Convert a decimal to smallest units
///
/// Fails with `PrecisionExceeded` when non-zero digits fall below the
/// unit, instead of silently dropping them.
pub fn to_units(amount: Decimal, decimals: u32) -> Result<u128, AmountError> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(AmountError::Negative);
    }

    let normalized = amount.normalize();
    let scale = normalized.scale();
    if scale > decimals {
        return Err(AmountError::PrecisionExceeded);
    }

    let mantissa = u128::try_from(normalized.mantissa().abs()).map_err(|_| AmountError::Overflow)?;
    let factor = 10u128
        .checked_pow(decimals - scale)
        .ok_or(AmountError::Overflow)?;
    mantissa.checked_mul(factor).ok_or(AmountError::Overflow)
}

/// Floor to `places` decimals (truncate toward zero, never round up)
///
/// The result carries exactly `places` digits of scale so it prints with
/// trailing zeros, e.g. `1234.56` floored to 4 is `1234.5600`.
pub fn floor_dp(amount: Decimal, places: u32) -> Decimal {
    let places = places.min(MAX_DECIMALS);
    let mut floored = amount.round_dp_with_strategy(places, RoundingStrategy::ToZero);
    floored.rescale(places);
    floored
}

/// Floor a smallest-unit integer to `places` decimals and format it
///
/// Works on the digits of `units` directly, so every `u128` is exact.
pub fn floor_units(units: u128, decimals: u32, places: u32) -> String {
    let digits = units.to_string();
    let decimals = decimals as usize;
    let digits = if digits.len() <= decimals {
        format!("{:0>width$}", digits, width = decimals + 1)
    } else {
        digits
    };
    let (whole, frac) = digits.split_at(digits.len() - decimals);
    if places == 0 {
        return whole.to_string();
    }

    let places = places as usize;
    let mut kept: String = frac.chars().take(places).collect();
    while kept.len() < places {
        kept.push('0');
    }
    format!("{}.{}", whole, kept)
}

/// Floor and format with exactly `places` fractional digits
pub fn floor_fixed(amount: Decimal, places: u32) -> String {
    let floored = floor_dp(amount, places);
    format!("{:.*}", places.min(MAX_DECIMALS) as usize, floored)
}
