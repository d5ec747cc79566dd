//! Constant product bonding curve (x·y=k) on virtual reserves
//!
//! Reference pricing used by simulations. Real deployments read their quote
//! from the curve's owner; this only has to be deterministic.

use rust_decimal::Decimal;

use crate::{AmountError, BPS_SCALE};

/// Result of buying tokens with base currency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveQuote {
    /// Tokens received, in whole-token decimals (not yet floored to units)
    pub tokens_out: Decimal,

    /// New base reserve after the buy
    pub new_base_reserve: Decimal,

    /// New token reserve after the buy
    pub new_token_reserve: Decimal,
}

/// Calculate tokens out for a base-currency buy
///
/// With fee on input:
/// - Δx_net = Δx_in * (1 - fee)
/// - x1 = x0 + Δx_net
/// - Invariant: x0·y0 = x1·y1
/// - Δy_out = y0 - y1 = y0·Δx_net / x1
///
/// # Arguments
/// * `base_reserve` - Virtual base reserve (x)
/// * `token_reserve` - Virtual token reserve (y)
/// * `fee_bps` - Fee in basis points taken from the input
/// * `base_in` - Base amount paid in
pub fn quote_buy_tokens(
    base_reserve: Decimal,
    token_reserve: Decimal,
    fee_bps: u32,
    base_in: Decimal,
) -> Result<CurveQuote, AmountError> {
    if base_reserve <= Decimal::ZERO || token_reserve <= Decimal::ZERO {
        return Err(AmountError::InvalidReserves);
    }
    if fee_bps > BPS_SCALE {
        return Err(AmountError::InvalidFee);
    }
    if base_in < Decimal::ZERO {
        return Err(AmountError::Negative);
    }
    if base_in.is_zero() {
        return Ok(CurveQuote {
            tokens_out: Decimal::ZERO,
            new_base_reserve: base_reserve,
            new_token_reserve: token_reserve,
        });
    }

    let net_in = base_in
        .checked_mul(Decimal::from(BPS_SCALE - fee_bps))
        .and_then(|v| v.checked_div(Decimal::from(BPS_SCALE)))
        .ok_or(AmountError::Overflow)?;

    let x1 = base_reserve
        .checked_add(net_in)
        .ok_or(AmountError::Overflow)?;

    // y0·Δx / x1 avoids forming k, which overflows for 18-decimal supplies
    let tokens_out = token_reserve
        .checked_mul(net_in)
        .and_then(|v| v.checked_div(x1))
        .ok_or(AmountError::Overflow)?;

    if tokens_out >= token_reserve {
        return Err(AmountError::InsufficientLiquidity);
    }

    Ok(CurveQuote {
        tokens_out,
        new_base_reserve: x1,
        new_token_reserve: token_reserve - tokens_out,
    })
}
