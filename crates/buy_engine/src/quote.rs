//! Quote sources: base-currency units in, token units out
//!
//! The engine treats a quote source as a pure read of current curve state.
//! It never mutates one; whoever owns the curve advances it.

use amount_model::{floor_dp, from_units, quote_buy_tokens, to_units, AmountError, CurveQuote, Decimal};
use thiserror::Error;

/// Quote failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuoteError {
    /// Curve state has not been loaded yet
    #[error("bonding curve not initialized")]
    CurveUninitialized,

    /// Quote does not fit in the unit type
    #[error("quote overflow")]
    Overflow,

    /// Amount or curve math rejected the input
    #[error(transparent)]
    Amount(#[from] AmountError),

    /// External source could not answer
    #[error("quote source unavailable: {0}")]
    Unavailable(String),
}

/// Capability mapping a base-currency amount to a token amount
///
/// Both sides are smallest-unit integers. Implementations must be
/// deterministic for a given curve state.
pub trait QuoteSource {
    fn quote(&self, base_units: u128) -> Result<u128, QuoteError>;
}

impl<T: QuoteSource + ?Sized> QuoteSource for &T {
    fn quote(&self, base_units: u128) -> Result<u128, QuoteError> {
        (**self).quote(base_units)
    }
}

/// Adapter turning a closure into a quote source
pub struct QuoteFn<F>(pub F);

impl<F> QuoteSource for QuoteFn<F>
where
    F: Fn(u128) -> Result<u128, QuoteError>,
{
    fn quote(&self, base_units: u128) -> Result<u128, QuoteError> {
        (self.0)(base_units)
    }
}

/// Linear price: `tokens = base * numerator / denominator`, floored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRate {
    pub numerator: u128,
    pub denominator: u128,
}

impl FixedRate {
    pub const fn new(numerator: u128, denominator: u128) -> Self {
        Self { numerator, denominator }
    }
}

impl QuoteSource for FixedRate {
    fn quote(&self, base_units: u128) -> Result<u128, QuoteError> {
        if self.denominator == 0 {
            return Err(QuoteError::CurveUninitialized);
        }
        let gross = base_units
            .checked_mul(self.numerator)
            .ok_or(QuoteError::Overflow)?;
        Ok(gross / self.denominator)
    }
}

/// Virtual reserves of a constant product curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveReserves {
    pub base: Decimal,
    pub token: Decimal,
}

/// Constant product bonding curve over virtual reserves
///
/// Starts uninitialized when built with [`ConstantProductCurve::uninitialized`];
/// quotes fail with `CurveUninitialized` until reserves are loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantProductCurve {
    reserves: Option<CurveReserves>,
    fee_bps: u32,
    base_decimals: u32,
    token_decimals: u32,
}

impl ConstantProductCurve {
    pub fn new(
        reserves: CurveReserves,
        fee_bps: u32,
        base_decimals: u32,
        token_decimals: u32,
    ) -> Self {
        Self {
            reserves: Some(reserves),
            fee_bps,
            base_decimals,
            token_decimals,
        }
    }

    pub fn uninitialized(fee_bps: u32, base_decimals: u32, token_decimals: u32) -> Self {
        Self {
            reserves: None,
            fee_bps,
            base_decimals,
            token_decimals,
        }
    }

    /// Load (or replace) curve state
    pub fn initialize(&mut self, reserves: CurveReserves) {
        self.reserves = Some(reserves);
    }

    pub fn reserves(&self) -> Option<CurveReserves> {
        self.reserves
    }

    pub fn fee_bps(&self) -> u32 {
        self.fee_bps
    }

    /// Spot price in tokens per base, before fee and slippage
    pub fn spot_price(&self) -> Option<Decimal> {
        self.reserves
            .and_then(|r| r.token.checked_div(r.base))
    }

    fn quote_units(&self, base_units: u128) -> Result<(CurveQuote, u128), QuoteError> {
        let reserves = self.reserves.ok_or(QuoteError::CurveUninitialized)?;
        let base_in = from_units(base_units, self.base_decimals)?;
        let quote = quote_buy_tokens(reserves.base, reserves.token, self.fee_bps, base_in)?;
        let tokens = to_units(floor_dp(quote.tokens_out, self.token_decimals), self.token_decimals)?;
        Ok((quote, tokens))
    }

    /// Execute a buy against the curve, returning token units bought
    pub fn apply_buy(&mut self, base_units: u128) -> Result<u128, QuoteError> {
        let (quote, tokens) = self.quote_units(base_units)?;
        self.reserves = Some(CurveReserves {
            base: quote.new_base_reserve,
            token: quote.new_token_reserve,
        });
        log::debug!(
            "curve advanced: base_reserve={} token_reserve={}",
            quote.new_base_reserve,
            quote.new_token_reserve
        );
        Ok(tokens)
    }
}

impl QuoteSource for ConstantProductCurve {
    fn quote(&self, base_units: u128) -> Result<u128, QuoteError> {
        self.quote_units(base_units).map(|(_, tokens)| tokens)
    }
}
