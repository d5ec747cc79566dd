//! Amount Model - Exact decimal math for two-sided amount forms
//!
//! This crate holds the precision and rounding rules shared by the buy
//! engine and the CLI: parsing typed amounts, converting between display
//! decimals and smallest-unit integers, and flooring to a fixed number of
//! places. Everything is base-10 (`rust_decimal`), never binary floating
//! point, so a floored amount can never overshoot the value it came from.
//!
//! A reference constant-product curve lives in [`curve`] for simulations.

pub mod curve;
pub mod decimal;

pub use curve::{quote_buy_tokens, CurveQuote};
pub use decimal::{
    compare_amount, floor_dp, floor_fixed, floor_units, from_units, parse_amount, parse_or_zero,
    to_units,
};
pub use rust_decimal::Decimal;

/// Places kept on the quoted (token) side of the form
pub const QUOTED_PLACES: u32 = 4;

/// Places kept on the base side when filling the full balance
pub const MAX_FILL_PLACES: u32 = 6;

/// Basis points scale (10,000 bps = 100%)
pub const BPS_SCALE: u32 = 10_000;

/// Largest scale a `Decimal` can carry
pub const MAX_DECIMALS: u32 = 28;

/// Error types for amount operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    /// Not a plain non-negative decimal string
    #[error("malformed amount")]
    Malformed,
    /// Negative values have no unit representation
    #[error("negative amount")]
    Negative,
    /// More fractional digits than the unit can hold
    #[error("amount has more precision than the unit allows")]
    PrecisionExceeded,
    /// Scale beyond what a decimal can carry
    #[error("decimals exceed 28")]
    ScaleTooLarge,
    /// Arithmetic overflow
    #[error("amount overflow")]
    Overflow,
    /// Invalid reserves (zero or negative)
    #[error("invalid curve reserves")]
    InvalidReserves,
    /// Fee outside 0..=10,000 bps
    #[error("invalid fee")]
    InvalidFee,
    /// Insufficient liquidity in pool
    #[error("insufficient curve liquidity")]
    InsufficientLiquidity,
}
