//! Buy Engine - Amount conversion and validation for a token purchase form
//!
//! The engine owns the two linked sides of a buy form: the base-currency
//! amount the user types and the token amount quoted for it. It derives the
//! quoted side through an injected [`QuoteSource`], floors both sides with
//! exact decimal math, and computes the two booleans that gate the swap
//! action.
//!
//! # Layout
//! - [`quote`]: quote source capability and stock sources
//! - [`balance`]: balance snapshots and the balance reader capability
//! - [`engine`]: the amount pair, validation and sequence-token quoting
//! - [`gate`]: swap button state derived from validation
//! - [`panel`]: form controller with change notifications

pub mod balance;
pub mod engine;
pub mod error;
pub mod gate;
pub mod panel;
pub mod quote;

pub use balance::{BalanceSnapshot, BalanceSource};
pub use engine::{
    AmountEngine, AmountPair, FieldState, Precision, QuoteRequest, QuoteTicket, ValidationResult,
};
pub use error::EngineError;
pub use gate::ActionState;
pub use panel::{BuyPanel, PanelSnapshot, StateObserver, SwapOrder};
pub use quote::{ConstantProductCurve, CurveReserves, FixedRate, QuoteError, QuoteFn, QuoteSource};
