use amount_model::AmountError;
use thiserror::Error;

use crate::quote::QuoteError;

/// Errors surfaced by engine and panel operations
///
/// None of these are fatal. Each leaves the form in a state where the swap
/// action is disabled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Quote source failed or the curve is not initialized
    #[error("quote unavailable: {0}")]
    QuoteUnavailable(#[source] QuoteError),

    /// Operation requires state the caller did not provide
    #[error("precondition failed: {0}")]
    PreconditionFailed(&'static str),

    /// Typed amount has no unit representation
    #[error("invalid amount: {0}")]
    InvalidAmount(#[source] AmountError),
}
