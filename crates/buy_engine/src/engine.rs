//! Amount engine: the linked base/quoted pair and its validation
//!
//! The base side holds whatever the user typed. The quoted side is always
//! derived from it: `floor(quote(to_units(base)), QUOTED_PLACES)`. It has no
//! setter of its own.
//!
//! Quoting is split into a request and a completion so asynchronous quote
//! sources can be used. Every edit issues a fresh [`QuoteTicket`]; a
//! completion carrying any other ticket is stale and is dropped. The
//! synchronous operations run both halves back to back.

use std::cmp::Ordering;

use amount_model::{
    compare_amount, floor_units, parse_amount, to_units, Decimal, MAX_FILL_PLACES, QUOTED_PLACES,
};
use serde::Serialize;

use crate::balance::BalanceSnapshot;
use crate::error::EngineError;
use crate::quote::{QuoteError, QuoteSource};

/// Decimal places for both currencies and both display sides
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Precision {
    /// Base currency unit decimals (18 for ETH)
    pub base_decimals: u32,
    /// Token unit decimals
    pub token_decimals: u32,
    /// Places kept on the quoted side
    pub quoted_places: u32,
    /// Places kept on the base side when filling the full balance
    pub max_fill_places: u32,
}

impl Precision {
    pub const fn new(base_decimals: u32, token_decimals: u32) -> Self {
        Self {
            base_decimals,
            token_decimals,
            quoted_places: QUOTED_PLACES,
            max_fill_places: MAX_FILL_PLACES,
        }
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::new(18, 18)
    }
}

/// The two linked sides of the buy form, as display strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountPair {
    base_amount: String,
    quoted_amount: String,
}

impl AmountPair {
    pub fn base_amount(&self) -> &str {
        &self.base_amount
    }

    pub fn quoted_amount(&self) -> &str {
        &self.quoted_amount
    }

    pub fn is_empty(&self) -> bool {
        self.base_amount.is_empty() && self.quoted_amount.is_empty()
    }
}

/// Gate inputs for the swap action
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// Both sides parse to a strictly positive number
    pub is_amount_valid: bool,
    /// Base amount exceeds the balance
    pub is_insufficient_balance: bool,
}

/// Per-field display state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldState {
    Empty,
    Populated,
}

impl FieldState {
    fn of(value: &str) -> Self {
        if value.is_empty() {
            FieldState::Empty
        } else {
            FieldState::Populated
        }
    }
}

/// Sequence token identifying one quote request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuoteTicket(u64);

impl QuoteTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

/// Outstanding quote the caller must resolve with [`AmountEngine::complete_quote`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuoteRequest {
    pub ticket: QuoteTicket,
    pub base_units: u128,
}

/// Owns the amount pair for one form instance
pub struct AmountEngine<Q> {
    quote_source: Q,
    precision: Precision,
    pair: AmountPair,
    sequence: u64,
    pending: Option<QuoteTicket>,
}

impl<Q: QuoteSource> AmountEngine<Q> {
    pub fn new(quote_source: Q, precision: Precision) -> Self {
        Self {
            quote_source,
            precision,
            pair: AmountPair::default(),
            sequence: 0,
            pending: None,
        }
    }

    pub fn pair(&self) -> &AmountPair {
        &self.pair
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn quote_source(&self) -> &Q {
        &self.quote_source
    }

    /// Owner access for advancing curve state between quotes
    pub fn quote_source_mut(&mut self) -> &mut Q {
        &mut self.quote_source
    }

    pub fn base_state(&self) -> FieldState {
        FieldState::of(&self.pair.base_amount)
    }

    pub fn quoted_state(&self) -> FieldState {
        FieldState::of(&self.pair.quoted_amount)
    }

    /// Ticket of the quote still awaiting completion, if any
    pub fn pending_ticket(&self) -> Option<QuoteTicket> {
        self.pending
    }

    /// Store a typed base amount and derive the quoted side
    ///
    /// An empty string clears the quoted side and is not an error. On
    /// failure the quoted side is left empty, which keeps the amount invalid.
    pub fn set_base_amount(&mut self, raw: &str) -> Result<(), EngineError> {
        match self.begin_base_amount(raw)? {
            Some(request) => self.resolve(request),
            None => Ok(()),
        }
    }

    /// Fill the base side with the whole balance, floored for display
    ///
    /// The quote uses the raw, unrounded balance so display rounding does
    /// not leak into the quoted side.
    pub fn set_max(&mut self, balance: Option<&BalanceSnapshot>) -> Result<(), EngineError> {
        let request = self.begin_max(balance)?;
        self.resolve(request)
    }

    /// Clear both sides and drop any outstanding quote
    pub fn reset(&mut self) {
        self.pair.base_amount.clear();
        self.pair.quoted_amount.clear();
        self.pending = None;
    }

    /// Answer to a successful external swap
    pub fn submit(&mut self) {
        log::debug!(
            "swap submitted: base={} quoted={}",
            self.pair.base_amount,
            self.pair.quoted_amount
        );
        self.reset();
    }

    /// Derive the swap gate from current state and the latest balance
    ///
    /// Unparsable text counts as zero. Well-formed amounts compare exactly,
    /// including ones too large or too precise to quote.
    pub fn validate(&self, balance: &BalanceSnapshot) -> ValidationResult {
        let exceeds = |text: &str, value: Decimal| {
            compare_amount(text, value) == Ok(Ordering::Greater)
        };
        ValidationResult {
            is_amount_valid: exceeds(&self.pair.base_amount, Decimal::ZERO)
                && exceeds(&self.pair.quoted_amount, Decimal::ZERO),
            is_insufficient_balance: exceeds(&self.pair.base_amount, balance.value_decimal()),
        }
    }

    /// First half of [`set_base_amount`](Self::set_base_amount)
    ///
    /// Returns `None` for empty input. Otherwise the quoted side is cleared
    /// until the returned request is completed.
    pub fn begin_base_amount(&mut self, raw: &str) -> Result<Option<QuoteRequest>, EngineError> {
        self.pair.base_amount = raw.to_string();
        self.pair.quoted_amount.clear();
        self.pending = None;

        if raw.is_empty() {
            return Ok(None);
        }

        let base_units = parse_amount(raw)
            .and_then(|amount| to_units(amount, self.precision.base_decimals))
            .map_err(|e| {
                log::debug!("base amount {:?} has no unit value: {}", raw, e);
                EngineError::InvalidAmount(e)
            })?;

        Ok(Some(self.issue(base_units)))
    }

    /// First half of [`set_max`](Self::set_max)
    pub fn begin_max(&mut self, balance: Option<&BalanceSnapshot>) -> Result<QuoteRequest, EngineError> {
        let balance = balance.ok_or_else(|| {
            log::warn!("max fill requested without a balance");
            EngineError::PreconditionFailed("no balance available")
        })?;
        if balance.decimals() != self.precision.base_decimals {
            log::warn!(
                "balance has {} decimals, base currency has {}",
                balance.decimals(),
                self.precision.base_decimals
            );
            return Err(EngineError::PreconditionFailed(
                "balance decimals do not match the base currency",
            ));
        }

        self.pair.base_amount = floor_units(
            balance.value_raw(),
            self.precision.base_decimals,
            self.precision.max_fill_places,
        );
        self.pair.quoted_amount.clear();
        Ok(self.issue(balance.value_raw()))
    }

    /// Second half of a quote: apply the result if `ticket` is still current
    ///
    /// Returns `Ok(false)` for a superseded ticket, leaving state untouched.
    pub fn complete_quote(
        &mut self,
        ticket: QuoteTicket,
        result: Result<u128, QuoteError>,
    ) -> Result<bool, EngineError> {
        if self.pending != Some(ticket) {
            log::trace!("discarding stale quote #{}", ticket.sequence());
            return Ok(false);
        }
        self.pending = None;

        match result {
            Ok(token_units) => {
                self.pair.quoted_amount = floor_units(
                    token_units,
                    self.precision.token_decimals,
                    self.precision.quoted_places,
                );
                log::debug!(
                    "quote #{}: {} -> {}",
                    ticket.sequence(),
                    self.pair.base_amount,
                    self.pair.quoted_amount
                );
                Ok(true)
            }
            Err(e) => {
                self.pair.quoted_amount.clear();
                log::warn!("quote #{} unavailable: {}", ticket.sequence(), e);
                Err(EngineError::QuoteUnavailable(e))
            }
        }
    }

    fn issue(&mut self, base_units: u128) -> QuoteRequest {
        self.sequence += 1;
        let ticket = QuoteTicket(self.sequence);
        self.pending = Some(ticket);
        QuoteRequest { ticket, base_units }
    }

    fn resolve(&mut self, request: QuoteRequest) -> Result<(), EngineError> {
        let result = self.quote_source.quote(request.base_units);
        self.complete_quote(request.ticket, result).map(|_| ())
    }
}
