//! Buy panel controller
//!
//! Wraps one [`AmountEngine`] with the collaborators a rendered form needs:
//! the balance reader, the wallet connection flag and change observers.
//! The balance is read fresh on every operation and never cached.

use amount_model::{parse_amount, to_units};
use serde::Serialize;

use crate::balance::{BalanceSnapshot, BalanceSource};
use crate::engine::{AmountEngine, AmountPair, FieldState, QuoteRequest, QuoteTicket, ValidationResult};
use crate::error::EngineError;
use crate::gate::ActionState;
use crate::quote::{QuoteError, QuoteSource};

/// Receives the pair and its validation after every state change
pub trait StateObserver {
    fn on_state_change(&mut self, pair: &AmountPair, validation: &ValidationResult);
}

impl<F> StateObserver for F
where
    F: FnMut(&AmountPair, &ValidationResult),
{
    fn on_state_change(&mut self, pair: &AmountPair, validation: &ValidationResult) {
        self(pair, validation)
    }
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelSnapshot {
    pub pair: AmountPair,
    pub validation: ValidationResult,
    pub action: ActionState,
    pub wallet_connected: bool,
    pub base_state: FieldState,
    pub quoted_state: FieldState,
}

/// Validated swap parameters handed to the external swap call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOrder {
    /// Base amount exactly as displayed
    pub base_amount: String,
    /// Same amount in smallest units
    pub base_units: u128,
    /// Quoted token amount shown to the user
    pub quoted_amount: String,
}

pub struct BuyPanel<Q, B> {
    engine: AmountEngine<Q>,
    balances: B,
    wallet_connected: bool,
    observers: Vec<Box<dyn StateObserver>>,
}

impl<Q: QuoteSource, B: BalanceSource> BuyPanel<Q, B> {
    pub fn new(engine: AmountEngine<Q>, balances: B) -> Self {
        Self {
            engine,
            balances,
            wallet_connected: false,
            observers: Vec::new(),
        }
    }

    pub fn subscribe<O: StateObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    pub fn engine(&self) -> &AmountEngine<Q> {
        &self.engine
    }

    pub fn pair(&self) -> &AmountPair {
        self.engine.pair()
    }

    /// Curve owner access; call [`refresh`](Self::refresh) afterwards
    pub fn quote_source_mut(&mut self) -> &mut Q {
        self.engine.quote_source_mut()
    }

    /// Wallet owner access; call [`refresh`](Self::refresh) afterwards
    pub fn balances_mut(&mut self) -> &mut B {
        &mut self.balances
    }

    pub fn is_wallet_connected(&self) -> bool {
        self.wallet_connected
    }

    pub fn set_wallet_connected(&mut self, connected: bool) {
        self.wallet_connected = connected;
        self.notify();
    }

    /// Re-notify observers after an external collaborator changed
    pub fn refresh(&mut self) {
        self.notify();
    }

    /// Latest balance, or zero while none is known
    pub fn balance(&self) -> BalanceSnapshot {
        self.balances
            .current_balance()
            .unwrap_or_else(|| BalanceSnapshot::zero(self.engine.precision().base_decimals))
    }

    pub fn validation(&self) -> ValidationResult {
        self.engine.validate(&self.balance())
    }

    pub fn action_state(&self) -> ActionState {
        ActionState::evaluate(&self.validation(), self.wallet_connected)
    }

    pub fn snapshot(&self) -> PanelSnapshot {
        let validation = self.validation();
        PanelSnapshot {
            pair: self.engine.pair().clone(),
            validation,
            action: ActionState::evaluate(&validation, self.wallet_connected),
            wallet_connected: self.wallet_connected,
            base_state: self.engine.base_state(),
            quoted_state: self.engine.quoted_state(),
        }
    }

    pub fn edit_base_amount(&mut self, raw: &str) -> Result<(), EngineError> {
        let result = self.engine.set_base_amount(raw);
        self.notify();
        result
    }

    pub fn fill_max(&mut self) -> Result<(), EngineError> {
        let balance = self.balances.current_balance();
        let result = self.engine.set_max(balance.as_ref());
        self.notify();
        result
    }

    /// Asynchronous edit: the caller quotes `base_units` and completes the ticket
    pub fn begin_edit(&mut self, raw: &str) -> Result<Option<QuoteRequest>, EngineError> {
        let request = self.engine.begin_base_amount(raw);
        self.notify();
        request
    }

    /// Asynchronous max fill
    pub fn begin_fill_max(&mut self) -> Result<QuoteRequest, EngineError> {
        let balance = self.balances.current_balance();
        let request = self.engine.begin_max(balance.as_ref());
        self.notify();
        request
    }

    /// Apply a quote result; stale tickets change nothing and notify no one
    pub fn complete_quote(
        &mut self,
        ticket: QuoteTicket,
        result: Result<u128, QuoteError>,
    ) -> Result<bool, EngineError> {
        let applied = self.engine.complete_quote(ticket, result);
        if !matches!(applied, Ok(false)) {
            self.notify();
        }
        applied
    }

    /// Check the gate and hand back what the external swap should execute
    pub fn begin_swap(&self) -> Result<SwapOrder, EngineError> {
        let action = self.action_state();
        let reason = match action {
            ActionState::Ready => None,
            ActionState::ConnectWallet => Some("wallet not connected"),
            ActionState::EnterAmount => Some("amount is not valid"),
            ActionState::InsufficientBalance => Some("insufficient balance"),
        };
        if let Some(reason) = reason {
            log::warn!("swap rejected: {}", reason);
            return Err(EngineError::PreconditionFailed(reason));
        }

        let pair = self.engine.pair();
        let base_units = parse_amount(pair.base_amount())
            .and_then(|amount| to_units(amount, self.engine.precision().base_decimals))
            .map_err(EngineError::InvalidAmount)?;

        Ok(SwapOrder {
            base_amount: pair.base_amount().to_string(),
            base_units,
            quoted_amount: pair.quoted_amount().to_string(),
        })
    }

    /// Called once the external swap succeeded
    pub fn submit(&mut self) {
        self.engine.submit();
        self.notify();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.notify();
    }

    fn notify(&mut self) {
        if self.observers.is_empty() {
            return;
        }
        let validation = self.validation();
        let pair = self.engine.pair();
        for observer in self.observers.iter_mut() {
            observer.on_state_change(pair, &validation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Precision;
    use crate::quote::FixedRate;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<(AmountPair, ValidationResult)>>>;

    fn panel(balance: Option<&str>) -> BuyPanel<FixedRate, Option<BalanceSnapshot>> {
        let balance = balance.map(|b| BalanceSnapshot::from_decimal_str(b, 18).unwrap());
        let engine = AmountEngine::new(FixedRate::new(1000, 1), Precision::default());
        BuyPanel::new(engine, balance)
    }

    fn record(panel: &mut BuyPanel<FixedRate, Option<BalanceSnapshot>>) -> Log {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        panel.subscribe(move |pair: &AmountPair, validation: &ValidationResult| {
            sink.borrow_mut().push((pair.clone(), *validation));
        });
        log
    }

    #[test]
    fn test_every_mutation_notifies() {
        let mut panel = panel(Some("2.5"));
        let log = record(&mut panel);

        panel.edit_base_amount("1").unwrap();
        panel.fill_max().unwrap();
        panel.reset();

        let log = log.borrow();
        assert_eq!(log.len(), 3);
        assert_eq!(log[0].0.quoted_amount(), "1000.0000");
        assert!(log[0].1.is_amount_valid);
        assert_eq!(log[1].0.base_amount(), "2.500000");
        assert!(log[2].0.is_empty());
    }

    #[test]
    fn test_missing_balance_counts_as_zero() {
        let mut panel = panel(None);
        panel.set_wallet_connected(true);
        panel.edit_base_amount("1").unwrap();

        assert!(panel.validation().is_insufficient_balance);
        assert_eq!(panel.action_state(), ActionState::InsufficientBalance);
        assert!(matches!(panel.fill_max(), Err(EngineError::PreconditionFailed(_))));
    }

    #[test]
    fn test_stale_completion_does_not_notify() {
        let mut panel = panel(Some("10"));
        let log = record(&mut panel);

        let old = panel.begin_edit("1").unwrap().unwrap();
        let new = panel.begin_edit("2").unwrap().unwrap();
        assert!(!panel.complete_quote(old.ticket, Ok(1)).unwrap());
        assert!(panel.complete_quote(new.ticket, Ok(2_000_000_000_000_000_000_000)).unwrap());

        // two edits plus one applied quote
        assert_eq!(log.borrow().len(), 3);
        assert_eq!(panel.pair().quoted_amount(), "2000.0000");
    }

    #[test]
    fn test_swap_round_trip() {
        let mut panel = panel(Some("2.5"));
        assert!(matches!(panel.begin_swap(), Err(EngineError::PreconditionFailed(_))));

        panel.set_wallet_connected(true);
        panel.edit_base_amount("1.5").unwrap();
        let order = panel.begin_swap().unwrap();
        assert_eq!(order.base_amount, "1.5");
        assert_eq!(order.base_units, 1_500_000_000_000_000_000);
        assert_eq!(order.quoted_amount, "1500.0000");

        panel.submit();
        assert!(panel.pair().is_empty());
        assert_eq!(panel.action_state(), ActionState::EnterAmount);
    }

    #[test]
    fn test_balance_read_fresh_each_time() {
        let mut panel = panel(Some("2"));
        panel.edit_base_amount("1.5").unwrap();
        assert!(!panel.validation().is_insufficient_balance);

        *panel.balances_mut() = Some(BalanceSnapshot::from_decimal_str("1", 18).unwrap());
        panel.refresh();
        assert!(panel.validation().is_insufficient_balance);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut panel = panel(Some("2.5"));
        panel.set_wallet_connected(true);
        panel.edit_base_amount("1.23456").unwrap();

        let snapshot = panel.snapshot();
        assert_eq!(snapshot.action, ActionState::Ready);
        assert_eq!(snapshot.base_state, FieldState::Populated);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["pair"]["quotedAmount"], "1234.5600");
        assert_eq!(json["validation"]["isAmountValid"], true);
        assert_eq!(json["action"], "ready");
    }
}
