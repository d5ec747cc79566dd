//! Swap button state

use serde::Serialize;

use crate::engine::ValidationResult;

/// What the swap control should show, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionState {
    /// No wallet session
    ConnectWallet,
    /// Amount missing, malformed, zero, or not quotable
    EnterAmount,
    /// Base amount exceeds the balance
    InsufficientBalance,
    /// Swap may be submitted
    Ready,
}

impl ActionState {
    pub fn evaluate(validation: &ValidationResult, wallet_connected: bool) -> Self {
        if !wallet_connected {
            ActionState::ConnectWallet
        } else if !validation.is_amount_valid {
            ActionState::EnterAmount
        } else if validation.is_insufficient_balance {
            ActionState::InsufficientBalance
        } else {
            ActionState::Ready
        }
    }

    pub fn is_enabled(self) -> bool {
        self == ActionState::Ready
    }

    pub fn label(self) -> &'static str {
        match self {
            ActionState::ConnectWallet => "Connect Wallet",
            ActionState::EnterAmount => "Enter an amount",
            ActionState::InsufficientBalance => "Insufficient balance",
            ActionState::Ready => "Buy",
        }
    }
}
