//! Terminal rendering of panel state

use anyhow::Result;
use buy_engine::{ActionState, AmountPair, PanelSnapshot, ValidationResult};
use colored::Colorize;

use crate::config::AppConfig;

fn or_placeholder(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

pub fn print_snapshot(config: &AppConfig, snapshot: &PanelSnapshot) {
    println!(
        "{} {} {}",
        "Sell:".bright_cyan(),
        or_placeholder(snapshot.pair.base_amount()),
        config.token.base_symbol
    );
    println!(
        "{} {} {}",
        "Buy:".bright_cyan(),
        or_placeholder(snapshot.pair.quoted_amount()),
        config.token.symbol
    );
    println!(
        "{} {}",
        "Amount valid:".bright_cyan(),
        yes_no(snapshot.validation.is_amount_valid)
    );
    println!(
        "{} {}",
        "Insufficient balance:".bright_cyan(),
        yes_no(snapshot.validation.is_insufficient_balance)
    );
    println!(
        "{} {}",
        "Wallet connected:".bright_cyan(),
        yes_no(snapshot.wallet_connected)
    );
    println!("{} {}", "Action:".bright_cyan(), action_label(snapshot.action));
}

pub fn print_json(snapshot: &PanelSnapshot) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}

pub fn action_label(action: ActionState) -> String {
    let label = format!("[{}]", action.label());
    if action.is_enabled() {
        label.bright_green().bold().to_string()
    } else {
        label.yellow().to_string()
    }
}

/// One-line summary printed by the session observer
pub fn state_line(
    base_symbol: &str,
    symbol: &str,
    pair: &AmountPair,
    validation: &ValidationResult,
) -> String {
    let mut flags = Vec::new();
    if !validation.is_amount_valid {
        flags.push("invalid");
    }
    if validation.is_insufficient_balance {
        flags.push("insufficient");
    }
    let flags = if flags.is_empty() {
        "ok".green().to_string()
    } else {
        flags.join(",").yellow().to_string()
    };

    format!(
        "{} {} {} {} {} {} ({})",
        "├─".dimmed(),
        or_placeholder(pair.base_amount()),
        base_symbol,
        "→".dimmed(),
        or_placeholder(pair.quoted_amount()),
        symbol,
        flags
    )
}
