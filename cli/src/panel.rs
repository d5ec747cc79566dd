//! One-shot panel commands: quote, max, check

use anyhow::Result;
use buy_engine::{AmountEngine, BalanceSnapshot, BuyPanel, EngineError};
use colored::Colorize;

use crate::config::AppConfig;
use crate::market::Market;
use crate::render;

pub type Panel = BuyPanel<Market, Option<BalanceSnapshot>>;

/// Panel wired to the configured market and wallet
pub fn build_panel(config: &AppConfig) -> Result<Panel> {
    let engine = AmountEngine::new(config.market()?, config.precision());
    let mut panel = BuyPanel::new(engine, config.balance()?);
    panel.set_wallet_connected(config.wallet.connected);
    Ok(panel)
}

/// Print a non-fatal engine error the way the form would show it
pub fn report(err: &EngineError) {
    match err {
        EngineError::QuoteUnavailable(_) => {
            println!("{} {}", "Quote unavailable:".yellow(), err);
        }
        EngineError::PreconditionFailed(_) => {
            println!("{} {}", "Rejected:".bright_red(), err);
        }
        EngineError::InvalidAmount(_) => {
            println!("{} {}", "Not an amount:".yellow(), err);
        }
    }
}

fn show(config: &AppConfig, panel: &Panel, json: bool) -> Result<()> {
    let snapshot = panel.snapshot();
    if json {
        render::print_json(&snapshot)
    } else {
        render::print_snapshot(config, &snapshot);
        Ok(())
    }
}

pub fn run_quote(config: &AppConfig, amount: &str, json: bool) -> Result<()> {
    let mut panel = build_panel(config)?;
    if !json {
        println!("{}", "=== Quote ===".bright_green().bold());
    }
    if let Err(err) = panel.edit_base_amount(amount) {
        report(&err);
    }
    show(config, &panel, json)
}

pub fn run_max(config: &AppConfig, json: bool) -> Result<()> {
    let mut panel = build_panel(config)?;
    if !json {
        println!("{}", "=== Max Fill ===".bright_green().bold());
    }
    if let Err(err) = panel.fill_max() {
        report(&err);
    }
    show(config, &panel, json)
}

/// Like `quote`, but fails unless the swap would be allowed
pub fn run_check(config: &AppConfig, amount: &str, json: bool) -> Result<()> {
    let mut panel = build_panel(config)?;
    if let Err(err) = panel.edit_base_amount(amount) {
        log::debug!("check {:?}: {}", amount, err);
    }
    show(config, &panel, json)?;

    let order = panel.begin_swap()?;
    if !json {
        println!(
            "\n{} {} {} for {} {}",
            "✓".bright_green(),
            order.base_amount,
            config.token.base_symbol,
            order.quoted_amount,
            config.token.symbol
        );
    }
    Ok(())
}
