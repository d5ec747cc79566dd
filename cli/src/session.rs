//! Interactive buy form driven from stdin
//!
//! Each line is one user action against a single panel instance. With a
//! quote latency configured, quotes run as background tasks and can finish
//! out of order; the panel keeps only the answer for the latest edit.

use anyhow::{Context, Result};
use amount_model::floor_units;
use buy_engine::{AmountPair, BalanceSnapshot, QuoteError, QuoteRequest, QuoteSource, QuoteTicket, ValidationResult};
use colored::Colorize;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::panel::{build_panel, report, Panel};
use crate::render;

type QuoteReply = (QuoteTicket, Result<u128, QuoteError>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set(String),
    Clear,
    Max,
    Buy,
    Reset,
    Connect,
    Disconnect,
    Balance(Option<String>),
    State,
    Help,
    Quit,
}

impl Command {
    /// A bare number is shorthand for `set <number>`
    pub fn parse(line: &str) -> Result<Self> {
        let mut parts = line.split_whitespace();
        let Some(head) = parts.next() else {
            anyhow::bail!("empty command");
        };
        let arg = parts.next();
        if parts.next().is_some() {
            anyhow::bail!("too many arguments: {}", line);
        }

        let command = match (head, arg) {
            ("set", Some(amount)) => Command::Set(amount.to_string()),
            ("set", None) | ("clear", None) => Command::Clear,
            ("max", None) => Command::Max,
            ("buy", None) => Command::Buy,
            ("reset", None) => Command::Reset,
            ("connect", None) => Command::Connect,
            ("disconnect", None) => Command::Disconnect,
            ("balance", Some("none")) => Command::Balance(None),
            ("balance", Some(amount)) => Command::Balance(Some(amount.to_string())),
            ("state", None) => Command::State,
            ("help", None) | ("?", None) => Command::Help,
            ("quit", None) | ("exit", None) => Command::Quit,
            (amount, None) if amount.starts_with(|c: char| c.is_ascii_digit() || c == '.') => {
                Command::Set(amount.to_string())
            }
            _ => anyhow::bail!("unknown command: {} (try `help`)", line),
        };
        Ok(command)
    }
}

/// Running totals of simulated swaps
#[derive(Debug, Default)]
struct Ledger {
    swaps: u32,
    tokens_bought: u128,
}

struct Session<'a> {
    config: &'a AppConfig,
    panel: Panel,
    ledger: Ledger,
    latency: Option<Duration>,
    replies: mpsc::UnboundedSender<QuoteReply>,
}

pub async fn run_session(config: &AppConfig, latency_ms: u64, json: bool) -> Result<()> {
    let mut panel = build_panel(config)?;

    let base_symbol = config.token.base_symbol.clone();
    let symbol = config.token.symbol.clone();
    panel.subscribe(move |pair: &AmountPair, validation: &ValidationResult| {
        if json {
            let event = serde_json::json!({ "pair": pair, "validation": validation });
            println!("{}", event);
        } else {
            println!("{}", render::state_line(&base_symbol, &symbol, pair, validation));
        }
    });

    let (replies, mut inbox) = mpsc::unbounded_channel::<QuoteReply>();
    let mut session = Session {
        config,
        panel,
        ledger: Ledger::default(),
        latency: (latency_ms > 0).then(|| Duration::from_millis(latency_ms)),
        replies,
    };

    if !json {
        println!("{}", "=== Buy Panel Session ===".bright_green().bold());
        println!("{} {}", "Market:".bright_cyan(), session.panel.engine().quote_source().describe());
        if let Some(latency) = session.latency {
            println!("{} up to {:?}", "Quote latency:".bright_cyan(), latency);
        }
        println!("{}", "Type `help` for commands".dimmed());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match Command::parse(line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => session.execute(command)?,
                    Err(e) => println!("{} {}", "✗".bright_red(), e),
                }
            }
            Some((ticket, result)) = inbox.recv() => {
                match session.panel.complete_quote(ticket, result) {
                    Ok(true) => {}
                    Ok(false) => {
                        if !json {
                            println!("{} stale quote #{} dropped", "└─".dimmed(), ticket.sequence());
                        }
                    }
                    Err(err) => report(&err),
                }
            }
        }
    }

    if !json {
        println!(
            "\n{} {} swap(s), {} {} bought",
            "Session done:".bright_green(),
            session.ledger.swaps,
            session.token_display(session.ledger.tokens_bought),
            config.token.symbol
        );
    }
    Ok(())
}

impl Session<'_> {
    fn execute(&mut self, command: Command) -> Result<()> {
        match command {
            Command::Set(amount) => self.edit(&amount),
            Command::Clear => self.edit(""),
            Command::Max => {
                if self.latency.is_some() {
                    match self.panel.begin_fill_max() {
                        Ok(request) => self.dispatch(request),
                        Err(err) => report(&err),
                    }
                } else if let Err(err) = self.panel.fill_max() {
                    report(&err);
                }
            }
            Command::Buy => self.buy()?,
            Command::Reset => self.panel.reset(),
            Command::Connect => self.panel.set_wallet_connected(true),
            Command::Disconnect => self.panel.set_wallet_connected(false),
            Command::Balance(amount) => self.set_balance(amount.as_deref())?,
            Command::State => {
                let snapshot = self.panel.snapshot();
                render::print_snapshot(self.config, &snapshot);
                let balance = self.panel.balance();
                println!(
                    "{} {} {}",
                    "Balance:".bright_cyan(),
                    balance.value_decimal(),
                    self.config.token.base_symbol
                );
            }
            Command::Help => print_help(),
            Command::Quit => {}
        }
        Ok(())
    }

    fn edit(&mut self, amount: &str) {
        if self.latency.is_none() {
            if let Err(err) = self.panel.edit_base_amount(amount) {
                report(&err);
            }
            return;
        }
        match self.panel.begin_edit(amount) {
            Ok(Some(request)) => self.dispatch(request),
            Ok(None) => {}
            Err(err) => report(&err),
        }
    }

    /// Quote in the background against a copy of current curve state
    fn dispatch(&self, request: QuoteRequest) {
        let Some(latency) = self.latency else {
            return;
        };
        let market = *self.panel.engine().quote_source();
        let replies = self.replies.clone();
        // Later tickets tend to answer sooner so races are easy to see
        let delay = latency / (1 + (request.ticket.sequence() % 3) as u32);

        log::debug!("quote #{} dispatched, delay {:?}", request.ticket.sequence(), delay);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = market.quote(request.base_units);
            if replies.send((request.ticket, result)).is_err() {
                log::trace!("quote #{} finished after the inbox closed", request.ticket.sequence());
            }
        });
    }

    /// Gate, execute against the simulated market, debit the wallet, reset
    fn buy(&mut self) -> Result<()> {
        let order = match self.panel.begin_swap() {
            Ok(order) => order,
            Err(err) => {
                report(&err);
                return Ok(());
            }
        };

        let tokens = match self.panel.quote_source_mut().apply_buy(order.base_units) {
            Ok(tokens) => tokens,
            Err(err) => {
                println!("{} {}", "Swap failed:".bright_red(), err);
                return Ok(());
            }
        };

        let balance = self.panel.balance();
        let remaining = balance
            .value_raw()
            .checked_sub(order.base_units)
            .context("Swap exceeded wallet balance")?;
        *self.panel.balances_mut() = Some(BalanceSnapshot::new(remaining, balance.decimals())?);

        self.ledger.swaps += 1;
        self.ledger.tokens_bought = self.ledger.tokens_bought.saturating_add(tokens);

        println!(
            "{} Bought {} {} for {} {}",
            "✓".bright_green(),
            self.token_display(tokens),
            self.config.token.symbol,
            order.base_amount,
            self.config.token.base_symbol
        );
        self.panel.submit();
        Ok(())
    }

    fn set_balance(&mut self, amount: Option<&str>) -> Result<()> {
        let balance = match amount {
            Some(amount) => match BalanceSnapshot::from_decimal_str(amount, self.config.token.base_decimals) {
                Ok(balance) => Some(balance),
                Err(e) => {
                    println!("{} balance {:?}: {}", "✗".bright_red(), amount, e);
                    return Ok(());
                }
            },
            None => None,
        };
        *self.panel.balances_mut() = balance;
        self.panel.refresh();
        Ok(())
    }

    fn token_display(&self, units: u128) -> String {
        floor_units(
            units,
            self.config.token.token_decimals,
            self.panel.engine().precision().quoted_places,
        )
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_yellow());
    for (usage, about) in [
        ("<amount> | set <amount>", "type a base amount"),
        ("clear", "empty the base amount"),
        ("max", "fill the whole balance"),
        ("buy", "swap if allowed, then reset the form"),
        ("reset", "clear both sides"),
        ("connect | disconnect", "toggle the wallet session"),
        ("balance <amount|none>", "replace the wallet balance"),
        ("state", "show the full panel"),
        ("quit", "leave"),
    ] {
        println!("  {:<26} {}", usage.bright_cyan(), about.dimmed());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("1.5").unwrap(), Command::Set("1.5".to_string()));
        assert_eq!(Command::parse(".5").unwrap(), Command::Set(".5".to_string()));
        assert_eq!(Command::parse("set 2").unwrap(), Command::Set("2".to_string()));
        assert_eq!(Command::parse("set").unwrap(), Command::Clear);
        assert_eq!(Command::parse("max").unwrap(), Command::Max);
        assert_eq!(Command::parse("balance none").unwrap(), Command::Balance(None));
        assert_eq!(
            Command::parse("balance 3").unwrap(),
            Command::Balance(Some("3".to_string()))
        );
        assert_eq!(Command::parse("exit").unwrap(), Command::Quit);
    }

    #[test]
    fn test_parse_rejects_junk() {
        assert!(Command::parse("sell 1").is_err());
        assert!(Command::parse("set 1 2").is_err());
        assert!(Command::parse("max 3").is_err());
    }

    #[tokio::test]
    async fn test_buy_debits_wallet_and_resets() {
        let mut config = AppConfig::default();
        config.wallet.balance = Some("2".to_string());
        let (replies, _inbox) = mpsc::unbounded_channel();
        let mut session = Session {
            config: &config,
            panel: build_panel(&config).unwrap(),
            ledger: Ledger::default(),
            latency: None,
            replies,
        };

        session.execute(Command::Set("1.5".to_string())).unwrap();
        session.execute(Command::Buy).unwrap();

        assert_eq!(session.ledger.swaps, 1);
        assert!(session.ledger.tokens_bought > 0);
        assert!(session.panel.pair().is_empty());
        assert_eq!(session.panel.balance().value_raw(), 500_000_000_000_000_000);

        // Second buy of the same size now exceeds the wallet
        session.execute(Command::Set("1.5".to_string())).unwrap();
        session.execute(Command::Buy).unwrap();
        assert_eq!(session.ledger.swaps, 1);
    }

    #[tokio::test]
    async fn test_delayed_quotes_keep_latest_edit() {
        let mut config = AppConfig::default();
        config.curve.kind = crate::config::CurveKind::FixedRate;
        let (replies, mut inbox) = mpsc::unbounded_channel();
        let mut session = Session {
            config: &config,
            panel: build_panel(&config).unwrap(),
            ledger: Ledger::default(),
            latency: Some(Duration::from_millis(30)),
            replies,
        };

        session.execute(Command::Set("1".to_string())).unwrap();
        session.execute(Command::Set("2".to_string())).unwrap();

        for _ in 0..2 {
            let (ticket, result) = inbox.recv().await.unwrap();
            let _ = session.panel.complete_quote(ticket, result);
        }
        assert_eq!(session.panel.pair().base_amount(), "2");
        assert_eq!(session.panel.pair().quoted_amount(), "2000.0000");
    }

    #[tokio::test]
    async fn test_quote_after_inbox_closed_is_dropped() {
        let mut config = AppConfig::default();
        config.curve.kind = crate::config::CurveKind::FixedRate;
        let (replies, inbox) = mpsc::unbounded_channel();
        drop(inbox);
        let mut session = Session {
            config: &config,
            panel: build_panel(&config).unwrap(),
            ledger: Ledger::default(),
            latency: Some(Duration::from_millis(5)),
            replies,
        };

        session.execute(Command::Set("1".to_string())).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(session.panel.pair().base_amount(), "1");
        assert_eq!(session.panel.pair().quoted_amount(), "");
        assert!(session.panel.engine().pending_ticket().is_some());

        // The session keeps working without the background quote
        session.execute(Command::Reset).unwrap();
        assert!(session.panel.pair().is_empty());
    }
}
