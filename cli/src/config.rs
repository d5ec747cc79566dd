//! Panel configuration: token precision, quote curve and simulated wallet

use anyhow::{Context, Result};
use amount_model::{parse_amount, AmountError, Decimal, BPS_SCALE, MAX_DECIMALS};
use buy_engine::{BalanceSnapshot, ConstantProductCurve, CurveReserves, FixedRate, Precision};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::market::Market;

/// Used when `--config` is not given; a missing file here means defaults
pub const DEFAULT_CONFIG_PATH: &str = "~/.config/buypanel/config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub token: TokenConfig,
    pub curve: CurveConfig,
    pub wallet: WalletConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TokenConfig {
    pub base_symbol: String,
    pub symbol: String,
    pub base_decimals: u32,
    pub token_decimals: u32,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            base_symbol: "ETH".to_string(),
            symbol: "SPACE".to_string(),
            base_decimals: 18,
            token_decimals: 18,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurveKind {
    ConstantProduct,
    FixedRate,
    /// Curve state not loaded; every quote fails
    Uninitialized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CurveConfig {
    pub kind: CurveKind,
    /// Virtual base reserve (constant-product)
    pub base_reserve: String,
    /// Virtual token reserve (constant-product)
    pub token_reserve: String,
    /// Fee on input in basis points (constant-product)
    pub fee_bps: u32,
    /// Tokens per base (fixed-rate)
    pub rate: String,
}

impl Default for CurveConfig {
    fn default() -> Self {
        Self {
            kind: CurveKind::ConstantProduct,
            base_reserve: "30".to_string(),
            token_reserve: "1073000000".to_string(),
            fee_bps: 100,
            rate: "1000".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WalletConfig {
    /// Base-currency balance, e.g. "2.5"; absent means not loaded
    pub balance: Option<String>,
    pub connected: bool,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            balance: Some("2.5".to_string()),
            connected: true,
        }
    }
}

impl AppConfig {
    /// Load from an explicit path, or from the default path if it exists
    pub fn load(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(&expand_path(path)?),
            None => {
                let path = expand_path(DEFAULT_CONFIG_PATH)?;
                if path.exists() {
                    Self::from_file(&path)
                } else {
                    log::debug!("no config at {}, using defaults", path.display());
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&data)
            .with_context(|| format!("Failed to parse config TOML: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, decimals) in [
            ("token.base_decimals", self.token.base_decimals),
            ("token.token_decimals", self.token.token_decimals),
        ] {
            if decimals > MAX_DECIMALS {
                anyhow::bail!("{} must be at most {}, got {}", name, MAX_DECIMALS, decimals);
            }
        }
        if self.curve.fee_bps > BPS_SCALE {
            anyhow::bail!("curve.fee_bps must be at most {}, got {}", BPS_SCALE, self.curve.fee_bps);
        }
        self.market().context("Invalid curve section")?;
        self.balance().context("Invalid wallet section")?;
        Ok(())
    }

    pub fn precision(&self) -> Precision {
        Precision::new(self.token.base_decimals, self.token.token_decimals)
    }

    /// Build the quote source described by the `[curve]` section
    pub fn market(&self) -> Result<Market> {
        let base_decimals = self.token.base_decimals;
        let token_decimals = self.token.token_decimals;
        let market = match self.curve.kind {
            CurveKind::ConstantProduct => Market::Curve(ConstantProductCurve::new(
                CurveReserves {
                    base: parse_field("curve.base_reserve", &self.curve.base_reserve)?,
                    token: parse_field("curve.token_reserve", &self.curve.token_reserve)?,
                },
                self.curve.fee_bps,
                base_decimals,
                token_decimals,
            )),
            CurveKind::FixedRate => {
                let rate = parse_field("curve.rate", &self.curve.rate)?;
                Market::Fixed(fixed_rate(rate, base_decimals, token_decimals)?)
            }
            CurveKind::Uninitialized => Market::Curve(ConstantProductCurve::uninitialized(
                self.curve.fee_bps,
                base_decimals,
                token_decimals,
            )),
        };
        Ok(market)
    }

    pub fn balance(&self) -> Result<Option<BalanceSnapshot>> {
        self.wallet
            .balance
            .as_deref()
            .map(|amount| {
                BalanceSnapshot::from_decimal_str(amount, self.token.base_decimals)
                    .map_err(|e| anyhow::anyhow!("wallet.balance {:?}: {}", amount, e))
            })
            .transpose()
    }
}

fn expand_path(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .with_context(|| format!("Failed to expand path: {}", path))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

fn parse_field(name: &str, value: &str) -> Result<Decimal> {
    parse_amount(value).map_err(|e| anyhow::anyhow!("{} {:?}: {}", name, value, e))
}

/// Express "tokens per base" as a unit ratio between the two currencies
fn fixed_rate(rate: Decimal, base_decimals: u32, token_decimals: u32) -> Result<FixedRate> {
    let rate = rate.normalize();
    let mantissa = u128::try_from(rate.mantissa()).map_err(|_| AmountError::Negative)?;
    let pow10 = |exp: u32| 10u128.checked_pow(exp).ok_or(AmountError::Overflow);

    let (numerator, denominator) = if token_decimals >= base_decimals {
        let numerator = mantissa
            .checked_mul(pow10(token_decimals - base_decimals)?)
            .ok_or(AmountError::Overflow)?;
        (numerator, pow10(rate.scale())?)
    } else {
        (mantissa, pow10(rate.scale() + base_decimals - token_decimals)?)
    };
    Ok(FixedRate::new(numerator, denominator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use buy_engine::QuoteSource;
    use std::io::Write;

    const SAMPLE: &str = r#"
[token]
base_symbol = "ETH"
symbol = "DOC"
base_decimals = 18
token_decimals = 18

[curve]
kind = "fixed-rate"
rate = "1000"

[wallet]
balance = "0.5"
connected = false
"#;

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        config.validate().unwrap();
        assert!(matches!(config.market().unwrap(), Market::Curve(_)));
        assert_eq!(config.balance().unwrap().unwrap().value_raw(), 2_500_000_000_000_000_000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.token.symbol, "DOC");
        assert!(!config.wallet.connected);
        // Unspecified keys fall back to defaults
        assert_eq!(config.curve.fee_bps, 100);

        let market = config.market().unwrap();
        assert_eq!(market.quote(1_000_000_000_000_000_000).unwrap(), 1_000 * 1_000_000_000_000_000_000);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let err = AppConfig::load(missing.to_str()).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.curve.fee_bps = 20_000;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.wallet.balance = Some("-1".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.token.base_decimals = 40;
        assert!(config.validate().is_err());

        let unknown = "[wallet]\nbalanse = \"1\"\n";
        assert!(toml::from_str::<AppConfig>(unknown).is_err());
    }

    #[test]
    fn test_fixed_rate_across_decimals() {
        // 1 ETH (18 decimals) at 2.5 USDC (6 decimals) per ETH
        let rate = fixed_rate(Decimal::new(25, 1), 18, 6).unwrap();
        assert_eq!(rate.quote(1_000_000_000_000_000_000).unwrap(), 2_500_000);

        // 6-decimal base into 18-decimal token at 1000 per base
        let rate = fixed_rate(Decimal::from(1000), 6, 18).unwrap();
        assert_eq!(rate.quote(1_000_000).unwrap(), 1_000 * 1_000_000_000_000_000_000);
    }

    #[test]
    fn test_uninitialized_curve_kind() {
        let mut config = AppConfig::default();
        config.curve.kind = CurveKind::Uninitialized;
        assert!(config.market().unwrap().quote(1).is_err());
    }
}
