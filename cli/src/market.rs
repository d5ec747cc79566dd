//! Simulated market the CLI quotes against

use buy_engine::{ConstantProductCurve, FixedRate, QuoteError, QuoteSource};

/// Quote source chosen by the `[curve]` config section
#[derive(Debug, Clone, Copy)]
pub enum Market {
    Curve(ConstantProductCurve),
    Fixed(FixedRate),
}

impl Market {
    /// Execute a buy, returning token units received
    ///
    /// A curve moves its reserves; a fixed rate just prices the order.
    pub fn apply_buy(&mut self, base_units: u128) -> Result<u128, QuoteError> {
        match self {
            Market::Curve(curve) => curve.apply_buy(base_units),
            Market::Fixed(rate) => rate.quote(base_units),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Market::Curve(curve) => match curve.reserves() {
                Some(reserves) => format!(
                    "constant-product x={} y={} fee={}bps",
                    reserves.base,
                    reserves.token,
                    curve.fee_bps()
                ),
                None => "constant-product (uninitialized)".to_string(),
            },
            Market::Fixed(rate) => format!("fixed-rate {}/{}", rate.numerator, rate.denominator),
        }
    }
}

impl QuoteSource for Market {
    fn quote(&self, base_units: u128) -> Result<u128, QuoteError> {
        match self {
            Market::Curve(curve) => curve.quote(base_units),
            Market::Fixed(rate) => rate.quote(base_units),
        }
    }
}
