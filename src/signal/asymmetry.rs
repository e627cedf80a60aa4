//! Flow asymmetry signal
//!
//! YES and NO prices of a binary market should sum to about 100. When YES
//! buyers pay more than the NO side implies, YES demand is outrunning the
//! book, and vice versa.

use chrono::Duration;

use super::stats::weighted_mean;
use super::types::{Signal, SignalResult};
use crate::config::FlowAsymmetryConfig;
use crate::market::{MarketState, Side};

pub struct FlowAsymmetry {
    config: FlowAsymmetryConfig,
}

impl FlowAsymmetry {
    pub const NAME: &'static str = "flow_asymmetry";

    pub fn new(config: FlowAsymmetryConfig) -> Self {
        Self { config }
    }
}

impl Signal for FlowAsymmetry {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.config.weight
    }

    fn lookback(&self) -> Duration {
        Duration::seconds(self.config.window_secs as i64)
    }

    fn evaluate(&self, state: &MarketState) -> SignalResult {
        let trades = state.get_recent_trades(self.lookback());
        if trades.len() < self.config.min_trades {
            return SignalResult::none(
                Self::NAME,
                format!("{} trades < {}", trades.len(), self.config.min_trades),
            );
        }

        let side_mean = |side: Side| {
            weighted_mean(
                trades
                    .iter()
                    .filter(|t| t.side == side)
                    .map(|t| (t.price, t.count)),
            )
        };
        let (Some(avg_yes), Some(avg_no)) = (side_mean(Side::Yes), side_mean(Side::No)) else {
            return SignalResult::none(Self::NAME, "one-sided flow");
        };

        let implied_yes = 100.0 - avg_no;
        let asymmetry = avg_yes - implied_yes;
        if asymmetry.abs() < self.config.asymmetry_threshold {
            return SignalResult::none(
                Self::NAME,
                format!(
                    "asymmetry {:+.2}c within {:.2}c",
                    asymmetry, self.config.asymmetry_threshold
                ),
            );
        }

        let magnitude = (asymmetry.abs() / 10.0).min(1.0);
        let confidence = (trades.len() as f64 / 20.0).min(1.0);

        SignalResult::new(
            Self::NAME,
            asymmetry.signum() * magnitude,
            confidence,
            format!(
                "YES avg {:.2}c vs NO-implied {:.2}c ({:+.2}c)",
                avg_yes, implied_yes, asymmetry
            ),
        )
    }
}
