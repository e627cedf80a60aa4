//! Trade imbalance signal
//!
//! Net YES minus NO contracts as a share of all contracts traded.

use chrono::Duration;

use super::types::{Signal, SignalResult};
use crate::config::TradeImbalanceConfig;
use crate::market::MarketState;

pub struct TradeImbalance {
    config: TradeImbalanceConfig,
}

impl TradeImbalance {
    pub const NAME: &'static str = "trade_imbalance";

    pub fn new(config: TradeImbalanceConfig) -> Self {
        Self { config }
    }
}

impl Signal for TradeImbalance {
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
        let flow = state.get_trade_flow(self.lookback());
        if flow.total_trades < self.config.min_trades {
            return SignalResult::none(
                Self::NAME,
                format!("{} trades < {}", flow.total_trades, self.config.min_trades),
            );
        }

        let total = flow.yes_contracts.saturating_add(flow.no_contracts);
        if total == 0 {
            return SignalResult::none(Self::NAME, "zero volume");
        }

        let imbalance = (flow.yes_contracts as f64 - flow.no_contracts as f64) / total as f64;
        if imbalance.abs() < self.config.imbalance_threshold {
            return SignalResult::none(
                Self::NAME,
                format!(
                    "imbalance {:+.2} within {:.2}",
                    imbalance, self.config.imbalance_threshold
                ),
            );
        }

        SignalResult::new(
            Self::NAME,
            imbalance,
            total.min(100) as f64 / 100.0,
            format!(
                "{} YES vs {} NO contracts ({:+.2})",
                flow.yes_contracts, flow.no_contracts, imbalance
            ),
        )
    }
}
