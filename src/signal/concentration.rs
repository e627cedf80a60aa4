//! Trade concentration signal
//!
//! A window dominated by a few large trades (high Herfindahl index) points
//! at a single motivated participant. The signal leans toward the side that
//! holds most of the contracts.

use chrono::Duration;

use super::stats::herfindahl;
use super::types::{Signal, SignalResult};
use crate::config::TradeConcentrationConfig;
use crate::market::{MarketState, Side};

pub struct TradeConcentration {
    config: TradeConcentrationConfig,
}

impl TradeConcentration {
    pub const NAME: &'static str = "trade_concentration";

    pub fn new(config: TradeConcentrationConfig) -> Self {
        Self { config }
    }
}

impl Signal for TradeConcentration {
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

        let total = trades.iter().fold(0u64, |sum, t| sum.saturating_add(t.count));
        if total == 0 {
            return SignalResult::none(Self::NAME, "zero volume");
        }

        let hhi = herfindahl(trades.iter().map(|t| t.count));
        if hhi < self.config.concentration_threshold {
            return SignalResult::none(
                Self::NAME,
                format!(
                    "HHI {:.3} below {:.3}",
                    hhi, self.config.concentration_threshold
                ),
            );
        }

        // Rescale so that perfectly even flow maps to 0 and a single trade to 1
        let n = trades.len() as f64;
        let normalized = if trades.len() <= 1 {
            1.0
        } else {
            ((hhi - 1.0 / n) / (1.0 - 1.0 / n)).clamp(0.0, 1.0)
        };

        let (yes, no) = trades.iter().fold((0u64, 0u64), |(yes, no), t| match t.side {
            Side::Yes => (yes.saturating_add(t.count), no),
            Side::No => (yes, no.saturating_add(t.count)),
        });
        let side = Side::dominant(yes, no);
        let confidence = total.min(100) as f64 / 100.0;

        SignalResult::new(
            Self::NAME,
            side.sign() * normalized,
            confidence,
            format!(
                "HHI {:.3} over {} trades, {} holds {}/{} contracts",
                hhi,
                trades.len(),
                side,
                yes.max(no),
                total
            ),
        )
    }
}
