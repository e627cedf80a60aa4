//! Volume-price divergence signal
//!
//! Volume surging while price stays put is accumulation: someone is absorbing
//! the other side without moving the market yet. The signal follows the
//! dominant trade flow.

use chrono::Duration;

use super::types::{Signal, SignalResult};
use crate::config::VolumeDivergenceConfig;
use crate::market::MarketState;

pub struct VolumeDivergence {
    config: VolumeDivergenceConfig,
}

impl VolumeDivergence {
    pub const NAME: &'static str = "volume_divergence";

    pub fn new(config: VolumeDivergenceConfig) -> Self {
        Self { config }
    }

    fn window(&self) -> Duration {
        Duration::seconds(self.config.window_secs as i64)
    }

    fn baseline_window(&self) -> Duration {
        Duration::seconds(self.config.baseline_window_secs as i64)
    }
}

impl Signal for VolumeDivergence {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn weight(&self) -> f64 {
        self.config.weight
    }

    fn lookback(&self) -> Duration {
        self.window().max(self.baseline_window())
    }

    fn evaluate(&self, state: &MarketState) -> SignalResult {
        let baseline = state.get_volume_rate(self.baseline_window());
        if baseline <= 0.0 {
            return SignalResult::none(Self::NAME, "no baseline volume");
        }

        let flow = state.get_trade_flow(self.window());
        if flow.total_trades < self.config.min_trades {
            return SignalResult::none(
                Self::NAME,
                format!("{} trades < {}", flow.total_trades, self.config.min_trades),
            );
        }

        let recent = state.get_volume_rate(self.window());
        let ratio = recent / baseline;
        if ratio < self.config.volume_multiplier {
            return SignalResult::none(
                Self::NAME,
                format!(
                    "volume ratio {:.2} below {:.2}",
                    ratio, self.config.volume_multiplier
                ),
            );
        }

        let price_move = state.get_price_change(self.window()).abs();
        if price_move > self.config.max_price_move_cents {
            return SignalResult::none(
                Self::NAME,
                format!(
                    "price moved {:.0}c (> {:.0}c)",
                    price_move, self.config.max_price_move_cents
                ),
            );
        }

        let magnitude = ((ratio - 1.0) / 4.0).clamp(0.0, 1.0);
        let confidence =
            (ratio / 5.0).min(1.0) * (1.0 - price_move / self.config.max_price_move_cents);
        let side = flow.dominant_side;

        SignalResult::new(
            Self::NAME,
            side.sign() * magnitude,
            confidence,
            format!(
                "volume {:.1}x baseline ({:.0}/min vs {:.0}/min), price {:.0}c, {} flow",
                ratio, recent, baseline, price_move, side
            ),
        )
    }
}
