//! Spread velocity signal
//!
//! Fits a least-squares line to the bid/ask spread over the window. A spread
//! that is moving fast and consistently means liquidity providers are
//! repricing; the midpoint drift says which way.

use chrono::Duration;

use super::stats::linear_fit;
use super::types::{Signal, SignalResult};
use crate::config::SpreadVelocityConfig;
use crate::market::MarketState;

/// Slope, in cents per second, that maps to full magnitude
const FULL_SCALE_SLOPE: f64 = 0.5;

pub struct SpreadVelocity {
    config: SpreadVelocityConfig,
}

impl SpreadVelocity {
    pub const NAME: &'static str = "spread_velocity";

    pub fn new(config: SpreadVelocityConfig) -> Self {
        Self { config }
    }
}

impl Signal for SpreadVelocity {
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
        let history = state.get_spread_history(self.lookback());
        if history.len() < self.config.min_snapshots {
            return SignalResult::none(
                Self::NAME,
                format!("{} snapshots < {}", history.len(), self.config.min_snapshots),
            );
        }
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            return SignalResult::none(Self::NAME, "no snapshots");
        };

        let points: Vec<(f64, f64)> = history
            .iter()
            .map(|p| {
                let secs = (p.ts - first.ts).num_milliseconds() as f64 / 1000.0;
                (secs, p.spread)
            })
            .collect();
        let Some(fit) = linear_fit(&points) else {
            return SignalResult::none(Self::NAME, "snapshots share one timestamp");
        };

        if fit.slope.abs() < self.config.velocity_threshold {
            return SignalResult::none(
                Self::NAME,
                format!(
                    "spread slope {:+.3}c/s within {:.3}c/s",
                    fit.slope, self.config.velocity_threshold
                ),
            );
        }

        let midpoint_change = last.midpoint - first.midpoint;
        if midpoint_change == 0.0 {
            return SignalResult::none(Self::NAME, "midpoint unchanged");
        }

        let magnitude = (fit.slope.abs() / FULL_SCALE_SLOPE).min(1.0);

        SignalResult::new(
            Self::NAME,
            midpoint_change.signum() * magnitude,
            fit.r_squared.max(0.0),
            format!(
                "spread {:.1}->{:.1}c at {:+.3}c/s (R2 {:.2}), midpoint {:+.1}c",
                first.spread, last.spread, fit.slope, fit.r_squared, midpoint_change
            ),
        )
    }
}
