//! Trade clustering (burst) signal
//!
//! Splits the trade tape into bursts separated by gaps longer than
//! `burstGapSec`. A burst that breaks a quiet period of at least
//! `quietThresholdSec` is treated as urgent, informed flow.

use chrono::Duration;

use super::types::{Signal, SignalResult};
use crate::config::TradeClusteringConfig;
use crate::market::{MarketState, Side, TradeRecord};

pub struct TradeClustering {
    config: TradeClusteringConfig,
}

/// A run of trades with no gap above the burst threshold
#[derive(Debug)]
struct Burst<'a> {
    trades: Vec<&'a TradeRecord>,
    /// Silence before the first trade; unknown when no earlier trade is retained
    quiet_before: Option<f64>,
}

impl Burst<'_> {
    fn duration_secs(&self) -> f64 {
        match (self.trades.first(), self.trades.last()) {
            (Some(first), Some(last)) => seconds_between(first, last),
            _ => 0.0,
        }
    }
}

fn seconds_between(earlier: &TradeRecord, later: &TradeRecord) -> f64 {
    (later.ts - earlier.ts).num_milliseconds() as f64 / 1000.0
}

/// Split `trades` into bursts; `prior` is the last trade before the window
fn segment<'a>(
    prior: Option<&TradeRecord>,
    trades: &[&'a TradeRecord],
    burst_gap_sec: f64,
) -> Vec<Burst<'a>> {
    let mut bursts: Vec<Burst<'a>> = Vec::new();
    let mut previous = prior;

    for &trade in trades {
        let gap = previous.map(|p| seconds_between(p, trade));
        match (gap, bursts.last_mut()) {
            (Some(gap), Some(current)) if gap <= burst_gap_sec => current.trades.push(trade),
            _ => bursts.push(Burst {
                trades: vec![trade],
                quiet_before: gap,
            }),
        }
        previous = Some(trade);
    }

    bursts
}

impl TradeClustering {
    pub const NAME: &'static str = "trade_clustering";

    pub fn new(config: TradeClusteringConfig) -> Self {
        Self { config }
    }

    fn qualifies(&self, burst: &Burst<'_>) -> bool {
        burst.trades.len() >= self.config.min_burst_trades
            && burst
                .quiet_before
                .is_some_and(|quiet| quiet >= self.config.quiet_threshold_sec)
    }
}

impl Signal for TradeClustering {
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
        if trades.len() < self.config.min_burst_trades {
            return SignalResult::none(
                Self::NAME,
                format!("{} trades < {}", trades.len(), self.config.min_burst_trades),
            );
        }

        let prior = state.last_trade_before(self.lookback());
        let bursts = segment(prior, &trades, self.config.burst_gap_sec);
        let Some(burst) = bursts.iter().rev().find(|b| self.qualifies(b)) else {
            return SignalResult::none(Self::NAME, "no burst after a quiet period");
        };

        let (yes, no) = burst
            .trades
            .iter()
            .fold((0u64, 0u64), |(yes, no), t| match t.side {
                Side::Yes => (yes.saturating_add(t.count), no),
                Side::No => (yes, no.saturating_add(t.count)),
            });
        let total = yes.saturating_add(no);
        if total == 0 {
            return SignalResult::none(Self::NAME, "zero volume");
        }

        let side = Side::dominant(yes, no);
        let dominance = yes.max(no) as f64 / total as f64;
        let count = burst.trades.len() as f64;
        let duration = burst.duration_secs();
        let intensity = if duration <= 0.0 {
            1.0
        } else {
            (count / duration).min(1.0)
        };

        let confidence = (count / (2.0 * self.config.min_burst_trades as f64)).min(1.0);

        SignalResult::new(
            Self::NAME,
            side.sign() * dominance * intensity,
            confidence,
            format!(
                "{} trades in {:.1}s after {:.0}s quiet, {} {:.0}% of {} contracts",
                burst.trades.len(),
                duration,
                burst.quiet_before.unwrap_or_default(),
                side,
                dominance * 100.0,
                total
            ),
        )
    }
}
