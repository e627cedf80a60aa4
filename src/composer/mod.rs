//! Composer module
//!
//! Gates an instrument on liquidity, runs every enabled signal and fuses the
//! results into one composite.

mod fusion;
mod types;

pub use fusion::{fuse, Fused};
pub use types::CompositeResult;

use chrono::Duration;

use crate::config::{ActivationConfig, ComposerConfig, Config};
use crate::market::MarketState;
use crate::signal::{build_signals, Signal, SignalResult};
use crate::telemetry::{increment, CounterMetric};

/// Combines enabled signals for one evaluation cycle
///
/// Stateless across calls: the same market state always produces the same
/// composite.
pub struct Composer {
    signals: Vec<Box<dyn Signal>>,
    config: ComposerConfig,
    activation: ActivationConfig,
}

impl Composer {
    pub fn new(
        signals: Vec<Box<dyn Signal>>,
        config: ComposerConfig,
        activation: ActivationConfig,
    ) -> Self {
        Self {
            signals,
            config,
            activation,
        }
    }

    /// Composer over the enabled signals of `config`
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            build_signals(&config.signals),
            config.composer.clone(),
            config.activation.clone(),
        )
    }

    pub fn signals(&self) -> &[Box<dyn Signal>] {
        &self.signals
    }

    /// Longest history any signal or the liquidity gate reads
    pub fn lookback(&self) -> Duration {
        self.signals
            .iter()
            .map(|s| s.lookback())
            .fold(self.activation.window(), |longest, w| longest.max(w))
    }

    /// Whether the instrument traded enough dollar volume to be evaluated
    pub fn passes_activation(&self, state: &MarketState) -> bool {
        state.get_dollar_volume(self.activation.window()) >= self.activation.dollar_volume
    }

    /// Evaluate all signals and fuse them
    ///
    /// Returns `None` for an empty state or one below the liquidity gate.
    pub fn evaluate(&self, state: &MarketState) -> Option<CompositeResult> {
        let ts = state.latest_ts()?;
        if !self.passes_activation(state) {
            tracing::trace!(instrument = state.instrument(), "Below liquidity gate");
            return None;
        }

        let details: Vec<SignalResult> = self.signals.iter().map(|s| s.evaluate(state)).collect();
        for result in details.iter().filter(|r| r.fired()) {
            increment(CounterMetric::SignalFired(result.name));
            tracing::debug!(
                instrument = state.instrument(),
                signal = result.name,
                score = result.score,
                confidence = result.confidence,
                reason = %result.reason,
                "Signal fired"
            );
        }

        let fused = fuse(
            self.signals
                .iter()
                .map(|s| s.weight())
                .zip(details.iter()),
            self.config.confidence_weighting,
        );
        let actionable = fused.contributing >= self.config.min_signals;
        increment(CounterMetric::Composite { actionable });

        Some(CompositeResult {
            instrument: state.instrument().to_string(),
            ts,
            score: fused.score,
            confidence: fused.confidence,
            contributing_signals: fused.contributing,
            actionable,
            details,
        })
    }
}
