//! Signal types

use chrono::Duration;
use serde::Serialize;

use crate::market::MarketState;

/// Output of one signal evaluation
///
/// A positive score is YES conviction, negative is NO conviction. A score of
/// exactly zero means the signal has no opinion and is never fused.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalResult {
    pub name: &'static str,
    /// Direction and strength, in [-1, 1]
    pub score: f64,
    /// Certainty of the score, in [0, 1]
    pub confidence: f64,
    /// Human-readable explanation
    pub reason: String,
}

impl SignalResult {
    /// Build a result, clamping into range
    ///
    /// Non-finite inputs collapse to zero, and a zero score carries zero
    /// confidence.
    pub fn new(name: &'static str, score: f64, confidence: f64, reason: impl Into<String>) -> Self {
        let score = if score.is_finite() {
            score.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let confidence = if score == 0.0 || !confidence.is_finite() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };

        Self {
            name,
            score,
            confidence,
            reason: reason.into(),
        }
    }

    /// The "no opinion" result
    pub fn none(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            score: 0.0,
            confidence: 0.0,
            reason: reason.into(),
        }
    }

    /// Whether this result expresses an opinion
    pub fn fired(&self) -> bool {
        self.score != 0.0
    }
}

/// A stateless scoring function over one instrument's market state
pub trait Signal: Send + Sync {
    /// Stable identifier used in results, logs and metrics
    fn name(&self) -> &'static str;

    /// Weight in the composite
    fn weight(&self) -> f64;

    /// Longest window this signal reads
    fn lookback(&self) -> Duration;

    /// Score the current state. Must not depend on anything but `state`.
    fn evaluate(&self, state: &MarketState) -> SignalResult;
}
