//! Composer output types

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::market::Side;
use crate::signal::SignalResult;

/// Fused evaluation of one instrument at one point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeResult {
    pub instrument: String,
    /// Timestamp of the record that triggered the evaluation
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    /// Weighted average score over contributing signals, in [-1, 1]
    pub score: f64,
    /// Weighted average confidence over contributing signals, in [0, 1]
    pub confidence: f64,
    /// Signals with a nonzero score and positive effective weight
    pub contributing_signals: usize,
    /// Whether enough signals agreed to act on
    pub actionable: bool,
    /// Every evaluated signal, contributing or not
    pub details: Vec<SignalResult>,
}

impl CompositeResult {
    /// Side the composite leans towards, if any
    pub fn direction(&self) -> Option<Side> {
        if self.score > 0.0 {
            Some(Side::Yes)
        } else if self.score < 0.0 {
            Some(Side::No)
        } else {
            None
        }
    }
}
