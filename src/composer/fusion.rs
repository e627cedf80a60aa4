//! Weighted fusion of signal results

use crate::signal::SignalResult;

/// Aggregate of the contributing signals
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fused {
    pub score: f64,
    pub confidence: f64,
    pub contributing: usize,
}

impl Fused {
    const EMPTY: Fused = Fused {
        score: 0.0,
        confidence: 0.0,
        contributing: 0,
    };
}

/// Weighted mean of score and confidence over `(weight, result)` pairs
///
/// Results with a zero score never contribute. With `confidence_weighting`
/// each weight is scaled by the result's confidence, so a signal with zero
/// confidence drops out as well.
pub fn fuse<'a>(
    weighted: impl IntoIterator<Item = (f64, &'a SignalResult)>,
    confidence_weighting: bool,
) -> Fused {
    let mut total_weight = 0.0;
    let mut score_sum = 0.0;
    let mut confidence_sum = 0.0;
    let mut contributing = 0;

    for (weight, result) in weighted {
        if !result.fired() {
            continue;
        }
        let w = if confidence_weighting {
            weight * result.confidence
        } else {
            weight
        };
        if !w.is_finite() || w <= 0.0 {
            continue;
        }

        total_weight += w;
        score_sum += w * result.score;
        confidence_sum += w * result.confidence;
        contributing += 1;
    }

    if contributing == 0 || total_weight <= 0.0 {
        return Fused::EMPTY;
    }

    Fused {
        score: (score_sum / total_weight).clamp(-1.0, 1.0),
        confidence: (confidence_sum / total_weight).clamp(0.0, 1.0),
        contributing,
    }
}
