//! Property tests for signal and composite invariants

use chrono::Duration;
use proptest::prelude::*;
use ssmd_momentum::composer::Composer;
use ssmd_momentum::market::{MarketRecord, MarketState, Side};
use ssmd_momentum::signal::build_signals;

use crate::common::{all_signals_config, quote, trade, INSTRUMENT};

#[derive(Debug, Clone)]
enum Step {
    Trade {
        dt: i64,
        yes: bool,
        count: u64,
        price: i64,
    },
    Quote {
        dt: i64,
        bid: i64,
        spread: i64,
        traded: i64,
    },
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0i64..20, any::<bool>(), 1u64..50, 1i64..100).prop_map(|(dt, yes, count, price)| {
            Step::Trade {
                dt,
                yes,
                count,
                price,
            }
        }),
        (0i64..20, 0i64..95, 0i64..6, 0i64..5_000).prop_map(|(dt, bid, spread, traded)| {
            Step::Quote {
                dt,
                bid,
                spread,
                traded,
            }
        }),
    ]
}

/// Turn steps into time-ordered records with cumulative dollar volume
fn records(steps: &[Step]) -> Vec<MarketRecord> {
    let mut secs = 0;
    let mut dollar_volume = 0;
    steps
        .iter()
        .map(|step| match *step {
            Step::Trade {
                dt,
                yes,
                count,
                price,
            } => {
                secs += dt;
                let side = if yes { Side::Yes } else { Side::No };
                trade(secs, side, count, price)
            }
            Step::Quote {
                dt,
                bid,
                spread,
                traded,
            } => {
                secs += dt;
                dollar_volume += traded;
                quote(secs, bid, bid, bid + spread, dollar_volume)
            }
        })
        .collect()
}

fn state(records: Vec<MarketRecord>) -> MarketState {
    let mut state = MarketState::new(INSTRUMENT, Duration::seconds(3600));
    for record in records {
        state.update(record);
    }
    state
}

proptest! {
    #[test]
    fn signals_stay_in_bounds(steps in prop::collection::vec(step(), 1..120)) {
        let state = state(records(&steps));
        for signal in build_signals(&all_signals_config().signals) {
            let r = signal.evaluate(&state);
            prop_assert!(
                r.score.is_finite() && (-1.0..=1.0).contains(&r.score),
                "{} score {}",
                r.name,
                r.score
            );
            prop_assert!(
                r.confidence.is_finite() && (0.0..=1.0).contains(&r.confidence),
                "{} confidence {}",
                r.name,
                r.confidence
            );
            if r.score == 0.0 {
                prop_assert_eq!(r.confidence, 0.0);
            }
        }
    }

    #[test]
    fn evaluation_is_idempotent(steps in prop::collection::vec(step(), 1..80)) {
        let state = state(records(&steps));
        let composer = Composer::from_config(&all_signals_config());
        prop_assert_eq!(composer.evaluate(&state), composer.evaluate(&state));
    }

    #[test]
    fn too_few_trades_is_no_opinion(
        trades in prop::collection::vec((0i64..5, any::<bool>(), 1u64..50, 1i64..100), 0..3)
    ) {
        let steps: Vec<Step> = trades
            .into_iter()
            .map(|(dt, yes, count, price)| Step::Trade { dt, yes, count, price })
            .collect();
        let state = state(records(&steps));
        for signal in build_signals(&all_signals_config().signals) {
            let r = signal.evaluate(&state);
            prop_assert_eq!(r.score, 0.0, "{} fired on {} trades", r.name, steps.len());
        }
    }

    #[test]
    fn composite_is_convex(
        steps in prop::collection::vec(step(), 1..120),
        confidence_weighting in any::<bool>(),
    ) {
        let mut config = all_signals_config();
        config.composer.confidence_weighting = confidence_weighting;
        let composer = Composer::from_config(&config);

        let Some(composite) = composer.evaluate(&state(records(&steps))) else {
            return Ok(());
        };
        let fired: Vec<f64> = composite
            .details
            .iter()
            .filter(|r| r.fired())
            .map(|r| r.score)
            .collect();

        if composite.contributing_signals == 0 {
            prop_assert_eq!(composite.score, 0.0);
            prop_assert_eq!(composite.confidence, 0.0);
        } else {
            let lo = fired.iter().copied().fold(f64::INFINITY, f64::min);
            let hi = fired.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            prop_assert!(composite.score >= lo - 1e-9 && composite.score <= hi + 1e-9);
        }
        prop_assert_eq!(
            composite.actionable,
            composite.contributing_signals >= config.composer.min_signals
        );
    }
}
