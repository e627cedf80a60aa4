//! End-to-end integration tests

use ssmd_momentum::config::Config;
use ssmd_momentum::engine::Engine;
use ssmd_momentum::market::Side;
use ssmd_momentum::risk::{CloseReason, PositionEvent};
use ssmd_momentum::signal::{TradeClustering, VolumeDivergence};

use crate::common::{accumulation_scenario, quote, trade, INSTRUMENT};

fn scenario_config() -> Config {
    Config::from_toml(
        r#"
        [activation]
        dollarVolume = 5000

        [composer]
        minSignals = 2

        [signals.volumeDivergence]
        enabled = true

        [signals.tradeClustering]
        enabled = true

        [signals.tradeImbalance]
        enabled = false
        "#,
    )
    .unwrap()
}

#[test]
fn test_accumulation_opens_yes_position() {
    let mut engine = Engine::new(scenario_config());
    let mut records = accumulation_scenario();
    let last = records.pop().unwrap();

    for record in records {
        let evaluation = engine.process(record).unwrap();
        assert!(evaluation.events.is_empty());
        if let Some(composite) = evaluation.composite {
            assert!(!composite.actionable);
        }
    }

    let evaluation = engine.process(last).unwrap();
    let composite = evaluation.composite.unwrap();
    assert!(composite.actionable);
    assert_eq!(composite.contributing_signals, 2);
    assert!(composite.score > 0.25);

    let fired: Vec<_> = composite
        .details
        .iter()
        .filter(|r| r.fired())
        .map(|r| r.name)
        .collect();
    assert!(fired.contains(&VolumeDivergence::NAME));
    assert!(fired.contains(&TradeClustering::NAME));

    assert_eq!(evaluation.events.len(), 1);
    let PositionEvent::Opened { position } = &evaluation.events[0] else {
        panic!("expected an open");
    };
    assert_eq!(position.side, Side::Yes);
    assert_eq!(position.entry_price, 51);
    assert_eq!(position.instrument, INSTRUMENT);
}

#[test]
fn test_position_takes_profit_without_reentry() {
    let mut engine = Engine::new(scenario_config());
    for record in accumulation_scenario() {
        engine.process(record);
    }
    assert!(engine.instrument(INSTRUMENT).unwrap().position().is_some());

    let evaluation = engine.process(quote(620, 57, 56, 58, 12_500)).unwrap();
    assert_eq!(evaluation.events.len(), 1);
    assert!(matches!(
        evaluation.events[0],
        PositionEvent::Closed {
            reason: CloseReason::TakeProfit,
            ..
        }
    ));
    assert!(engine.instrument(INSTRUMENT).unwrap().position().is_none());

    let portfolio = engine.portfolio().snapshot().unwrap();
    assert!(portfolio.balance > portfolio.starting_balance);
    assert_eq!(portfolio.open_positions, 0);
}

#[test]
fn test_liquidity_gate_blocks_thin_market() {
    let mut config = scenario_config();
    config.activation.dollar_volume = 250_000.0;
    let mut engine = Engine::new(config);

    for record in accumulation_scenario() {
        let evaluation = engine.process(record).unwrap();
        assert!(evaluation.composite.is_none());
        assert!(evaluation.events.is_empty());
    }
}

#[test]
fn test_single_signal_not_actionable() {
    let mut config = scenario_config();
    config.signals.volume_divergence.enabled = false;
    let mut engine = Engine::new(config);

    for record in accumulation_scenario() {
        let evaluation = engine.process(record).unwrap();
        assert!(evaluation.events.is_empty());
    }
    assert!(engine.instrument(INSTRUMENT).unwrap().position().is_none());
}

#[test]
fn test_stop_loss_trips_drawdown_halt() {
    let mut engine = Engine::new(scenario_config());
    for record in accumulation_scenario() {
        engine.process(record);
    }

    // gap down to a 20c bid: roughly -$61 on a $500 book, past the 10% limit
    let evaluation = engine.process(quote(620, 30, 20, 22, 12_500)).unwrap();
    assert!(matches!(
        evaluation.events[0],
        PositionEvent::Closed {
            reason: CloseReason::StopLoss,
            ..
        }
    ));
    assert!(engine.portfolio().is_halted());

    for secs in [630, 632, 634] {
        let evaluation = engine.process(trade(secs, Side::No, 20, 78)).unwrap();
        assert!(evaluation.events.is_empty());
    }
    assert!(engine.instrument(INSTRUMENT).unwrap().position().is_none());
}

#[test]
fn test_config_rejects_unknown_keys() {
    assert!(Config::from_toml("[composer]\nminSignal = 2\n").is_err());
    assert!(Config::from_toml("[portfolio]\ndrawdownHaltPercent = 0\n").is_err());
}
