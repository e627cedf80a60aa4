//! Integration tests for replaying captured records

use std::io::Write;

use ssmd_momentum::config::Config;
use ssmd_momentum::engine::{Engine, Evaluation, ShardedEngine};
use ssmd_momentum::feed::{RecordFeed, ReplayFeed};
use ssmd_momentum::market::MarketRecord;

use crate::common::accumulation_scenario;

fn scenario_config() -> Config {
    let mut config = Config::default();
    config.activation.dollar_volume = 5_000.0;
    config.signals.volume_divergence.enabled = true;
    config.signals.trade_clustering.enabled = true;
    config.signals.trade_imbalance.enabled = false;
    config
}

fn write_capture(records: &[MarketRecord]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for (i, record) in records.iter().enumerate() {
        writeln!(file, "{}", serde_json::to_string(record).unwrap()).unwrap();
        if i == 3 {
            writeln!(
                file,
                r#"{{"kind":"trade","instrument":"","ts":1,"side":"yes","count":1,"price":50}}"#
            )
            .unwrap();
        }
    }
    file
}

/// Evaluations as the replay command prints them
fn to_json_lines(evaluations: &[Evaluation]) -> String {
    evaluations
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn test_record_wire_format() {
    let json = serde_json::to_value(&accumulation_scenario()[0]).unwrap();
    assert_eq!(json["kind"], "quote");
    assert_eq!(json["ts"], 1_735_000_000_000i64);
    assert_eq!(json["yes_bid"], 49);
}

#[tokio::test]
async fn test_replay_feed_into_engine() {
    let capture = write_capture(&accumulation_scenario());
    let mut records = ReplayFeed::new(capture.path()).subscribe().await.unwrap();

    let mut engine = Engine::new(scenario_config());
    let mut processed = 0;
    let mut opened = 0;
    while let Some(record) = records.recv().await {
        let evaluation = engine.process(record).unwrap();
        processed += 1;
        opened += evaluation.events.len();
    }

    assert_eq!(processed, accumulation_scenario().len());
    assert_eq!(opened, 1);
}

#[tokio::test]
async fn test_sharded_replay_matches_sequential() {
    let capture = write_capture(&accumulation_scenario());
    let records = ReplayFeed::new(capture.path()).subscribe().await.unwrap();

    let (engine, mut output) = ShardedEngine::new(scenario_config());
    let runner = tokio::spawn(engine.run(records));

    let mut evaluations = Vec::new();
    while let Some(evaluation) = output.recv().await {
        evaluations.push(evaluation);
    }
    runner.await.unwrap().unwrap();

    let mut sequential = Engine::new(scenario_config());
    let expected: Vec<_> = accumulation_scenario()
        .into_iter()
        .filter_map(|r| sequential.process(r))
        .collect();

    assert_eq!(evaluations.len(), expected.len());
    assert_eq!(to_json_lines(&evaluations), to_json_lines(&expected));
}

#[test]
fn test_replays_serialize_identically() {
    let run = || {
        let mut engine = Engine::new(scenario_config());
        let evaluations: Vec<Evaluation> = accumulation_scenario()
            .into_iter()
            .filter_map(|r| engine.process(r))
            .collect();
        to_json_lines(&evaluations)
    };

    let first = run();
    assert!(first.contains(r#""event":"opened""#));
    assert_eq!(first, run());
}
