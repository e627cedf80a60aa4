//! Evaluation engine
//!
//! Routes records to per-instrument engines. [`Engine`] is the synchronous,
//! single-owner form used by replay and tests; [`ShardedEngine`] runs one
//! task per instrument.

mod instrument;
mod sharded;

pub use instrument::{Evaluation, InstrumentEngine};
pub use sharded::ShardedEngine;

use std::collections::HashMap;
use std::sync::Arc;

use crate::composer::Composer;
use crate::config::Config;
use crate::market::MarketRecord;
use crate::risk::SharedPortfolio;
use crate::telemetry::{increment, CounterMetric};

/// Validate a record, logging and counting it if it is dropped
pub(crate) fn accept(record: &MarketRecord) -> bool {
    match record.validate() {
        Ok(()) => {
            increment(CounterMetric::RecordsProcessed);
            true
        }
        Err(e) => {
            tracing::warn!(
                instrument = record.instrument(),
                kind = record.kind(),
                error = %e,
                "Dropping malformed record"
            );
            increment(CounterMetric::RecordsDropped);
            false
        }
    }
}

/// In-process engine over every instrument seen so far
pub struct Engine {
    config: Config,
    composer: Arc<Composer>,
    portfolio: SharedPortfolio,
    instruments: HashMap<String, InstrumentEngine>,
}

impl Engine {
    pub fn new(config: Config) -> Self {
        let composer = Arc::new(Composer::from_config(&config));
        let portfolio = SharedPortfolio::new(&config.portfolio);
        Self::with_parts(config, composer, portfolio)
    }

    /// Engine over an existing composer and portfolio
    pub fn with_parts(config: Config, composer: Arc<Composer>, portfolio: SharedPortfolio) -> Self {
        Self {
            config,
            composer,
            portfolio,
            instruments: HashMap::new(),
        }
    }

    pub fn portfolio(&self) -> &SharedPortfolio {
        &self.portfolio
    }

    pub fn instrument(&self, instrument: &str) -> Option<&InstrumentEngine> {
        self.instruments.get(instrument)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &InstrumentEngine> {
        self.instruments.values()
    }

    /// Process one record; malformed records are dropped
    pub fn process(&mut self, record: MarketRecord) -> Option<Evaluation> {
        if !accept(&record) {
            return None;
        }

        let instrument = record.instrument().to_string();
        let engine = self.instruments.entry(instrument).or_insert_with_key(|key| {
            tracing::debug!(instrument = %key, "Tracking new instrument");
            InstrumentEngine::new(
                key,
                Arc::clone(&self.composer),
                &self.config,
                self.portfolio.clone(),
            )
        });

        Some(engine.on_record(record))
    }

    /// Decode and process one JSON message
    pub fn process_raw(&mut self, raw: &str) -> Option<Evaluation> {
        match serde_json::from_str::<MarketRecord>(raw) {
            Ok(record) => self.process(record),
            Err(e) => {
                tracing::warn!(error = %e, "Dropping undecodable record");
                increment(CounterMetric::RecordsDropped);
                None
            }
        }
    }
}
