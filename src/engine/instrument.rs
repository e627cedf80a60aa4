//! Single-instrument update, evaluate, decide cycle

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;

use crate::composer::{CompositeResult, Composer};
use crate::config::Config;
use crate::market::{MarketRecord, MarketState};
use crate::risk::{Position, PositionEvent, PositionManager, RiskError, SharedPortfolio};

/// Everything one record produced for its instrument
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub instrument: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    /// `None` when the state is below the liquidity gate
    pub composite: Option<CompositeResult>,
    pub events: Vec<PositionEvent>,
}

/// State, signals and position for one instrument
///
/// Owns no shared state besides the portfolio handle, so instruments can be
/// driven from independent tasks.
pub struct InstrumentEngine {
    state: MarketState,
    composer: Arc<Composer>,
    positions: PositionManager,
}

impl InstrumentEngine {
    pub fn new(
        instrument: &str,
        composer: Arc<Composer>,
        config: &Config,
        portfolio: SharedPortfolio,
    ) -> Self {
        let retention =
            composer.lookback() + Duration::seconds(config.engine.retention_margin_secs as i64);

        Self {
            state: MarketState::new(instrument, retention),
            composer,
            positions: PositionManager::new(
                instrument,
                config.positions.clone(),
                config.portfolio.trade_size,
                portfolio,
            ),
        }
    }

    pub fn state(&self) -> &MarketState {
        &self.state
    }

    pub fn position(&self) -> Option<&Position> {
        self.positions.position()
    }

    /// Ingest one validated record and act on it
    ///
    /// Exits are checked before entries, and an instrument never re-enters on
    /// the record that closed its previous position.
    pub fn on_record(&mut self, record: MarketRecord) -> Evaluation {
        let ts = record.ts();
        self.state.update(record);

        let mut events = Vec::new();
        let closed = self.positions.check_exit(self.state.latest_quote(), ts);
        let just_closed = closed.is_some();
        events.extend(closed);

        let composite = self.composer.evaluate(&self.state);
        if let Some(composite) = composite.as_ref().filter(|_| !just_closed) {
            match self.positions.try_enter(composite, self.state.latest_quote()) {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(RiskError::TradingHalted(reason)) => {
                    tracing::debug!(
                        instrument = self.state.instrument(),
                        reason = ?reason,
                        "Entry blocked by halt"
                    );
                }
                Err(e) => {
                    tracing::debug!(
                        instrument = self.state.instrument(),
                        error = %e,
                        "Entry refused"
                    );
                }
            }
        }

        Evaluation {
            instrument: self.state.instrument().to_string(),
            ts,
            composite,
            events,
        }
    }
}
