//! Position tracking
//!
//! One [`PositionManager`] per instrument drives the Flat -> Open -> Closed
//! lifecycle. Capital and the drawdown halt live in the shared portfolio.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{CloseReason, PositionStatus, RiskError, SharedPortfolio};
use crate::composer::CompositeResult;
use crate::config::PositionsConfig;
use crate::market::{QuoteRecord, Side};
use crate::telemetry::{increment, CounterMetric};

/// Namespace for name-based position ids
const POSITION_NAMESPACE: Uuid = Uuid::from_u128(0x5c1d_0a7e_93b4_4f1e_8a62_d0c4_71e9_b38f);

/// Id derived from the entry, so a replay assigns the same ids
fn position_id(instrument: &str, entry_ts: DateTime<Utc>, seq: u64) -> Uuid {
    let name = format!("{}:{}:{}", instrument, entry_ts.timestamp_millis(), seq);
    Uuid::new_v5(&POSITION_NAMESPACE, name.as_bytes())
}

/// A single position, open or closed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: Uuid,
    pub instrument: String,
    pub side: Side,
    /// Entry price in cents on `side`
    pub entry_price: i64,
    pub entry_ts: DateTime<Utc>,
    /// Capital committed, in dollars
    pub size: Decimal,
    /// size * 100 / entry_price
    pub contracts: Decimal,
    pub status: PositionStatus,
    pub close_reason: Option<CloseReason>,
    pub exit_price: Option<i64>,
    pub exit_ts: Option<DateTime<Utc>>,
    pub realized_pnl: Option<Decimal>,
}

impl Position {
    fn open(
        id: Uuid,
        instrument: &str,
        side: Side,
        entry_price: i64,
        entry_ts: DateTime<Utc>,
        size: Decimal,
    ) -> Self {
        Self {
            id,
            instrument: instrument.to_string(),
            side,
            entry_price,
            entry_ts,
            size,
            contracts: size * dec!(100) / Decimal::from(entry_price),
            status: PositionStatus::Open,
            close_reason: None,
            exit_price: None,
            exit_ts: None,
            realized_pnl: None,
        }
    }

    /// Dollar P&L if closed at `price` cents
    pub fn pnl_at(&self, price: i64) -> Decimal {
        self.contracts * Decimal::from(price - self.entry_price) / dec!(100)
    }

    pub fn is_open(&self) -> bool {
        self.status == PositionStatus::Open
    }

    fn close(&mut self, exit_price: i64, exit_ts: DateTime<Utc>, reason: CloseReason) {
        self.status = PositionStatus::Closed;
        self.close_reason = Some(reason);
        self.exit_price = Some(exit_price);
        self.exit_ts = Some(exit_ts);
        self.realized_pnl = Some(self.pnl_at(exit_price));
    }
}

/// Position lifecycle events for downstream consumers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum PositionEvent {
    Opened {
        position: Position,
    },
    Closed {
        position: Position,
        reason: CloseReason,
    },
}

impl PositionEvent {
    pub fn position(&self) -> &Position {
        match self {
            PositionEvent::Opened { position } | PositionEvent::Closed { position, .. } => position,
        }
    }
}

/// Entry and exit decisions for one instrument
pub struct PositionManager {
    instrument: String,
    config: PositionsConfig,
    trade_size: Decimal,
    portfolio: SharedPortfolio,
    open: Option<Position>,
    /// Entries made so far; part of each position id
    entries: u64,
}

impl PositionManager {
    pub fn new(
        instrument: impl Into<String>,
        config: PositionsConfig,
        trade_size: Decimal,
        portfolio: SharedPortfolio,
    ) -> Self {
        Self {
            instrument: instrument.into(),
            config,
            trade_size,
            portfolio,
            open: None,
            entries: 0,
        }
    }

    /// Currently open position
    pub fn position(&self) -> Option<&Position> {
        self.open.as_ref()
    }

    fn exit_reason(
        &self,
        position: &Position,
        mark: Option<i64>,
        ts: DateTime<Utc>,
    ) -> Option<CloseReason> {
        if let Some(mark) = mark {
            let change = mark - position.entry_price;
            if change >= self.config.take_profit_cents {
                return Some(CloseReason::TakeProfit);
            }
            if -change >= self.config.stop_loss_cents {
                return Some(CloseReason::StopLoss);
            }
        }
        if ts - position.entry_ts > self.config.time_stop() {
            return Some(CloseReason::TimeStop);
        }
        None
    }

    /// Close the open position if an exit condition holds at `ts`
    ///
    /// The mark is the best bid on the held side. Without a quote only the
    /// time stop can fire, and the position exits at its entry price.
    pub fn check_exit(
        &mut self,
        quote: Option<&QuoteRecord>,
        ts: DateTime<Utc>,
    ) -> Option<PositionEvent> {
        let position = self.open.as_ref()?;
        let mark = quote.map(|q| q.bid_for(position.side));
        let reason = self.exit_reason(position, mark, ts)?;
        let exit_price = mark.unwrap_or(position.entry_price);

        let mut position = self.open.take()?;
        position.close(exit_price, ts, reason);
        let pnl = position.realized_pnl.unwrap_or_default();

        if let Some(halt) = self.portfolio.settle(position.size, pnl) {
            tracing::warn!(
                instrument = %self.instrument,
                reason = ?halt,
                "Trading halted, new entries blocked"
            );
        }
        increment(CounterMetric::PositionClosed(reason));
        tracing::info!(
            instrument = %self.instrument,
            side = %position.side,
            entry = position.entry_price,
            exit = exit_price,
            pnl = %pnl,
            reason = %reason,
            "Position closed"
        );

        Some(PositionEvent::Closed { position, reason })
    }

    /// Open a position if the composite calls for one
    ///
    /// `Ok(None)` means the composite did not qualify. Errors are refusals
    /// of a qualifying composite.
    pub fn try_enter(
        &mut self,
        composite: &CompositeResult,
        quote: Option<&QuoteRecord>,
    ) -> Result<Option<PositionEvent>, RiskError> {
        if !composite.actionable || composite.score.abs() < self.config.entry_threshold {
            return Ok(None);
        }
        let Some(side) = composite.direction() else {
            return Ok(None);
        };
        if self.open.is_some() {
            return Err(RiskError::PositionOpen(self.instrument.clone()));
        }

        let quote = quote.ok_or_else(|| RiskError::NoQuote(self.instrument.clone()))?;
        let entry_price = quote.ask_for(side);
        if entry_price <= 0 || entry_price >= 100 {
            return Err(RiskError::InvalidEntryPrice(entry_price));
        }

        self.portfolio.reserve(self.trade_size)?;

        let id = position_id(&self.instrument, composite.ts, self.entries);
        self.entries += 1;
        let position = Position::open(
            id,
            &self.instrument,
            side,
            entry_price,
            composite.ts,
            self.trade_size,
        );
        increment(CounterMetric::PositionOpened);
        tracing::info!(
            instrument = %self.instrument,
            side = %side,
            entry = entry_price,
            score = composite.score,
            confidence = composite.confidence,
            "Position opened"
        );

        self.open = Some(position.clone());
        Ok(Some(PositionEvent::Opened { position }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PortfolioConfig;
    use crate::market::MarketRecord;
    use crate::testutil::{at, quote, INSTRUMENT};

    fn create_test_quote(secs: i64, yes_bid: i64, yes_ask: i64) -> QuoteRecord {
        match quote(secs, (yes_bid + yes_ask) / 2, yes_bid, yes_ask, 0) {
            MarketRecord::Quote(q) => q,
            MarketRecord::Trade(_) => unreachable!(),
        }
    }

    fn create_test_composite(secs: i64, score: f64, actionable: bool) -> CompositeResult {
        CompositeResult {
            instrument: INSTRUMENT.to_string(),
            ts: at(secs),
            score,
            confidence: 0.8,
            contributing_signals: 2,
            actionable,
            details: vec![],
        }
    }

    fn create_manager(portfolio: &SharedPortfolio) -> PositionManager {
        PositionManager::new(
            INSTRUMENT,
            PositionsConfig::default(),
            dec!(100),
            portfolio.clone(),
        )
    }

    fn portfolio() -> SharedPortfolio {
        SharedPortfolio::new(&PortfolioConfig::default())
    }

    /// Manager holding a YES position entered at 50c
    fn open_yes(portfolio: &SharedPortfolio) -> PositionManager {
        let mut manager = create_manager(portfolio);
        let book = create_test_quote(0, 48, 50);
        manager
            .try_enter(&create_test_composite(0, 0.5, true), Some(&book))
            .unwrap();
        manager
    }

    #[test]
    fn test_enter_yes_at_ask() {
        let portfolio = portfolio();
        let manager = open_yes(&portfolio);

        let position = manager.position().unwrap();
        assert_eq!(position.side, Side::Yes);
        assert_eq!(position.entry_price, 50);
        assert_eq!(position.contracts, dec!(200));
        assert_eq!(position.entry_ts, at(0));
        assert!(position.is_open());
        assert_eq!(portfolio.snapshot().unwrap().available(), dec!(400));
    }

    #[test]
    fn test_enter_no_at_complement_of_bid() {
        let mut manager = create_manager(&portfolio());
        let book = create_test_quote(0, 48, 50);
        let event = manager
            .try_enter(&create_test_composite(0, -0.5, true), Some(&book))
            .unwrap()
            .unwrap();
        assert_eq!(event.position().side, Side::No);
        assert_eq!(event.position().entry_price, 52);
    }

    #[test]
    fn test_non_qualifying_composites_ignored() {
        let mut manager = create_manager(&portfolio());
        let book = create_test_quote(0, 48, 50);

        assert!(manager
            .try_enter(&create_test_composite(0, 0.9, false), Some(&book))
            .unwrap()
            .is_none());
        assert!(manager
            .try_enter(&create_test_composite(0, 0.2, true), Some(&book))
            .unwrap()
            .is_none());
        assert!(manager.position().is_none());
    }

    #[test]
    fn test_entry_refusals() {
        let portfolio = portfolio();
        let mut manager = open_yes(&portfolio);
        let book = create_test_quote(1, 48, 50);
        let err = manager
            .try_enter(&create_test_composite(1, 0.5, true), Some(&book))
            .unwrap_err();
        assert!(matches!(err, RiskError::PositionOpen(_)));

        let mut manager = create_manager(&portfolio);
        let err = manager
            .try_enter(&create_test_composite(1, 0.5, true), None)
            .unwrap_err();
        assert!(matches!(err, RiskError::NoQuote(_)));

        let locked = create_test_quote(1, 0, 100);
        let err = manager
            .try_enter(&create_test_composite(1, 0.5, true), Some(&locked))
            .unwrap_err();
        assert!(matches!(err, RiskError::InvalidEntryPrice(100)));
    }

    #[test]
    fn test_take_profit() {
        let portfolio = portfolio();
        let mut manager = open_yes(&portfolio);

        assert!(manager
            .check_exit(Some(&create_test_quote(30, 54, 56)), at(30))
            .is_none());

        let event = manager
            .check_exit(Some(&create_test_quote(60, 55, 57)), at(60))
            .unwrap();
        let PositionEvent::Closed { position, reason } = event else {
            panic!("expected close");
        };
        assert_eq!(reason, CloseReason::TakeProfit);
        assert_eq!(position.exit_price, Some(55));
        assert_eq!(position.realized_pnl, Some(dec!(10)));
        assert_eq!(position.status, PositionStatus::Closed);
        assert!(manager.position().is_none());
        assert_eq!(portfolio.snapshot().unwrap().balance, dec!(510));
    }

    #[test]
    fn test_stop_loss() {
        let portfolio = portfolio();
        let mut manager = open_yes(&portfolio);

        let event = manager
            .check_exit(Some(&create_test_quote(60, 45, 47)), at(60))
            .unwrap();
        let PositionEvent::Closed { position, reason } = event else {
            panic!("expected close");
        };
        assert_eq!(reason, CloseReason::StopLoss);
        assert_eq!(position.realized_pnl, Some(dec!(-10)));
        assert_eq!(portfolio.snapshot().unwrap().balance, dec!(490));
    }

    #[test]
    fn test_time_stop() {
        let mut manager = open_yes(&portfolio());
        let book = create_test_quote(0, 50, 52);

        // exactly 15 minutes old is not past the limit
        assert!(manager.check_exit(Some(&book), at(900)).is_none());
        let ts = at(900) + chrono::Duration::milliseconds(1);
        let event = manager.check_exit(Some(&book), ts).unwrap();
        assert!(matches!(
            event,
            PositionEvent::Closed {
                reason: CloseReason::TimeStop,
                ..
            }
        ));
        assert_eq!(event.position().realized_pnl, Some(dec!(0)));
    }

    #[test]
    fn test_take_profit_beats_time_stop() {
        let mut manager = open_yes(&portfolio());
        let event = manager
            .check_exit(Some(&create_test_quote(2000, 60, 62)), at(2000))
            .unwrap();
        assert!(matches!(
            event,
            PositionEvent::Closed {
                reason: CloseReason::TakeProfit,
                ..
            }
        ));
    }

    #[test]
    fn test_no_position_marked_on_complement() {
        let mut manager = create_manager(&portfolio());
        manager
            .try_enter(
                &create_test_composite(0, -0.5, true),
                Some(&create_test_quote(0, 48, 50)),
            )
            .unwrap();

        // NO bid = 100 - 44 = 56, +4
        assert!(manager
            .check_exit(Some(&create_test_quote(30, 42, 44)), at(30))
            .is_none());
        // NO bid = 100 - 43 = 57, +5
        let event = manager
            .check_exit(Some(&create_test_quote(60, 41, 43)), at(60))
            .unwrap();
        assert!(matches!(
            event,
            PositionEvent::Closed {
                reason: CloseReason::TakeProfit,
                ..
            }
        ));
    }

    #[test]
    fn test_halted_portfolio_still_unwinds() {
        let portfolio = portfolio();
        let mut a = open_yes(&portfolio);
        let mut b = open_yes(&portfolio);

        // gap down through the stop: 200 contracts * -30c = -$60, past 10% of $500
        a.check_exit(Some(&create_test_quote(60, 20, 22)), at(60)).unwrap();
        assert!(portfolio.is_halted());

        let book = create_test_quote(61, 48, 50);
        let err = a
            .try_enter(&create_test_composite(61, 0.5, true), Some(&book))
            .unwrap_err();
        assert!(matches!(err, RiskError::TradingHalted(_)));

        let event = b.check_exit(Some(&create_test_quote(62, 55, 57)), at(62));
        assert!(event.is_some());
        assert_eq!(portfolio.snapshot().unwrap().open_positions, 0);

        portfolio.clear_halt();
        let book = create_test_quote(63, 48, 50);
        assert!(a
            .try_enter(&create_test_composite(63, 0.5, true), Some(&book))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_position_ids_are_reproducible() {
        let entries = |manager: &mut PositionManager| {
            let book = create_test_quote(0, 48, 50);
            let first = manager
                .try_enter(&create_test_composite(0, 0.5, true), Some(&book))
                .unwrap()
                .unwrap();
            manager
                .check_exit(Some(&create_test_quote(60, 55, 57)), at(60))
                .unwrap();
            let book = create_test_quote(61, 48, 50);
            let second = manager
                .try_enter(&create_test_composite(61, 0.5, true), Some(&book))
                .unwrap()
                .unwrap();
            (first.position().id, second.position().id)
        };

        let (a1, a2) = entries(&mut create_manager(&portfolio()));
        let (b1, b2) = entries(&mut create_manager(&portfolio()));
        assert_eq!(a1, b1);
        assert_eq!(a2, b2);
        assert_ne!(a1, a2);
        assert_eq!(a1, position_id(INSTRUMENT, at(0), 0));
    }

    #[test]
    fn test_event_serialization() {
        let mut manager = open_yes(&portfolio());
        let event = manager
            .check_exit(Some(&create_test_quote(60, 55, 57)), at(60))
            .unwrap();
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "closed");
        assert_eq!(json["reason"], "take_profit");
        assert_eq!(json["position"]["side"], "yes");
        assert_eq!(json["position"]["status"], "closed");
        assert_eq!(json["position"]["instrument"], INSTRUMENT);
    }
}
