//! Per-instrument sliding-window state
//!
//! Every window query is anchored on the timestamp of the most recently
//! ingested record, so replaying a capture gives the same answers as the
//! live stream did.

use chrono::{DateTime, Duration, Utc};
use std::collections::VecDeque;

use super::record::{MarketRecord, QuoteRecord, Side, TradeRecord};

/// One point of spread history derived from a quote
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadPoint {
    pub ts: DateTime<Utc>,
    /// yes_ask - yes_bid, in cents
    pub spread: f64,
    /// (yes_bid + yes_ask) / 2
    pub midpoint: f64,
}

/// Trade flow summary over a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TradeFlow {
    pub total_trades: usize,
    pub yes_contracts: u64,
    pub no_contracts: u64,
    pub dominant_side: Side,
}

/// Append-only record buffer for one instrument
#[derive(Debug, Clone)]
pub struct MarketState {
    instrument: String,
    records: VecDeque<MarketRecord>,
    retention: Duration,
    latest_ts: Option<DateTime<Utc>>,
}

impl MarketState {
    /// Create an empty state retaining `retention` of history
    pub fn new(instrument: impl Into<String>, retention: Duration) -> Self {
        Self {
            instrument: instrument.into(),
            records: VecDeque::new(),
            retention,
            latest_ts: None,
        }
    }

    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Timestamp of the most recently ingested record
    pub fn latest_ts(&self) -> Option<DateTime<Utc>> {
        self.latest_ts
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    /// Append a record and drop everything older than the retention horizon
    pub fn update(&mut self, record: MarketRecord) {
        let ts = record.ts();
        self.records.push_back(record);
        self.latest_ts = Some(ts);

        let Some(cutoff) = ts.checked_sub_signed(self.retention) else {
            return;
        };
        while let Some(front) = self.records.front() {
            if front.ts() < cutoff {
                self.records.pop_front();
            } else {
                break;
            }
        }
    }

    /// Most recent quote still retained
    pub fn latest_quote(&self) -> Option<&QuoteRecord> {
        self.records.iter().rev().find_map(|r| match r {
            MarketRecord::Quote(q) => Some(q),
            MarketRecord::Trade(_) => None,
        })
    }

    fn window_start(&self, window: Duration) -> Option<DateTime<Utc>> {
        self.latest_ts
            .map(|latest| latest.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC))
    }

    fn in_window(&self, window: Duration) -> impl Iterator<Item = &MarketRecord> {
        let start = self.window_start(window);
        self.records
            .iter()
            .filter(move |r| start.is_some_and(|s| r.ts() >= s))
    }

    fn quotes_in(&self, window: Duration) -> impl Iterator<Item = &QuoteRecord> {
        self.in_window(window).filter_map(|r| match r {
            MarketRecord::Quote(q) => Some(q),
            MarketRecord::Trade(_) => None,
        })
    }

    /// Trades with `ts >= latest - window`, in ingestion order
    pub fn get_recent_trades(&self, window: Duration) -> Vec<&TradeRecord> {
        self.in_window(window)
            .filter_map(|r| match r {
                MarketRecord::Trade(t) => Some(t),
                MarketRecord::Quote(_) => None,
            })
            .collect()
    }

    /// Latest retained trade older than the window, if any
    pub fn last_trade_before(&self, window: Duration) -> Option<&TradeRecord> {
        let start = self.window_start(window)?;
        self.records
            .iter()
            .rev()
            .skip_while(|r| r.ts() >= start)
            .find_map(|r| match r {
                MarketRecord::Trade(t) => Some(t),
                MarketRecord::Quote(_) => None,
            })
    }

    /// Spread and midpoint for every quote in the window
    pub fn get_spread_history(&self, window: Duration) -> Vec<SpreadPoint> {
        self.quotes_in(window)
            .map(|q| SpreadPoint {
                ts: q.ts,
                spread: q.spread() as f64,
                midpoint: q.midpoint(),
            })
            .collect()
    }

    /// Dollar volume traded across the window, from the cumulative counter
    pub fn get_dollar_volume(&self, window: Duration) -> f64 {
        self.dollar_volume_span(window)
            .map(|(volume, _)| volume)
            .unwrap_or(0.0)
    }

    /// Per-minute rate of dollar volume increase over the window
    pub fn get_volume_rate(&self, window: Duration) -> f64 {
        match self.dollar_volume_span(window) {
            Some((volume, minutes)) if minutes > 0.0 => volume / minutes,
            _ => 0.0,
        }
    }

    /// Volume increase and elapsed minutes between first and last quote in window
    fn dollar_volume_span(&self, window: Duration) -> Option<(f64, f64)> {
        let mut quotes = self.quotes_in(window);
        let first = quotes.next()?;
        let last = quotes.last()?;

        // A counter reset upstream reads as no volume rather than negative volume
        let volume = (last.dollar_volume - first.dollar_volume).max(0) as f64;
        let minutes = (last.ts - first.ts).num_milliseconds() as f64 / 60_000.0;
        Some((volume, minutes))
    }

    /// Latest quote price minus the price of the first quote in the window
    pub fn get_price_change(&self, window: Duration) -> f64 {
        let mut quotes = self.quotes_in(window);
        let Some(first) = quotes.next() else {
            return 0.0;
        };
        match quotes.last() {
            Some(last) => (last.price - first.price) as f64,
            None => 0.0,
        }
    }

    /// Trade count and contracts by side over the window
    pub fn get_trade_flow(&self, window: Duration) -> TradeFlow {
        let mut total_trades = 0;
        let mut yes_contracts: u64 = 0;
        let mut no_contracts: u64 = 0;

        for trade in self.get_recent_trades(window) {
            total_trades += 1;
            match trade.side {
                Side::Yes => yes_contracts = yes_contracts.saturating_add(trade.count),
                Side::No => no_contracts = no_contracts.saturating_add(trade.count),
            }
        }

        TradeFlow {
            total_trades,
            yes_contracts,
            no_contracts,
            dominant_side: Side::dominant(yes_contracts, no_contracts),
        }
    }
}
