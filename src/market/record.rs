//! Market update records
//!
//! Records arrive one per message, already attributed to an instrument.
//! Prices are integer cents on the binary 0-100 scale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trading side of a binary market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// YES contracts
    Yes,
    /// NO contracts
    No,
}

impl Side {
    /// Side holding the larger contract count. Ties resolve to `Yes`.
    pub fn dominant(yes_contracts: u64, no_contracts: u64) -> Self {
        if no_contracts > yes_contracts {
            Side::No
        } else {
            Side::Yes
        }
    }

    /// Sign applied to a magnitude to express conviction on this side
    pub fn sign(self) -> f64 {
        match self {
            Side::Yes => 1.0,
            Side::No => -1.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Side::Yes => "yes",
            Side::No => "no",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A trade execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub instrument: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    /// Taker side
    pub side: Side,
    /// Contracts traded
    pub count: u64,
    /// Price paid on `side`, in cents
    pub price: i64,
}

/// A top-of-book ticker update
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub instrument: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub ts: DateTime<Utc>,
    /// Last traded YES price in cents
    pub price: i64,
    pub yes_bid: i64,
    pub yes_ask: i64,
    /// Cumulative contracts traded
    #[serde(default)]
    pub volume: i64,
    /// Cumulative dollar volume traded
    #[serde(default)]
    pub dollar_volume: i64,
}

impl QuoteRecord {
    /// Ask minus bid, in cents
    pub fn spread(&self) -> i64 {
        self.yes_ask - self.yes_bid
    }

    /// Average of best bid and best ask
    pub fn midpoint(&self) -> f64 {
        (self.yes_bid + self.yes_ask) as f64 / 2.0
    }

    /// Best price to buy `side` at
    pub fn ask_for(&self, side: Side) -> i64 {
        match side {
            Side::Yes => self.yes_ask,
            Side::No => 100 - self.yes_bid,
        }
    }

    /// Best price to sell `side` at
    pub fn bid_for(&self, side: Side) -> i64 {
        match side {
            Side::Yes => self.yes_bid,
            Side::No => 100 - self.yes_ask,
        }
    }
}

/// A single update for one instrument
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MarketRecord {
    Trade(TradeRecord),
    #[serde(alias = "ticker")]
    Quote(QuoteRecord),
}

/// Largest contract count accepted on a single trade
pub const MAX_TRADE_COUNT: u64 = 1_000_000_000;

/// Reasons a record is rejected before reaching the state store
#[derive(Debug, Error)]
pub enum RecordError {
    /// Payload could not be decoded
    #[error("Malformed record: {0}")]
    Parse(#[from] serde_json::Error),
    /// Decoded but violates a field constraint
    #[error("Invalid {field}: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

fn invalid(field: &'static str, reason: impl Into<String>) -> RecordError {
    RecordError::Invalid {
        field,
        reason: reason.into(),
    }
}

impl MarketRecord {
    /// Decode a single JSON message and validate it
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        let record: MarketRecord = serde_json::from_str(raw)?;
        record.validate()?;
        Ok(record)
    }

    pub fn instrument(&self) -> &str {
        match self {
            MarketRecord::Trade(t) => &t.instrument,
            MarketRecord::Quote(q) => &q.instrument,
        }
    }

    pub fn ts(&self) -> DateTime<Utc> {
        match self {
            MarketRecord::Trade(t) => t.ts,
            MarketRecord::Quote(q) => q.ts,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MarketRecord::Trade(_) => "trade",
            MarketRecord::Quote(_) => "quote",
        }
    }

    /// Check field constraints the decoder cannot express
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.instrument().trim().is_empty() {
            return Err(invalid("instrument", "empty"));
        }

        match self {
            MarketRecord::Trade(t) => {
                if t.count == 0 {
                    return Err(invalid("count", "must be positive"));
                }
                if t.count > MAX_TRADE_COUNT {
                    return Err(invalid(
                        "count",
                        format!("{} above {}", t.count, MAX_TRADE_COUNT),
                    ));
                }
                if t.price <= 0 || t.price >= 100 {
                    return Err(invalid("price", format!("{} outside (0, 100)", t.price)));
                }
            }
            MarketRecord::Quote(q) => {
                if !(0..=100).contains(&q.yes_bid) || !(0..=100).contains(&q.yes_ask) {
                    return Err(invalid(
                        "yes_bid/yes_ask",
                        format!("{}/{} outside [0, 100]", q.yes_bid, q.yes_ask),
                    ));
                }
                if q.yes_bid > q.yes_ask {
                    return Err(invalid(
                        "yes_bid/yes_ask",
                        format!("crossed book {}/{}", q.yes_bid, q.yes_ask),
                    ));
                }
                if !(0..=100).contains(&q.price) {
                    return Err(invalid("price", format!("{} outside [0, 100]", q.price)));
                }
                if q.volume < 0 || q.dollar_volume < 0 {
                    return Err(invalid("volume", "negative cumulative volume"));
                }
            }
        }

        Ok(())
    }
}
