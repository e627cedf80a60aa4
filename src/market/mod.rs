//! Market state module
//!
//! Per-instrument record types and the sliding-window store that every
//! signal reads from.

mod record;
mod state;

pub use record::{
    MarketRecord, QuoteRecord, RecordError, Side, TradeRecord, MAX_TRADE_COUNT,
};
pub use state::{MarketState, SpreadPoint, TradeFlow};
