//! Record builders shared by unit tests

use chrono::{DateTime, Duration, Utc};

use crate::market::{MarketRecord, MarketState, QuoteRecord, Side, TradeRecord};

pub const INSTRUMENT: &str = "KXTEST";

/// Fixed epoch so tests never depend on the wall clock
pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap() + Duration::seconds(secs)
}

pub fn trade(secs: i64, side: Side, count: u64, price: i64) -> MarketRecord {
    MarketRecord::Trade(TradeRecord {
        instrument: INSTRUMENT.to_string(),
        ts: at(secs),
        side,
        count,
        price,
    })
}

pub fn quote(
    secs: i64,
    price: i64,
    yes_bid: i64,
    yes_ask: i64,
    dollar_volume: i64,
) -> MarketRecord {
    MarketRecord::Quote(QuoteRecord {
        instrument: INSTRUMENT.to_string(),
        ts: at(secs),
        price,
        yes_bid,
        yes_ask,
        volume: dollar_volume * 2,
        dollar_volume,
    })
}

/// State with an hour of retention, loaded with `records`
pub fn state_with(records: impl IntoIterator<Item = MarketRecord>) -> MarketState {
    let mut state = MarketState::new(INSTRUMENT, Duration::seconds(3600));
    for record in records {
        state.update(record);
    }
    state
}
