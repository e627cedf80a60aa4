//! Shared builders for integration tests

use chrono::{DateTime, Duration, Utc};
use ssmd_momentum::config::Config;
use ssmd_momentum::market::{MarketRecord, QuoteRecord, Side, TradeRecord};

pub const INSTRUMENT: &str = "KXBTCD-25DEC31";

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_000_000, 0).unwrap() + Duration::seconds(secs)
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

/// Every signal enabled and the liquidity gate open
pub fn all_signals_config() -> Config {
    let mut config = Config::default();
    config.activation.dollar_volume = 0.0;
    config.signals.trade_concentration.enabled = true;
    config.signals.flow_asymmetry.enabled = true;
    config.signals.spread_velocity.enabled = true;
    config.signals.volume_divergence.enabled = true;
    config.signals.trade_clustering.enabled = true;
    config.signals.trade_imbalance.enabled = true;
    config
}

/// Ten minutes of steady quoting, a quiet tape, then a YES burst while
/// dollar volume jumps and the price holds.
pub fn accumulation_scenario() -> Vec<MarketRecord> {
    let mut records: Vec<MarketRecord> = (0..=8)
        .map(|i| quote(i * 60, 50, 49, 51, i * 1_000))
        .collect();
    records.push(trade(500, Side::Yes, 1, 51));
    records.push(quote(540, 50, 49, 51, 9_000));
    for secs in [560, 562, 564, 566] {
        records.push(trade(secs, Side::Yes, 20, 51));
    }
    records.push(quote(600, 50, 49, 51, 12_000));
    records
}
