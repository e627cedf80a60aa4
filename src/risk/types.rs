//! Risk management types

use super::HaltReason;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an entry is refused
#[derive(Debug, Error)]
pub enum RiskError {
    /// Trading has been halted
    #[error("Trading halted: {0:?}")]
    TradingHalted(HaltReason),
    /// Instrument already holds an open position
    #[error("Position already open on {0}")]
    PositionOpen(String),
    /// Not enough uncommitted balance for the trade size
    #[error("Insufficient capital: need {required}, available {available}")]
    InsufficientCapital {
        required: Decimal,
        available: Decimal,
    },
    /// No quote to price the entry against
    #[error("No quote for {0}")]
    NoQuote(String),
    /// Best ask on the signaled side is not tradeable
    #[error("Entry price {0}c outside (0, 100)")]
    InvalidEntryPrice(i64),
}

/// Why a position was closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseReason {
    TakeProfit,
    StopLoss,
    TimeStop,
}

impl CloseReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CloseReason::TakeProfit => "take_profit",
            CloseReason::StopLoss => "stop_loss",
            CloseReason::TimeStop => "time_stop",
        }
    }
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Open,
    Closed,
}
