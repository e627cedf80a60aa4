//! Portfolio accounting and drawdown halt

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};

use super::RiskError;
use crate::config::PortfolioConfig;
use crate::telemetry::{set_gauge, GaugeMetric};

/// Reason for trading halt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HaltReason {
    /// Drawdown from peak exceeded the configured limit
    MaxDrawdownReached(Decimal),
    /// Starting balance is zero or negative, so drawdown is undefined
    InvalidStartingBalance,
    /// Portfolio lock was poisoned by a panicking holder
    LockPoisoned,
}

/// Fleet-wide capital and drawdown state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub starting_balance: Decimal,
    pub balance: Decimal,
    /// Highest balance seen; never decreases
    pub peak_balance: Decimal,
    pub realized_pnl: Decimal,
    pub open_positions: usize,
    /// Capital held by open positions
    pub committed: Decimal,
    pub halted_for_drawdown: bool,
    /// Highest balance since the last cleared halt; the halt trigger measures from here
    pub halt_basis: Decimal,
    /// Halt threshold as a fraction of starting balance
    #[serde(skip)]
    max_drawdown: Decimal,
}

impl Portfolio {
    pub fn new(config: &PortfolioConfig) -> Self {
        Self {
            starting_balance: config.starting_balance,
            balance: config.starting_balance,
            peak_balance: config.starting_balance,
            realized_pnl: dec!(0),
            open_positions: 0,
            committed: dec!(0),
            halted_for_drawdown: false,
            halt_basis: config.starting_balance,
            max_drawdown: config.drawdown_halt_percent / dec!(100),
        }
    }

    /// (peak - balance) / starting balance
    pub fn drawdown(&self) -> Decimal {
        if self.starting_balance <= dec!(0) {
            return dec!(0);
        }
        (self.peak_balance - self.balance) / self.starting_balance
    }

    /// Uncommitted balance
    pub fn available(&self) -> Decimal {
        self.balance - self.committed
    }

    /// (halt basis - balance) / starting balance
    fn drawdown_since_clear(&self) -> Decimal {
        if self.starting_balance <= dec!(0) {
            return dec!(0);
        }
        (self.halt_basis - self.balance) / self.starting_balance
    }

    /// Why new entries are currently blocked, if they are
    pub fn halt_reason(&self) -> Option<HaltReason> {
        if self.starting_balance <= dec!(0) {
            return Some(HaltReason::InvalidStartingBalance);
        }
        if self.halted_for_drawdown {
            return Some(HaltReason::MaxDrawdownReached(self.drawdown()));
        }
        None
    }

    pub fn is_halted(&self) -> bool {
        self.halt_reason().is_some()
    }

    /// Commit `size` to a new position
    pub fn reserve(&mut self, size: Decimal) -> Result<(), RiskError> {
        if let Some(reason) = self.halt_reason() {
            return Err(RiskError::TradingHalted(reason));
        }
        let available = self.available();
        if available < size {
            return Err(RiskError::InsufficientCapital {
                required: size,
                available,
            });
        }

        self.committed += size;
        self.open_positions += 1;
        self.publish();
        Ok(())
    }

    /// Release `size` and book `pnl` from a closed position
    ///
    /// Returns the halt reason when this close trips the drawdown limit.
    pub fn settle(&mut self, size: Decimal, pnl: Decimal) -> Option<HaltReason> {
        self.committed = (self.committed - size).max(dec!(0));
        self.open_positions = self.open_positions.saturating_sub(1);
        self.balance += pnl;
        self.realized_pnl += pnl;
        self.peak_balance = self.peak_balance.max(self.balance);
        self.halt_basis = self.halt_basis.max(self.balance);

        let tripped = !self.halted_for_drawdown && self.drawdown_since_clear() > self.max_drawdown;
        if tripped {
            self.halted_for_drawdown = true;
        }
        self.publish();

        if tripped {
            self.halt_reason()
        } else {
            None
        }
    }

    /// Resume entries after a drawdown halt
    ///
    /// The peak is kept. The next halt measures losses from the balance at
    /// the time of clearing.
    pub fn clear_halt(&mut self) {
        self.halted_for_drawdown = false;
        self.halt_basis = self.balance;
        self.publish();
    }

    fn publish(&self) {
        set_gauge(GaugeMetric::BalanceUsd, self.balance.to_f64().unwrap_or(0.0));
        set_gauge(
            GaugeMetric::DrawdownPct,
            (self.drawdown() * dec!(100)).to_f64().unwrap_or(0.0),
        );
        set_gauge(GaugeMetric::OpenPositions, self.open_positions as f64);
        set_gauge(GaugeMetric::Halted, if self.is_halted() { 1.0 } else { 0.0 });
    }
}

/// Portfolio shared by every instrument
///
/// A poisoned lock is treated as halted.
#[derive(Debug, Clone)]
pub struct SharedPortfolio {
    inner: Arc<Mutex<Portfolio>>,
}

impl SharedPortfolio {
    pub fn new(config: &PortfolioConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Portfolio::new(config))),
        }
    }

    fn lock(&self) -> Option<MutexGuard<'_, Portfolio>> {
        match self.inner.lock() {
            Ok(guard) => Some(guard),
            Err(_) => {
                tracing::error!("Portfolio lock poisoned; treating as halted");
                None
            }
        }
    }

    pub fn reserve(&self, size: Decimal) -> Result<(), RiskError> {
        match self.lock() {
            Some(mut portfolio) => portfolio.reserve(size),
            None => Err(RiskError::TradingHalted(HaltReason::LockPoisoned)),
        }
    }

    pub fn settle(&self, size: Decimal, pnl: Decimal) -> Option<HaltReason> {
        match self.lock() {
            Some(mut portfolio) => portfolio.settle(size, pnl),
            None => Some(HaltReason::LockPoisoned),
        }
    }

    pub fn halt_reason(&self) -> Option<HaltReason> {
        match self.lock() {
            Some(portfolio) => portfolio.halt_reason(),
            None => Some(HaltReason::LockPoisoned),
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halt_reason().is_some()
    }

    pub fn clear_halt(&self) {
        if let Some(mut portfolio) = self.lock() {
            portfolio.clear_halt();
            tracing::info!(balance = %portfolio.balance, "Drawdown halt cleared");
        }
    }

    /// Copy of the current state, or `None` if the lock is poisoned
    pub fn snapshot(&self) -> Option<Portfolio> {
        self.lock().map(|p| p.clone())
    }
}
