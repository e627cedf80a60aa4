//! Risk management module
//!
//! Per-instrument position lifecycle and the portfolio-wide drawdown halt

mod portfolio;
mod position;
mod types;

pub use portfolio::{HaltReason, Portfolio, SharedPortfolio};
pub use position::{Position, PositionEvent, PositionManager};
pub use types::{CloseReason, PositionStatus, RiskError};
