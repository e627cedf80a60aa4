//! ssmd-momentum: signal evaluation engine for binary prediction markets
//!
//! This library provides the core components for:
//! - Per-instrument sliding-window market state
//! - Independent microstructure signals
//! - Weighted signal fusion behind liquidity and agreement gates
//! - Position lifecycle with take-profit, stop-loss and time stops
//! - Portfolio drawdown halt
//! - Sequential and per-instrument sharded engines
//! - Replay of captured records
//! - Structured logging and Prometheus metrics

pub mod cli;
pub mod composer;
pub mod config;
pub mod engine;
pub mod feed;
pub mod market;
pub mod risk;
pub mod signal;
pub mod telemetry;

#[cfg(test)]
mod testutil;
