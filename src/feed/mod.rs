//! Record feed module
//!
//! Sources of market records for the engine

mod replay;

pub use replay::ReplayFeed;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::market::MarketRecord;

/// Trait for record feed implementations
#[async_trait]
pub trait RecordFeed: Send + Sync {
    /// Subscribe to market records
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<MarketRecord>>;
}
