//! One task per instrument
//!
//! Records are routed by instrument onto bounded channels. Each shard owns
//! its [`InstrumentEngine`] outright; the portfolio is the only state shared
//! between shards.
//!
//! Every channel is bounded, so the evaluation receiver must be drained
//! while records are dispatched. A caller that dispatches everything before
//! reading will stall once the output channel fills.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::{accept, Evaluation, InstrumentEngine};
use crate::composer::Composer;
use crate::config::Config;
use crate::market::MarketRecord;
use crate::risk::SharedPortfolio;

struct Shard {
    tx: mpsc::Sender<MarketRecord>,
    handle: JoinHandle<()>,
}

/// Engine that evaluates instruments concurrently
pub struct ShardedEngine {
    config: Config,
    composer: Arc<Composer>,
    portfolio: SharedPortfolio,
    shards: HashMap<String, Shard>,
    output: mpsc::Sender<Evaluation>,
}

impl ShardedEngine {
    /// Create the engine and the receiver its evaluations are sent to
    ///
    /// Read the receiver from a separate task while dispatching; it closes
    /// once every shard has stopped.
    pub fn new(config: Config) -> (Self, mpsc::Receiver<Evaluation>) {
        let (output, output_rx) = mpsc::channel(config.engine.channel_capacity);
        let composer = Arc::new(Composer::from_config(&config));
        let portfolio = SharedPortfolio::new(&config.portfolio);

        let engine = Self {
            config,
            composer,
            portfolio,
            shards: HashMap::new(),
            output,
        };
        (engine, output_rx)
    }

    pub fn portfolio(&self) -> &SharedPortfolio {
        &self.portfolio
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    fn spawn_shard(&self, instrument: &str) -> Shard {
        let (tx, rx) = mpsc::channel(self.config.engine.channel_capacity);
        let engine = InstrumentEngine::new(
            instrument,
            Arc::clone(&self.composer),
            &self.config,
            self.portfolio.clone(),
        );
        let output = self.output.clone();

        tracing::debug!(instrument, "Spawning instrument shard");
        let handle = tokio::spawn(run_shard(engine, rx, output));
        Shard { tx, handle }
    }

    /// Route one record to its instrument's shard
    ///
    /// Waits while the shard's queue is full. Malformed records are dropped.
    pub async fn dispatch(&mut self, record: MarketRecord) -> anyhow::Result<()> {
        if !accept(&record) {
            return Ok(());
        }

        if !self.shards.contains_key(record.instrument()) {
            let shard = self.spawn_shard(record.instrument());
            self.shards.insert(record.instrument().to_string(), shard);
        }
        let Some(shard) = self.shards.get(record.instrument()) else {
            anyhow::bail!("no shard for {}", record.instrument());
        };

        let instrument = record.instrument().to_string();
        shard
            .tx
            .send(record)
            .await
            .map_err(|_| anyhow::anyhow!("shard for {} stopped", instrument))
    }

    /// Dispatch until `input` closes, then drain every shard
    pub async fn run(mut self, mut input: mpsc::Receiver<MarketRecord>) -> anyhow::Result<()> {
        while let Some(record) = input.recv().await {
            self.dispatch(record).await?;
        }
        self.shutdown().await
    }

    /// Close every shard and wait for queued records to be processed
    ///
    /// All shard queues are closed before any shard is awaited. Returns only
    /// after the evaluation receiver has taken every pending evaluation.
    pub async fn shutdown(self) -> anyhow::Result<()> {
        drop(self.output);
        let handles: Vec<(String, JoinHandle<()>)> = self
            .shards
            .into_iter()
            .map(|(instrument, shard)| (instrument, shard.handle))
            .collect();

        for (instrument, handle) in handles {
            handle.await?;
            tracing::debug!(%instrument, "Shard stopped");
        }
        Ok(())
    }
}

async fn run_shard(
    mut engine: InstrumentEngine,
    mut rx: mpsc::Receiver<MarketRecord>,
    output: mpsc::Sender<Evaluation>,
) {
    while let Some(record) = rx.recv().await {
        let evaluation = engine.on_record(record);
        if output.send(evaluation).await.is_err() {
            tracing::debug!(
                instrument = engine.state().instrument(),
                "Evaluation receiver dropped, stopping shard"
            );
            break;
        }
    }
}
