//! Replay command implementation

use std::path::PathBuf;

use clap::Args;

use crate::config::Config;
use crate::engine::{Engine, Evaluation, ShardedEngine};
use crate::feed::{RecordFeed, ReplayFeed};
use crate::risk::SharedPortfolio;

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// JSON Lines file of market records
    #[arg(short, long)]
    pub input: PathBuf,

    /// Evaluate each instrument on its own task
    #[arg(long)]
    pub sharded: bool,

    /// Only print actionable composites and position events
    #[arg(long)]
    pub actionable_only: bool,
}

impl ReplayArgs {
    pub async fn execute(&self, config: Config) -> anyhow::Result<()> {
        let feed = ReplayFeed::new(&self.input).with_capacity(config.engine.channel_capacity);
        let mut records = feed.subscribe().await?;

        let portfolio = if self.sharded {
            let (engine, mut output) = ShardedEngine::new(config);
            let portfolio = engine.portfolio().clone();
            let runner = tokio::spawn(engine.run(records));
            while let Some(evaluation) = output.recv().await {
                self.emit(&evaluation)?;
            }
            runner.await??;
            portfolio
        } else {
            let mut engine = Engine::new(config);
            while let Some(record) = records.recv().await {
                if let Some(evaluation) = engine.process(record) {
                    self.emit(&evaluation)?;
                }
            }
            engine.portfolio().clone()
        };

        report(&portfolio);
        Ok(())
    }

    fn emit(&self, evaluation: &Evaluation) -> anyhow::Result<()> {
        let actionable = evaluation
            .composite
            .as_ref()
            .is_some_and(|c| c.actionable);
        let show = if self.actionable_only {
            actionable || !evaluation.events.is_empty()
        } else {
            evaluation.composite.is_some() || !evaluation.events.is_empty()
        };

        if show {
            println!("{}", serde_json::to_string(evaluation)?);
        }
        Ok(())
    }
}

fn report(portfolio: &SharedPortfolio) {
    match portfolio.snapshot() {
        Some(p) => tracing::info!(
            balance = %p.balance,
            realized_pnl = %p.realized_pnl,
            open_positions = p.open_positions,
            halted = p.halted_for_drawdown,
            "Replay complete"
        ),
        None => tracing::error!("Replay complete, portfolio unavailable"),
    }
}
