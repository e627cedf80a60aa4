//! Replay of captured records from a JSON Lines file

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::RecordFeed;
use crate::market::MarketRecord;
use crate::telemetry::{increment, CounterMetric};

/// Feed that reads one JSON record per line
///
/// Blank lines are skipped. Lines that fail to decode or validate are logged
/// and dropped; they never end the replay.
pub struct ReplayFeed {
    path: PathBuf,
    capacity: usize,
}

impl ReplayFeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            capacity: 1024,
        }
    }

    /// Set the channel capacity
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    async fn run_reader(file: File, path: PathBuf, tx: mpsc::Sender<MarketRecord>) {
        let mut lines = BufReader::new(file).lines();
        let mut line_no = 0usize;
        let mut sent = 0usize;

        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(path = %path.display(), error = %e, "Replay read failed");
                    break;
                }
            };
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            match MarketRecord::parse(&line) {
                Ok(record) => {
                    if tx.send(record).await.is_err() {
                        tracing::debug!("Record receiver dropped, stopping replay");
                        return;
                    }
                    sent += 1;
                }
                Err(e) => {
                    tracing::warn!(line = line_no, error = %e, "Skipping malformed record");
                    increment(CounterMetric::RecordsDropped);
                }
            }
        }

        tracing::info!(path = %path.display(), records = sent, lines = line_no, "Replay finished");
    }
}

#[async_trait]
impl RecordFeed for ReplayFeed {
    async fn subscribe(&self) -> anyhow::Result<mpsc::Receiver<MarketRecord>> {
        let file = File::open(&self.path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", self.path.display(), e))?;
        let (tx, rx) = mpsc::channel(self.capacity);

        tracing::info!(path = %self.path.display(), "Replaying records");
        tokio::spawn(Self::run_reader(file, self.path.clone(), tx));

        Ok(rx)
    }
}
