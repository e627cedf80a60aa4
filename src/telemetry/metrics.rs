//! Prometheus metrics
//!
//! Thin enum-keyed wrappers over the `metrics` facade. Nothing is recorded
//! unless a recorder is installed, so these are free in tests.

use crate::risk::CloseReason;

/// Counter metric types
#[derive(Debug, Clone, Copy)]
pub enum CounterMetric {
    /// Valid record ingested
    RecordsProcessed,
    /// Malformed record dropped
    RecordsDropped,
    /// A signal returned a nonzero score
    SignalFired(&'static str),
    /// Composite produced, labelled by the minimum-signal gate
    Composite { actionable: bool },
    /// Position opened
    PositionOpened,
    /// Position closed
    PositionClosed(CloseReason),
}

/// Gauge metric types
#[derive(Debug, Clone, Copy)]
pub enum GaugeMetric {
    /// Portfolio balance
    BalanceUsd,
    /// Drawdown from peak as a percentage of starting balance
    DrawdownPct,
    /// Open position count
    OpenPositions,
    /// 1 while new entries are halted
    Halted,
}

/// Increment a counter by one
pub fn increment(metric: CounterMetric) {
    match metric {
        CounterMetric::RecordsProcessed => {
            metrics::counter!("ssmd_momentum_records_total").increment(1)
        }
        CounterMetric::RecordsDropped => {
            metrics::counter!("ssmd_momentum_records_dropped_total").increment(1)
        }
        CounterMetric::SignalFired(signal) => {
            metrics::counter!("ssmd_momentum_signal_fires_total", "signal" => signal).increment(1)
        }
        CounterMetric::Composite { actionable } => {
            let label = if actionable { "true" } else { "false" };
            metrics::counter!("ssmd_momentum_composites_total", "actionable" => label).increment(1)
        }
        CounterMetric::PositionOpened => {
            metrics::counter!("ssmd_momentum_positions_opened_total").increment(1)
        }
        CounterMetric::PositionClosed(reason) => {
            metrics::counter!("ssmd_momentum_positions_closed_total", "reason" => reason.as_str())
                .increment(1)
        }
    }
}

/// Set a gauge value
pub fn set_gauge(metric: GaugeMetric, value: f64) {
    let metric_name = match metric {
        GaugeMetric::BalanceUsd => "ssmd_momentum_balance_usd",
        GaugeMetric::DrawdownPct => "ssmd_momentum_drawdown_pct",
        GaugeMetric::OpenPositions => "ssmd_momentum_open_positions",
        GaugeMetric::Halted => "ssmd_momentum_halted",
    };

    metrics::gauge!(metric_name).set(value);
}
