//! Configuration types for ssmd-momentum
//!
//! Every section and field has a default, so an empty file is a valid
//! configuration. Unknown keys are rejected rather than ignored, and
//! [`Config::validate`] runs on every load.

use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::telemetry::LogFormat;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value {field}: {reason}")]
    Invalid { field: String, reason: String },
}

fn invalid(field: impl Into<String>, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field: field.into(),
        reason: reason.into(),
    }
}

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Config {
    pub portfolio: PortfolioConfig,
    pub positions: PositionsConfig,
    pub activation: ActivationConfig,
    pub composer: ComposerConfig,
    pub signals: SignalsConfig,
    pub engine: EngineConfig,
    pub telemetry: TelemetryConfig,
}

/// Capital basis and drawdown guard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PortfolioConfig {
    /// Initial capital, also the basis for drawdown percentage
    pub starting_balance: Decimal,
    /// Capital committed per entry
    pub trade_size: Decimal,
    /// Drawdown from peak, as a percent of starting balance, that halts entries
    pub drawdown_halt_percent: Decimal,
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            starting_balance: dec!(500),
            trade_size: dec!(100),
            drawdown_halt_percent: dec!(10),
        }
    }
}

/// Position entry and exit rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct PositionsConfig {
    pub take_profit_cents: i64,
    pub stop_loss_cents: i64,
    pub time_stop_minutes: u64,
    /// Minimum |composite score| that opens a position
    pub entry_threshold: f64,
}

impl Default for PositionsConfig {
    fn default() -> Self {
        Self {
            take_profit_cents: 5,
            stop_loss_cents: 5,
            time_stop_minutes: 15,
            entry_threshold: 0.25,
        }
    }
}

impl PositionsConfig {
    pub fn time_stop(&self) -> Duration {
        Duration::minutes(self.time_stop_minutes as i64)
    }
}

/// Liquidity gate applied before any signal is evaluated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ActivationConfig {
    /// Minimum dollar volume traded over the horizon
    pub dollar_volume: f64,
    /// Trailing horizon for the volume check
    pub window_secs: u64,
}

impl Default for ActivationConfig {
    fn default() -> Self {
        Self {
            dollar_volume: 250_000.0,
            window_secs: 3600,
        }
    }
}

impl ActivationConfig {
    pub fn window(&self) -> Duration {
        Duration::seconds(self.window_secs as i64)
    }
}

/// Signal fusion settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct ComposerConfig {
    /// Contributing signals required before a composite may trigger entry
    pub min_signals: usize,
    /// Weight each signal by `weight * confidence` instead of `weight`
    pub confidence_weighting: bool,
}

impl Default for ComposerConfig {
    fn default() -> Self {
        Self {
            min_signals: 2,
            confidence_weighting: false,
        }
    }
}

/// Per-signal configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SignalsConfig {
    pub trade_concentration: TradeConcentrationConfig,
    pub flow_asymmetry: FlowAsymmetryConfig,
    pub spread_velocity: SpreadVelocityConfig,
    pub volume_divergence: VolumeDivergenceConfig,
    pub trade_clustering: TradeClusteringConfig,
    pub trade_imbalance: TradeImbalanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct TradeConcentrationConfig {
    pub enabled: bool,
    pub weight: f64,
    pub window_secs: u64,
    pub min_trades: usize,
    /// Minimum Herfindahl index before the signal fires
    pub concentration_threshold: f64,
}

impl Default for TradeConcentrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 0.8,
            window_secs: 300,
            min_trades: 5,
            concentration_threshold: 0.15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct FlowAsymmetryConfig {
    pub enabled: bool,
    pub weight: f64,
    pub window_secs: u64,
    pub min_trades: usize,
    /// Minimum gap in cents between YES price and NO-implied YES price
    pub asymmetry_threshold: f64,
}

impl Default for FlowAsymmetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 0.9,
            window_secs: 300,
            min_trades: 5,
            asymmetry_threshold: 2.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct SpreadVelocityConfig {
    pub enabled: bool,
    pub weight: f64,
    pub window_secs: u64,
    pub min_snapshots: usize,
    /// Minimum |slope| of spread in cents per second
    pub velocity_threshold: f64,
}

impl Default for SpreadVelocityConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 0.8,
            window_secs: 300,
            min_snapshots: 5,
            velocity_threshold: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct VolumeDivergenceConfig {
    pub enabled: bool,
    pub weight: f64,
    /// Recent window compared against the baseline
    pub window_secs: u64,
    pub baseline_window_secs: u64,
    /// Recent/baseline volume rate ratio required to fire
    pub volume_multiplier: f64,
    /// Largest price move still treated as flat
    pub max_price_move_cents: f64,
    pub min_trades: usize,
}

impl Default for VolumeDivergenceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 1.0,
            window_secs: 60,
            baseline_window_secs: 600,
            volume_multiplier: 2.0,
            max_price_move_cents: 2.0,
            min_trades: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct TradeClusteringConfig {
    pub enabled: bool,
    pub weight: f64,
    pub window_secs: u64,
    pub min_burst_trades: usize,
    /// Largest gap between trades of the same burst
    pub burst_gap_sec: f64,
    /// Smallest silence before a burst for it to count
    pub quiet_threshold_sec: f64,
}

impl Default for TradeClusteringConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            weight: 0.9,
            window_secs: 120,
            min_burst_trades: 3,
            burst_gap_sec: 5.0,
            quiet_threshold_sec: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct TradeImbalanceConfig {
    pub enabled: bool,
    pub weight: f64,
    pub window_secs: u64,
    pub min_trades: usize,
    /// Minimum |yes - no| / (yes + no) contract imbalance
    pub imbalance_threshold: f64,
}

impl Default for TradeImbalanceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weight: 1.0,
            window_secs: 300,
            min_trades: 5,
            imbalance_threshold: 0.3,
        }
    }
}

/// Runtime settings for the engine shell
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct EngineConfig {
    /// History kept beyond the longest configured window
    pub retention_margin_secs: u64,
    /// Per-instrument queue depth in the sharded runner
    pub channel_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention_margin_secs: 60,
            channel_capacity: 1024,
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_port: None,
        }
    }
}

fn check_weight(field: &str, weight: f64) -> Result<(), ConfigError> {
    if !weight.is_finite() || weight < 0.0 {
        return Err(invalid(field, format!("weight {} must be finite and >= 0", weight)));
    }
    Ok(())
}

fn check_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(field, format!("{} must be finite and >= 0", value)));
    }
    Ok(())
}

/// Longest window or timeout accepted, in seconds (365 days)
pub const MAX_SPAN_SECS: u64 = 365 * 24 * 60 * 60;

fn check_span(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs > MAX_SPAN_SECS {
        return Err(invalid(
            field,
            format!("{}s exceeds the {}s limit", secs, MAX_SPAN_SECS),
        ));
    }
    Ok(())
}

fn check_positive<T: PartialOrd + Default + std::fmt::Display>(
    field: &str,
    value: T,
) -> Result<(), ConfigError> {
    if value <= T::default() {
        return Err(invalid(field, format!("{} must be > 0", value)));
    }
    Ok(())
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.portfolio;
        check_positive("portfolio.startingBalance", p.starting_balance)?;
        check_positive("portfolio.tradeSize", p.trade_size)?;
        if p.drawdown_halt_percent <= Decimal::ZERO || p.drawdown_halt_percent > dec!(100) {
            return Err(invalid(
                "portfolio.drawdownHaltPercent",
                format!("{} outside (0, 100]", p.drawdown_halt_percent),
            ));
        }

        let pos = &self.positions;
        check_positive("positions.takeProfitCents", pos.take_profit_cents)?;
        check_positive("positions.stopLossCents", pos.stop_loss_cents)?;
        check_positive("positions.timeStopMinutes", pos.time_stop_minutes)?;
        check_span(
            "positions.timeStopMinutes",
            pos.time_stop_minutes.saturating_mul(60),
        )?;
        if !(0.0..=1.0).contains(&pos.entry_threshold) {
            return Err(invalid(
                "positions.entryThreshold",
                format!("{} outside [0, 1]", pos.entry_threshold),
            ));
        }

        check_non_negative("activation.dollarVolume", self.activation.dollar_volume)?;
        check_positive("activation.windowSecs", self.activation.window_secs)?;
        check_span("activation.windowSecs", self.activation.window_secs)?;

        check_positive("composer.minSignals", self.composer.min_signals)?;
        check_positive("engine.channelCapacity", self.engine.channel_capacity)?;
        check_span(
            "engine.retentionMarginSecs",
            self.engine.retention_margin_secs,
        )?;

        self.signals.validate()
    }
}

impl SignalsConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let c = &self.trade_concentration;
        check_weight("signals.tradeConcentration.weight", c.weight)?;
        check_positive("signals.tradeConcentration.windowSecs", c.window_secs)?;
        check_span("signals.tradeConcentration.windowSecs", c.window_secs)?;
        check_positive("signals.tradeConcentration.minTrades", c.min_trades)?;
        if !(0.0..=1.0).contains(&c.concentration_threshold) {
            return Err(invalid(
                "signals.tradeConcentration.concentrationThreshold",
                format!("{} outside [0, 1]", c.concentration_threshold),
            ));
        }

        let f = &self.flow_asymmetry;
        check_weight("signals.flowAsymmetry.weight", f.weight)?;
        check_positive("signals.flowAsymmetry.windowSecs", f.window_secs)?;
        check_span("signals.flowAsymmetry.windowSecs", f.window_secs)?;
        check_positive("signals.flowAsymmetry.minTrades", f.min_trades)?;
        check_non_negative("signals.flowAsymmetry.asymmetryThreshold", f.asymmetry_threshold)?;

        let s = &self.spread_velocity;
        check_weight("signals.spreadVelocity.weight", s.weight)?;
        check_positive("signals.spreadVelocity.windowSecs", s.window_secs)?;
        check_span("signals.spreadVelocity.windowSecs", s.window_secs)?;
        if s.min_snapshots < 2 {
            return Err(invalid(
                "signals.spreadVelocity.minSnapshots",
                "a regression needs at least 2 snapshots",
            ));
        }
        check_non_negative("signals.spreadVelocity.velocityThreshold", s.velocity_threshold)?;

        let v = &self.volume_divergence;
        check_weight("signals.volumeDivergence.weight", v.weight)?;
        check_positive("signals.volumeDivergence.windowSecs", v.window_secs)?;
        check_span("signals.volumeDivergence.windowSecs", v.window_secs)?;
        if v.baseline_window_secs < v.window_secs {
            return Err(invalid(
                "signals.volumeDivergence.baselineWindowSecs",
                "must be at least windowSecs",
            ));
        }
        check_span(
            "signals.volumeDivergence.baselineWindowSecs",
            v.baseline_window_secs,
        )?;
        check_positive("signals.volumeDivergence.volumeMultiplier", v.volume_multiplier)?;
        check_positive("signals.volumeDivergence.maxPriceMoveCents", v.max_price_move_cents)?;
        check_positive("signals.volumeDivergence.minTrades", v.min_trades)?;

        let t = &self.trade_clustering;
        check_weight("signals.tradeClustering.weight", t.weight)?;
        check_positive("signals.tradeClustering.windowSecs", t.window_secs)?;
        check_span("signals.tradeClustering.windowSecs", t.window_secs)?;
        check_positive("signals.tradeClustering.minBurstTrades", t.min_burst_trades)?;
        check_non_negative("signals.tradeClustering.burstGapSec", t.burst_gap_sec)?;
        check_non_negative("signals.tradeClustering.quietThresholdSec", t.quiet_threshold_sec)?;
        if t.quiet_threshold_sec <= t.burst_gap_sec {
            return Err(invalid(
                "signals.tradeClustering.quietThresholdSec",
                "must exceed burstGapSec",
            ));
        }

        let i = &self.trade_imbalance;
        check_weight("signals.tradeImbalance.weight", i.weight)?;
        check_positive("signals.tradeImbalance.windowSecs", i.window_secs)?;
        check_span("signals.tradeImbalance.windowSecs", i.window_secs)?;
        check_positive("signals.tradeImbalance.minTrades", i.min_trades)?;
        if !(0.0..=1.0).contains(&i.imbalance_threshold) {
            return Err(invalid(
                "signals.tradeImbalance.imbalanceThreshold",
                format!("{} outside [0, 1]", i.imbalance_threshold),
            ));
        }

        Ok(())
    }
}
