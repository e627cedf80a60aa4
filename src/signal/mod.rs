//! Signal library
//!
//! Independent microstructure signals, each scoring one instrument's market
//! state in [-1, 1] with a confidence in [0, 1].

mod asymmetry;
mod clustering;
mod concentration;
mod divergence;
mod imbalance;
mod spread_velocity;
mod stats;
mod types;

pub use asymmetry::FlowAsymmetry;
pub use clustering::TradeClustering;
pub use concentration::TradeConcentration;
pub use divergence::VolumeDivergence;
pub use imbalance::TradeImbalance;
pub use spread_velocity::SpreadVelocity;
pub use stats::{herfindahl, linear_fit, weighted_mean, LinearFit};
pub use types::{Signal, SignalResult};

use crate::config::SignalsConfig;

/// Instantiate every enabled signal, in a fixed order
pub fn build_signals(config: &SignalsConfig) -> Vec<Box<dyn Signal>> {
    let mut signals: Vec<Box<dyn Signal>> = Vec::new();

    if config.trade_concentration.enabled {
        signals.push(Box::new(TradeConcentration::new(
            config.trade_concentration.clone(),
        )));
    }
    if config.flow_asymmetry.enabled {
        signals.push(Box::new(FlowAsymmetry::new(config.flow_asymmetry.clone())));
    }
    if config.spread_velocity.enabled {
        signals.push(Box::new(SpreadVelocity::new(config.spread_velocity.clone())));
    }
    if config.volume_divergence.enabled {
        signals.push(Box::new(VolumeDivergence::new(
            config.volume_divergence.clone(),
        )));
    }
    if config.trade_clustering.enabled {
        signals.push(Box::new(TradeClustering::new(config.trade_clustering.clone())));
    }
    if config.trade_imbalance.enabled {
        signals.push(Box::new(TradeImbalance::new(config.trade_imbalance.clone())));
    }

    signals
}
