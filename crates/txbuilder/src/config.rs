//! Process-wide configuration.
//!
//! A `Config` is built once at startup and shared read-only between requests. Every field has a
//! default, so an empty JSON object is a valid configuration.

use serde::{Deserialize, Serialize};
use sidechain_core::nets::NetParams;

/// Default template time-to-live, in milliseconds. Five minutes.
pub const DEFAULT_TX_TTL_MS: u64 = 5 * 60 * 1000;

/// Default upper bound on the native-asset fee of a submitted transaction.
pub const DEFAULT_MAX_TX_FEE: u64 = 10_000_000_000;

/// Gas pricing constants used by the estimator.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct GasRates {
    /// Gas charged per byte of transaction size
    pub storage_gas_rate: u64,
    /// Fee units charged per unit of gas
    pub vm_gas_rate: u64,
    /// The total fee is rounded up to a multiple of this
    pub base_rate: u64,
}

impl Default for GasRates {
    fn default() -> Self {
        Self {
            storage_gas_rate: 1,
            vm_gas_rate: 200,
            base_rate: 100_000,
        }
    }
}

/// Engine configuration.
#[derive(Serialize, Deserialize, Clone, Debug, Eq, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Time-to-live applied to build requests which do not carry one, in milliseconds
    pub default_ttl_ms: u64,
    /// Gas pricing
    pub gas: GasRates,
    /// Largest native-asset fee the submission gateway will accept
    pub max_tx_fee: u64,
    /// Network parameters
    pub net: NetParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_TX_TTL_MS,
            gas: GasRates::default(),
            max_tx_fee: DEFAULT_MAX_TX_FEE,
            net: NetParams::default(),
        }
    }
}

impl Config {
    /// Parse a configuration from JSON. Absent fields take their defaults.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}
