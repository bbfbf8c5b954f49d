//! Configuration loading and typed config structures for the closed-loop ledger.
//!
//! The canonical configuration lives in `closedloop-config.yaml` at the
//! project root. Every section and field has a default, so an empty file (or
//! no file at all) yields the reference glider: CO2, H2, H2O and Argon
//! reservoirs with a 0.9999 trap efficiency.

use std::path::Path;

use closedloop_ledger::{FlowRates, ReservoirSeed};
use rust_decimal::Decimal;
use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration.
///
/// Mirrors the structure of `closedloop-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Reservoir seeds and trap efficiency.
    #[serde(default)]
    pub ledger: LedgerSection,

    /// One-shot demo run.
    #[serde(default)]
    pub demo: DemoConfig,

    /// Seal degradation constants.
    #[serde(default)]
    pub seal: SealConfig,

    /// Multi-day leak campaign.
    #[serde(default)]
    pub campaign: CampaignConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl LedgerConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml rejects a fully empty document for a struct.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }
}

/// Reservoir seeds and the uniform trap efficiency.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerSection {
    /// Fraction of nominal inflow retained during capture, `(0, 1]`.
    #[serde(default = "default_trap_efficiency")]
    pub trap_efficiency: Decimal,

    /// Reservoirs tracked by the ledger, in report order.
    #[serde(default = "default_reservoirs")]
    pub reservoirs: Vec<ReservoirSeed>,
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            trap_efficiency: default_trap_efficiency(),
            reservoirs: default_reservoirs(),
        }
    }
}

/// The linear demo run: one capture, one leak, one report.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DemoConfig {
    /// Capture duration in seconds.
    #[serde(default = "default_demo_duration")]
    pub duration: Decimal,

    /// Inflow rates in kg/s.
    #[serde(default = "default_demo_flows")]
    pub flows: FlowRates,

    /// Leak to compensate after the capture.
    #[serde(default)]
    pub leak: LeakConfig,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            duration: default_demo_duration(),
            flows: default_demo_flows(),
            leak: LeakConfig::default(),
        }
    }
}

/// A single leak to compensate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LeakConfig {
    /// Reservoir to draw from.
    #[serde(default = "default_leak_substance")]
    pub substance: String,

    /// Loss to make up, in kg.
    #[serde(default = "default_leak_amount")]
    pub amount: Decimal,
}

impl Default for LeakConfig {
    fn default() -> Self {
        Self {
            substance: default_leak_substance(),
            amount: default_leak_amount(),
        }
    }
}

/// Seal degradation constants (freeze/thaw fatigue of tank seals).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SealConfig {
    /// Days of reference cycling before a new seal is fully worn.
    #[serde(default = "default_lifetime_days")]
    pub lifetime_days: Decimal,

    /// Day/night temperature swing the lifetime was rated at, in K.
    #[serde(default = "default_amplitude_k")]
    pub reference_amplitude_k: Decimal,

    /// Day/night temperature swing actually flown, in K.
    #[serde(default = "default_amplitude_k")]
    pub daily_amplitude_k: Decimal,

    /// Multiplier on damage for harsh conditions.
    #[serde(default = "default_acceleration")]
    pub acceleration: Decimal,

    /// Daily leak fraction of a new seal.
    #[serde(default = "default_initial_leak_rate")]
    pub initial_leak_rate: Decimal,

    /// Daily leak fraction of a fully worn seal.
    #[serde(default = "default_max_leak_rate")]
    pub max_leak_rate: Decimal,

    /// Daily leak fraction at which the seal is flagged critical.
    #[serde(default = "default_critical_leak_rate")]
    pub critical_leak_rate: Decimal,
}

impl Default for SealConfig {
    fn default() -> Self {
        Self {
            lifetime_days: default_lifetime_days(),
            reference_amplitude_k: default_amplitude_k(),
            daily_amplitude_k: default_amplitude_k(),
            acceleration: default_acceleration(),
            initial_leak_rate: default_initial_leak_rate(),
            max_leak_rate: default_max_leak_rate(),
            critical_leak_rate: default_critical_leak_rate(),
        }
    }
}

/// Multi-day campaign: daily capture, seal wear, leak compensation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CampaignConfig {
    /// Reservoir whose seal leaks.
    #[serde(default = "default_campaign_substance")]
    pub substance: String,

    /// Number of days to fly.
    #[serde(default = "default_campaign_days")]
    pub days: u32,

    /// Inflow rates in kg/day, captured once per day.
    #[serde(default = "default_daily_inflow")]
    pub daily_inflow: FlowRates,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            substance: default_campaign_substance(),
            days: default_campaign_days(),
            daily_inflow: default_daily_inflow(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_trap_efficiency() -> Decimal {
    Decimal::from_parts(9999, 0, 0, false, 4)
}

fn seed(name: &str, mass: Decimal, capacity: Decimal, pressure: Decimal, alert: Decimal) -> ReservoirSeed {
    ReservoirSeed {
        name: name.to_owned(),
        mass,
        capacity,
        pressure,
        alert_threshold: alert,
    }
}

/// The reference glider's reservoirs.
pub fn default_reservoirs() -> Vec<ReservoirSeed> {
    vec![
        seed("CO2", Decimal::new(50, 1), Decimal::new(100, 1), Decimal::new(60, 0), Decimal::new(10, 1)),
        seed("H2", Decimal::new(20, 1), Decimal::new(40, 1), Decimal::new(700, 0), Decimal::new(5, 1)),
        seed("H2O", Decimal::new(10, 1), Decimal::new(50, 1), Decimal::new(1, 0), Decimal::new(2, 1)),
        seed("Argon", Decimal::new(50, 1), Decimal::new(100, 1), Decimal::new(60, 0), Decimal::new(10, 1)),
    ]
}

const fn default_demo_duration() -> Decimal {
    Decimal::from_parts(60, 0, 0, false, 0)
}

fn default_demo_flows() -> FlowRates {
    let mut flows = FlowRates::new();
    flows.insert("Argon".to_owned(), Decimal::new(5, 3));
    flows.insert("CO2".to_owned(), Decimal::new(2, 4));
    flows.insert("Helium".to_owned(), Decimal::new(1, 3));
    flows
}

fn default_leak_substance() -> String {
    "Argon".to_owned()
}

const fn default_leak_amount() -> Decimal {
    Decimal::from_parts(5, 0, 0, false, 2)
}

const fn default_lifetime_days() -> Decimal {
    Decimal::from_parts(730, 0, 0, false, 0)
}

const fn default_amplitude_k() -> Decimal {
    Decimal::from_parts(50, 0, 0, false, 0)
}

const fn default_acceleration() -> Decimal {
    Decimal::ONE
}

const fn default_initial_leak_rate() -> Decimal {
    Decimal::from_parts(1, 0, 0, false, 3)
}

const fn default_max_leak_rate() -> Decimal {
    Decimal::from_parts(10, 0, 0, false, 2)
}

const fn default_critical_leak_rate() -> Decimal {
    Decimal::from_parts(2, 0, 0, false, 2)
}

fn default_campaign_substance() -> String {
    "H2".to_owned()
}

const fn default_campaign_days() -> u32 {
    1095
}

fn default_daily_inflow() -> FlowRates {
    let mut flows = FlowRates::new();
    // Solar electrolysis of 100 g water/day at 95 % yield.
    flows.insert("H2".to_owned(), Decimal::new(106, 4));
    flows
}

fn default_log_level() -> String {
    "info".to_owned()
}
