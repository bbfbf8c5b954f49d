//! Engine binary for the closed-loop glider ledger.
//!
//! Loads configuration, seeds the reservoir ledger, runs the capture demo
//! and prints its report, then flies the seal-wear leak campaign on a fresh
//! ledger and prints the summary.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `closedloop-config.yaml` (defaults if absent)
//! 2. Initialize structured logging (tracing)
//! 3. Seed the ledger and run the demo
//! 4. Seed a second ledger and run the campaign
//! 5. Dump the journal at debug level

mod error;

use std::path::Path;

use closedloop_core::config::LedgerConfig;
use closedloop_core::scenario::{self, CampaignSummary};
use closedloop_core::seal::SealWear;
use closedloop_ledger::{BalanceResult, ReservoirLedger, render_report};
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

const CONFIG_PATH: &str = "closedloop-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if the configuration is unreadable, a seed is invalid,
/// or a scenario aborts.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (config, loaded_from_file) = load_config(Path::new(CONFIG_PATH))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    if !loaded_from_file {
        info!(path = CONFIG_PATH, "Config file not found, using defaults");
    }

    info!(
        from_file = loaded_from_file,
        reservoirs = config.ledger.reservoirs.len(),
        trap_efficiency = %config.ledger.trap_efficiency,
        "closedloop-engine starting"
    );

    run_demo(&config)?;
    run_campaign(&config)?;

    info!("closedloop-engine shutdown complete");
    Ok(())
}

/// Load the config file, falling back to defaults when it does not exist.
///
/// Returns the config and whether it came from the file.
fn load_config(config_path: &Path) -> Result<(LedgerConfig, bool), EngineError> {
    if config_path.exists() {
        Ok((LedgerConfig::from_file(config_path)?, true))
    } else {
        Ok((LedgerConfig::default(), false))
    }
}

fn run_demo(config: &LedgerConfig) -> Result<(), EngineError> {
    let mut ledger = scenario::build_ledger(&config.ledger)?;
    let outcome = scenario::run_demo(&mut ledger, &config.demo)?;

    if let Err(err) = &outcome.leak {
        warn!(error = %err, "Demo leak was not compensated");
    }
    if let BalanceResult::Anomaly(anomaly) = &outcome.balance {
        error!(%anomaly, "Demo ledger failed its balance check");
    }

    println!("=== Reservoir report ===");
    println!("{}", render_report(&outcome.report));

    dump_journal(&ledger);
    Ok(())
}

fn run_campaign(config: &LedgerConfig) -> Result<(), EngineError> {
    let mut ledger = scenario::build_ledger(&config.ledger)?;
    let mut seal = SealWear::new(config.seal.clone())?;
    let summary = scenario::run_campaign(&mut ledger, &mut seal, &config.campaign)?;

    println!();
    println!("=== Leak campaign: {} ===", config.campaign.substance);
    print_summary(&summary);
    println!("{}", render_report(&ledger.report()));

    if let BalanceResult::Anomaly(anomaly) = ledger.verify_balance() {
        error!(%anomaly, "Campaign ledger failed its balance check");
    }
    Ok(())
}

fn print_summary(summary: &CampaignSummary) {
    println!("days flown        : {}", summary.days_flown);
    println!("captured          : {} kg", summary.captured.round_dp(4));
    println!("compensated       : {} kg", summary.compensated.round_dp(4));
    println!("refused captures  : {}", summary.refused_captures);
    let condition = summary
        .final_condition
        .checked_mul(Decimal::ONE_HUNDRED)
        .unwrap_or_default();
    println!("seal condition    : {}%", condition.round_dp(1));
    println!("seal critical on  : {}", day_or_never(summary.seal_critical_day));
    println!("stock exhausted on: {}", day_or_never(summary.exhausted_on));
}

fn day_or_never(day: Option<u32>) -> String {
    day.map_or_else(|| "never".to_owned(), |d| format!("day {d}"))
}

fn dump_journal(ledger: &ReservoirLedger) {
    for event in ledger.events() {
        match serde_json::to_string(event) {
            Ok(json) => debug!(event = %json, "journal"),
            Err(err) => warn!(error = %err, "failed to serialize journal event"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let (config, from_file) = load_config(Path::new("no-such-closedloop-config.yaml")).unwrap();
        assert!(!from_file);
        assert_eq!(config, LedgerConfig::default());
    }

    #[test]
    fn project_config_file_is_loaded() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join(CONFIG_PATH);
        let (config, from_file) = load_config(&path).unwrap();
        assert!(from_file);
        assert_eq!(config.ledger.reservoirs.len(), 4);
    }

    #[test]
    fn day_or_never_formats_optional_days() {
        assert_eq!(day_or_never(Some(341)), "day 341");
        assert_eq!(day_or_never(None), "never");
    }
}
