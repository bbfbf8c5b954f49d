//! Scenarios driven against a [`ReservoirLedger`].
//!
//! - [`run_demo`]: one capture, one leak compensation, a report and a
//!   balance check. This is the linear walkthrough the engine prints.
//! - [`run_campaign`]: day-by-day flight where inflow is captured each day
//!   and a wearing seal leaks a growing fraction of one reservoir, until the
//!   reservoir can no longer cover the loss or the campaign ends.

use closedloop_ledger::{
    BalanceResult, CaptureEvent, LeakCompensation, LedgerError, ReservoirLedger, ReservoirStatus,
};
use rust_decimal::Decimal;
use tracing::{debug, error, info};

use crate::config::{CampaignConfig, DemoConfig, LedgerSection};
use crate::seal::{SealError, SealWear};

/// Errors that abort a scenario.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The ledger rejected an operation.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    /// The seal model failed.
    #[error("seal error: {0}")]
    Seal(#[from] SealError),

    /// Running totals left the representable range.
    #[error("arithmetic overflow accumulating {0}")]
    Overflow(&'static str),
}

/// Build a ledger from the `ledger` config section.
///
/// # Errors
///
/// Propagates the ledger's seed validation errors.
pub fn build_ledger(section: &LedgerSection) -> Result<ReservoirLedger, LedgerError> {
    ReservoirLedger::new(section.reservoirs.clone(), section.trap_efficiency)
}

/// What the demo did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoOutcome {
    /// Events from the capture step.
    pub capture: Vec<CaptureEvent>,
    /// Leak compensation result. A refused withdrawal does not abort the demo.
    pub leak: Result<LeakCompensation, LedgerError>,
    /// Report rows after both steps.
    pub report: Vec<ReservoirStatus>,
    /// Balance check after both steps.
    pub balance: BalanceResult,
}

/// Capture, compensate one leak, then report.
///
/// # Errors
///
/// Returns [`ScenarioError::Ledger`] if the capture inputs are invalid.
pub fn run_demo(ledger: &mut ReservoirLedger, demo: &DemoConfig) -> Result<DemoOutcome, ScenarioError> {
    info!(
        duration_s = %demo.duration,
        flows = demo.flows.len(),
        "Running capture demo"
    );
    let capture = ledger.capture(&demo.flows, demo.duration)?;
    let leak = ledger.compensate_leak(&demo.leak.substance, demo.leak.amount);

    Ok(DemoOutcome {
        capture,
        leak,
        report: ledger.report(),
        balance: ledger.verify_balance(),
    })
}

/// Totals for a finished campaign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CampaignSummary {
    /// Days completed, including the day stock ran out.
    pub days_flown: u32,
    /// Mass captured across all reservoirs, kg.
    pub captured: Decimal,
    /// Mass withdrawn to cover leaks, kg.
    pub compensated: Decimal,
    /// Captures refused because a reservoir was full.
    pub refused_captures: u32,
    /// Day the seal became critical, if it did.
    pub seal_critical_day: Option<u32>,
    /// Day the leaking reservoir could not cover its loss, if it happened.
    pub exhausted_on: Option<u32>,
    /// Seal condition at the end, `[0, 1]`.
    pub final_condition: Decimal,
}

/// Fly `campaign.days` days.
///
/// Each day the seal cycles once, `daily_inflow` is captured over a unit
/// duration, and the seal's daily loss (leak rate times the reservoir's seed
/// mass) is compensated from the leaking reservoir. The campaign stops early
/// on the first day the reservoir holds less than the loss.
///
/// # Errors
///
/// Returns [`ScenarioError::Ledger`] if the leaking substance is unknown or a
/// capture is rejected, and [`ScenarioError::Seal`] if the seal model fails.
pub fn run_campaign(
    ledger: &mut ReservoirLedger,
    seal: &mut SealWear,
    campaign: &CampaignConfig,
) -> Result<CampaignSummary, ScenarioError> {
    let basis = ledger
        .reservoir(&campaign.substance)
        .map(closedloop_ledger::Reservoir::seed_mass)
        .ok_or_else(|| LedgerError::UnknownSubstance(campaign.substance.clone()))?;

    info!(
        substance = %campaign.substance,
        days = campaign.days,
        basis_kg = %basis,
        "Starting leak campaign"
    );

    let mut summary = CampaignSummary {
        days_flown: 0,
        captured: Decimal::ZERO,
        compensated: Decimal::ZERO,
        refused_captures: 0,
        seal_critical_day: None,
        exhausted_on: None,
        final_condition: seal.condition(),
    };

    for _ in 0..campaign.days {
        let today = seal.advance_day()?;
        summary.days_flown = summary
            .days_flown
            .checked_add(1)
            .ok_or(ScenarioError::Overflow("days"))?;

        for event in ledger.capture(&campaign.daily_inflow, Decimal::ONE)? {
            match event {
                CaptureEvent::Captured { quantity, .. } => {
                    summary.captured = summary
                        .captured
                        .checked_add(quantity)
                        .ok_or(ScenarioError::Overflow("captured mass"))?;
                }
                CaptureEvent::ReservoirFull { .. } => {
                    summary.refused_captures = summary
                        .refused_captures
                        .checked_add(1)
                        .ok_or(ScenarioError::Overflow("refused captures"))?;
                }
            }
        }

        let loss = seal.daily_loss(basis)?;
        match ledger.compensate_leak(&campaign.substance, loss) {
            Ok(compensation) => {
                summary.compensated = summary
                    .compensated
                    .checked_add(compensation.withdrawn)
                    .ok_or(ScenarioError::Overflow("compensated mass"))?;
                debug!(
                    day = today.day,
                    leak_rate = %today.leak_rate.round_dp(6),
                    mass_kg = %compensation.mass,
                    "Campaign day complete"
                );
            }
            Err(LedgerError::InsufficientStock { available, .. }) => {
                error!(
                    day = today.day,
                    substance = %campaign.substance,
                    available_kg = %available,
                    "Reservoir exhausted, ending campaign"
                );
                summary.exhausted_on = Some(today.day);
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }

    summary.seal_critical_day = seal.critical_day();
    summary.final_condition = seal.condition();

    info!(
        days_flown = summary.days_flown,
        captured_kg = %summary.captured.round_dp(4),
        compensated_kg = %summary.compensated.round_dp(4),
        exhausted_on = ?summary.exhausted_on,
        seal_critical_day = ?summary.seal_critical_day,
        "Leak campaign finished"
    );

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use closedloop_ledger::{FlowRates, Reservoir};
    use rust_decimal_macros::dec;

    use super::*;
    use crate::config::{LeakConfig, SealConfig};

    fn ledger() -> ReservoirLedger {
        build_ledger(&LedgerSection::default()).unwrap()
    }

    fn seal() -> SealWear {
        SealWear::new(SealConfig::default()).unwrap()
    }

    fn mass(ledger: &ReservoirLedger, substance: &str) -> Decimal {
        ledger.reservoir(substance).map(Reservoir::mass).unwrap()
    }

    #[test]
    fn demo_with_defaults() {
        let mut ledger = ledger();
        let outcome = run_demo(&mut ledger, &DemoConfig::default()).unwrap();

        // Helium has no reservoir and produces no event.
        assert_eq!(outcome.capture.len(), 2);
        assert!(outcome.capture.iter().all(CaptureEvent::is_captured));
        assert_eq!(outcome.leak.as_ref().map(|l| l.withdrawn), Ok(dec!(0.05)));
        assert_eq!(mass(&ledger, "Argon"), dec!(5.24997));
        // 5.0 + 0.0002 * 60 * 0.9999
        assert_eq!(mass(&ledger, "CO2"), dec!(5.0119988));
        assert_eq!(
            ledger.reservoir("Argon").map(Reservoir::pressure),
            Some(dec!(63.59964))
        );
        assert_eq!(outcome.report.len(), 4);
        assert_eq!(outcome.balance, BalanceResult::Balanced);
    }

    #[test]
    fn demo_keeps_going_after_refused_leak() {
        let mut ledger = ledger();
        let demo = DemoConfig {
            leak: LeakConfig {
                substance: "H2O".to_owned(),
                amount: dec!(3),
            },
            ..DemoConfig::default()
        };
        let outcome = run_demo(&mut ledger, &demo).unwrap();
        assert!(matches!(
            outcome.leak,
            Err(LedgerError::InsufficientStock { .. })
        ));
        assert_eq!(mass(&ledger, "H2O"), dec!(1));
        assert_eq!(outcome.balance, BalanceResult::Balanced);
    }

    #[test]
    fn demo_rejects_zero_duration() {
        let mut ledger = ledger();
        let demo = DemoConfig {
            duration: Decimal::ZERO,
            ..DemoConfig::default()
        };
        assert!(matches!(
            run_demo(&mut ledger, &demo),
            Err(ScenarioError::Ledger(LedgerError::InvalidDuration(_)))
        ));
        assert!(ledger.events().is_empty());
    }

    #[test]
    fn campaign_runs_until_hydrogen_is_exhausted() {
        let mut ledger = ledger();
        let mut seal = seal();
        let summary = run_campaign(&mut ledger, &mut seal, &CampaignConfig::default()).unwrap();

        assert_eq!(summary.seal_critical_day, Some(320));
        assert_eq!(summary.exhausted_on, Some(341));
        assert_eq!(summary.days_flown, 341);
        assert_eq!(summary.refused_captures, 0);
        assert!(summary.final_condition < Decimal::ONE);
        assert_eq!(ledger.verify_balance(), BalanceResult::Balanced);
    }

    #[test]
    fn short_campaign_completes_without_exhaustion() {
        let mut ledger = ledger();
        let mut seal = seal();
        let campaign = CampaignConfig {
            days: 10,
            ..CampaignConfig::default()
        };
        let summary = run_campaign(&mut ledger, &mut seal, &campaign).unwrap();
        assert_eq!(summary.days_flown, 10);
        assert_eq!(summary.exhausted_on, None);
        assert_eq!(summary.seal_critical_day, None);

        // Mass moves only by what was captured and compensated.
        let expected = dec!(2)
            .checked_add(summary.captured)
            .and_then(|m| m.checked_sub(summary.compensated))
            .unwrap();
        assert_eq!(mass(&ledger, "H2"), expected);
    }

    #[test]
    fn full_reservoir_refuses_daily_capture() {
        let mut ledger = ledger();
        let mut seal = seal();
        let mut inflow = FlowRates::new();
        inflow.insert("H2O".to_owned(), dec!(5));
        let campaign = CampaignConfig {
            days: 3,
            daily_inflow: inflow,
            ..CampaignConfig::default()
        };
        let summary = run_campaign(&mut ledger, &mut seal, &campaign).unwrap();
        assert_eq!(summary.days_flown, 3);
        assert_eq!(summary.refused_captures, 3);
        assert_eq!(summary.captured, Decimal::ZERO);
        assert_eq!(mass(&ledger, "H2O"), dec!(1));
    }

    #[test]
    fn campaign_on_unknown_substance_fails() {
        let mut ledger = ledger();
        let mut seal = seal();
        let campaign = CampaignConfig {
            substance: "Xenon".to_owned(),
            ..CampaignConfig::default()
        };
        assert!(matches!(
            run_campaign(&mut ledger, &mut seal, &campaign),
            Err(ScenarioError::Ledger(LedgerError::UnknownSubstance(_)))
        ));
        assert_eq!(seal.day(), 0);
    }
}
