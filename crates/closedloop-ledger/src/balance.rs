//! Mass-balance verification for the reservoir ledger.
//!
//! Nothing leaves the loop except through leak compensation and nothing
//! enters except through capture, so each reservoir's mass is fully
//! determined by its seed and the journal:
//!
//! ```text
//! seed_mass(R) + sum(Captured.quantity for R) - sum(LeakCompensated.withdrawn for R) == mass(R)
//! ```
//!
//! `ReservoirFull` and `CriticalAlert` events move no mass and are skipped.
//! The ledger upholds this by construction; the check guards against
//! journal corruption and future bugs.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use crate::event::{CaptureEvent, LedgerEvent, LedgerEventKind};
use crate::reservoir::Reservoir;
use crate::BalanceAnomaly;

/// The result of a mass-balance check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BalanceResult {
    /// Every reservoir replays to its current mass.
    Balanced,
    /// One or more reservoirs do not match their journal.
    Anomaly(BalanceAnomaly),
}

/// Replay `events` on top of the reservoirs' seed masses and compare the
/// result with their current masses.
pub fn verify_balance(reservoirs: &[Reservoir], events: &[LedgerEvent]) -> BalanceResult {
    let mut expected: BTreeMap<&str, Decimal> = reservoirs
        .iter()
        .map(|r| (r.name(), r.seed_mass()))
        .collect();

    for event in events {
        let (substance, delta, inflow) = match &event.kind {
            LedgerEventKind::Capture(CaptureEvent::Captured {
                substance, quantity, ..
            }) => (substance.as_str(), *quantity, true),
            LedgerEventKind::LeakCompensated(c) => (c.substance.as_str(), c.withdrawn, false),
            LedgerEventKind::Capture(CaptureEvent::ReservoirFull { .. })
            | LedgerEventKind::CriticalAlert(_) => continue,
        };

        let Some(total) = expected.get_mut(substance) else {
            return unknown_anomaly(substance);
        };
        let next = if inflow {
            total.checked_add(delta)
        } else {
            total.checked_sub(delta)
        };
        *total = match next {
            Some(v) => v,
            None => return overflow_anomaly(substance),
        };
    }

    let imbalances: BTreeMap<String, (Decimal, Decimal)> = reservoirs
        .iter()
        .filter_map(|r| {
            let want = expected.get(r.name()).copied().unwrap_or(Decimal::ZERO);
            (want != r.mass()).then(|| (r.name().to_owned(), (want, r.mass())))
        })
        .collect();

    if imbalances.is_empty() {
        BalanceResult::Balanced
    } else {
        let count = imbalances.len();
        BalanceResult::Anomaly(BalanceAnomaly {
            imbalances,
            message: format!("MASS_BALANCE_ANOMALY: journal does not match {count} reservoir(s)"),
        })
    }
}

/// Construct an anomaly for arithmetic overflow during replay.
fn overflow_anomaly(substance: &str) -> BalanceResult {
    let mut imbalances = BTreeMap::new();
    imbalances.insert(substance.to_owned(), (Decimal::ZERO, Decimal::ZERO));
    BalanceResult::Anomaly(BalanceAnomaly {
        imbalances,
        message: format!("MASS_BALANCE_ANOMALY: arithmetic overflow while replaying {substance}"),
    })
}

/// Construct an anomaly for a journal event naming no known reservoir.
fn unknown_anomaly(substance: &str) -> BalanceResult {
    let mut imbalances = BTreeMap::new();
    imbalances.insert(substance.to_owned(), (Decimal::ZERO, Decimal::ZERO));
    BalanceResult::Anomaly(BalanceAnomaly {
        imbalances,
        message: format!("MASS_BALANCE_ANOMALY: journal references unknown reservoir {substance}"),
    })
}
