//! The reservoir ledger: a fixed set of reservoirs plus an event journal.
//!
//! The [`ReservoirLedger`] owns every reservoir seeded at construction and
//! is the only place their mass and pressure change. Each mutating call
//! returns the events it produced and appends them to the journal.
//!
//! # Design
//!
//! - **Fixed membership**: reservoirs are seeded once, never added or removed.
//! - **All or nothing**: inputs are validated and every update is planned
//!   before the first reservoir is touched.
//! - **No partial moves**: a capture that would overflow capacity and a
//!   withdrawal larger than stock are both refused whole.
//! - **Precision**: all quantities use [`Decimal`] -- no floating point.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::balance::verify_balance;
use crate::event::{CaptureEvent, CriticalAlert, LeakCompensation, LedgerEvent, LedgerEventKind};
use crate::report::ReservoirStatus;
use crate::reservoir::{Reservoir, ReservoirSeed};
use crate::{BalanceResult, LedgerError};

/// Inflow rates keyed by substance name, in kg per time unit.
pub type FlowRates = BTreeMap<String, Decimal>;

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Accounting for the glider's closed-loop reservoirs.
///
/// The ledger enforces three invariants:
/// 1. `0 <= mass <= capacity` for every reservoir.
/// 2. `pressure > 0` for every reservoir.
/// 3. The journal replays to the current masses (see [`verify_balance`]).
///
/// [`verify_balance`]: ReservoirLedger::verify_balance
#[derive(Debug)]
pub struct ReservoirLedger {
    /// Reservoirs in seed order.
    reservoirs: Vec<Reservoir>,
    /// Substance name to position in `reservoirs`.
    index: BTreeMap<String, usize>,
    /// Fraction of nominal inflow retained during capture.
    trap_efficiency: Decimal,
    /// Every emitted event, in emission order.
    journal: Vec<LedgerEvent>,
}

impl ReservoirLedger {
    /// Build a ledger from an injected seed set.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidTrapEfficiency`] if `trap_efficiency`
    /// is outside `(0, 1]`, [`LedgerError::DuplicateSubstance`] if two seeds
    /// share a name, or [`LedgerError::InvalidSeed`] for a seed that breaks
    /// the reservoir constraints.
    pub fn new(seeds: Vec<ReservoirSeed>, trap_efficiency: Decimal) -> Result<Self, LedgerError> {
        if trap_efficiency <= Decimal::ZERO || trap_efficiency > Decimal::ONE {
            return Err(LedgerError::InvalidTrapEfficiency(trap_efficiency));
        }

        let mut reservoirs = Vec::with_capacity(seeds.len());
        let mut index = BTreeMap::new();

        for seed in seeds {
            if index.contains_key(&seed.name) {
                return Err(LedgerError::DuplicateSubstance(seed.name));
            }
            let reservoir = Reservoir::from_seed(seed)?;
            index.insert(reservoir.name().to_owned(), reservoirs.len());
            reservoirs.push(reservoir);
        }

        debug!(
            reservoir_count = reservoirs.len(),
            trap_efficiency = %trap_efficiency,
            "Reservoir ledger created"
        );

        Ok(Self {
            reservoirs,
            index,
            trap_efficiency,
            journal: Vec::new(),
        })
    }

    /// Trap efficiency applied to every capture.
    pub const fn trap_efficiency(&self) -> Decimal {
        self.trap_efficiency
    }

    /// Look up a reservoir by substance name.
    pub fn reservoir(&self, substance: &str) -> Option<&Reservoir> {
        self.index
            .get(substance)
            .and_then(|&i| self.reservoirs.get(i))
    }

    /// All reservoirs, in seed order.
    pub fn reservoirs(&self) -> &[Reservoir] {
        &self.reservoirs
    }

    /// Capture external inflow into the matching reservoirs.
    ///
    /// For each known substance, `rate * duration * trap_efficiency` kg is
    /// added if it fits under capacity; otherwise the whole increment is
    /// refused and a [`CaptureEvent::ReservoirFull`] is emitted instead.
    /// Substances the ledger does not know are ignored without an event,
    /// whatever their rate.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidDuration`] for a non-positive duration,
    /// [`LedgerError::NegativeQuantity`] for a negative rate on a known
    /// substance, or [`LedgerError::InvalidState`] if the arithmetic cannot
    /// be represented. No reservoir changes when an error is returned.
    pub fn capture(
        &mut self,
        flows: &FlowRates,
        duration: Decimal,
    ) -> Result<Vec<CaptureEvent>, LedgerError> {
        if duration <= Decimal::ZERO {
            return Err(LedgerError::InvalidDuration(duration));
        }

        // Plan every update before touching any reservoir.
        let mut planned: Vec<(usize, CaptureEvent)> = Vec::new();

        for (substance, &rate) in flows {
            let Some((i, reservoir)) = self.locate(substance) else {
                debug!(substance = %substance, "Ignoring flow for unknown substance");
                continue;
            };

            if rate < Decimal::ZERO {
                return Err(LedgerError::NegativeQuantity {
                    substance: substance.clone(),
                    quantity: rate,
                });
            }

            let captured = rate
                .checked_mul(duration)
                .and_then(|q| q.checked_mul(self.trap_efficiency))
                .ok_or_else(|| {
                    LedgerError::InvalidState(format!("arithmetic overflow capturing {substance}"))
                })?;

            let event = match reservoir.plan_capture(captured)? {
                Some((mass, pressure)) => CaptureEvent::Captured {
                    substance: substance.clone(),
                    quantity: captured,
                    mass,
                    pressure,
                },
                None => CaptureEvent::ReservoirFull {
                    substance: substance.clone(),
                    attempted: captured,
                    mass: reservoir.mass(),
                    capacity: reservoir.capacity(),
                },
            };
            planned.push((i, event));
        }

        let mut events = Vec::with_capacity(planned.len());

        for (i, event) in planned {
            match &event {
                CaptureEvent::Captured {
                    substance,
                    quantity,
                    mass,
                    pressure,
                } => {
                    if let Some(reservoir) = self.reservoirs.get_mut(i) {
                        reservoir.apply_capture(*mass, *pressure);
                    }
                    debug!(
                        substance = %substance,
                        captured_kg = %quantity,
                        mass_kg = %mass,
                        pressure_bar = %pressure,
                        "Captured inflow"
                    );
                }
                CaptureEvent::ReservoirFull {
                    substance,
                    attempted,
                    mass,
                    capacity,
                } => {
                    warn!(
                        substance = %substance,
                        attempted_kg = %attempted,
                        mass_kg = %mass,
                        capacity_kg = %capacity,
                        "Reservoir full, capture refused"
                    );
                }
            }
            self.journal
                .push(LedgerEvent::new(LedgerEventKind::Capture(event.clone())));
            events.push(event);
        }

        Ok(events)
    }

    /// Withdraw stored mass to make up for a leak elsewhere in the loop.
    ///
    /// The reservoir's alert threshold is not consulted; the only condition
    /// is `loss <= mass`.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::UnknownSubstance`] for a substance outside the
    /// seed set, [`LedgerError::NegativeQuantity`] for a negative loss, or
    /// [`LedgerError::InsufficientStock`] when the reservoir holds less than
    /// `loss`. The last case also records a [`CriticalAlert`] in the
    /// journal. No reservoir changes when an error is returned.
    pub fn compensate_leak(
        &mut self,
        substance: &str,
        loss: Decimal,
    ) -> Result<LeakCompensation, LedgerError> {
        let Some((i, reservoir)) = self.locate(substance) else {
            return Err(LedgerError::UnknownSubstance(substance.to_owned()));
        };

        if loss < Decimal::ZERO {
            return Err(LedgerError::NegativeQuantity {
                substance: substance.to_owned(),
                quantity: loss,
            });
        }

        let available = reservoir.mass();
        if available < loss {
            error!(
                substance = %substance,
                requested_kg = %loss,
                available_kg = %available,
                "CRITICAL: stock insufficient to compensate leak"
            );
            self.journal
                .push(LedgerEvent::new(LedgerEventKind::CriticalAlert(CriticalAlert {
                    substance: substance.to_owned(),
                    requested: loss,
                    available,
                })));
            return Err(LedgerError::InsufficientStock {
                substance: substance.to_owned(),
                requested: loss,
                available,
            });
        }

        let mass = self
            .reservoirs
            .get_mut(i)
            .ok_or_else(|| LedgerError::InvalidState(format!("{substance} index out of range")))?
            .withdraw(loss)?;

        info!(
            substance = %substance,
            withdrawn_kg = %loss,
            mass_kg = %mass,
            "Leak compensated from stock"
        );

        let compensation = LeakCompensation {
            substance: substance.to_owned(),
            withdrawn: loss,
            mass,
        };
        self.journal.push(LedgerEvent::new(LedgerEventKind::LeakCompensated(
            compensation.clone(),
        )));
        Ok(compensation)
    }

    /// One status row per reservoir, in seed order. Pure read.
    pub fn report(&self) -> Vec<ReservoirStatus> {
        self.reservoirs.iter().map(ReservoirStatus::from_reservoir).collect()
    }

    /// Reservoirs currently below their alert threshold, in seed order.
    ///
    /// Informational only: no other operation reads the threshold.
    pub fn low_stock(&self) -> Vec<&Reservoir> {
        self.reservoirs.iter().filter(|r| r.is_low()).collect()
    }

    /// Replay the journal against the seed masses.
    ///
    /// Returns [`BalanceResult::Balanced`] when every reservoir's current
    /// mass equals its seed mass plus captures minus compensations.
    pub fn verify_balance(&self) -> BalanceResult {
        verify_balance(&self.reservoirs, &self.journal)
    }

    /// All journal events, in emission order.
    pub fn events(&self) -> &[LedgerEvent] {
        &self.journal
    }

    /// Number of journal events.
    pub const fn len(&self) -> usize {
        self.journal.len()
    }

    /// Whether the journal is empty.
    pub const fn is_empty(&self) -> bool {
        self.journal.is_empty()
    }

    fn locate(&self, substance: &str) -> Option<(usize, &Reservoir)> {
        let &i = self.index.get(substance)?;
        self.reservoirs.get(i).map(|r| (i, r))
    }
}
