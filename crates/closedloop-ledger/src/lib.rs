//! Reservoir ledger and mass-balance bookkeeping for the closed-loop glider.
//!
//! The glider keeps every working fluid (CO2, hydrogen, water, argon) in a
//! closed loop: nothing is vented, losses are made up from stored stock, and
//! external inflow is trapped into the matching reservoir. This crate is the
//! accounting side of that loop.
//!
//! # Architecture
//!
//! - [`reservoir`] -- [`ReservoirSeed`] and the validated [`Reservoir`].
//! - [`ledger`] -- The [`ReservoirLedger`]: capture, leak compensation, report.
//! - [`event`] -- Structured events appended to the ledger journal.
//! - [`balance`] -- Mass-balance verification replayed from the journal.
//! - [`report`] -- Report rows and fixed-width gauge rendering.
//! - [`shared`] -- [`SharedLedger`], a mutex-guarded ledger for threaded hosts.
//!
//! # Mass Balance
//!
//! For every reservoir R:
//!
//! ```text
//! seed_mass(R) + sum(captured into R) - sum(compensated from R) == mass(R)
//! ```
//!
//! A violation produces a [`BalanceAnomaly`]. The ledger never panics; it
//! returns errors.
//!
//! # Usage
//!
//! ```
//! use std::collections::BTreeMap;
//!
//! use closedloop_ledger::{ReservoirLedger, ReservoirSeed, BalanceResult};
//! use rust_decimal::Decimal;
//!
//! let seeds = vec![ReservoirSeed {
//!     name: "Argon".to_owned(),
//!     mass: Decimal::new(50, 1),
//!     capacity: Decimal::new(100, 1),
//!     pressure: Decimal::new(60, 0),
//!     alert_threshold: Decimal::new(10, 1),
//! }];
//! let mut ledger = ReservoirLedger::new(seeds, Decimal::new(9999, 4)).ok();
//!
//! if let Some(ledger) = ledger.as_mut() {
//!     let mut flows = BTreeMap::new();
//!     flows.insert("Argon".to_owned(), Decimal::new(5, 3));
//!     ledger.capture(&flows, Decimal::new(60, 0)).ok();
//!     ledger.compensate_leak("Argon", Decimal::new(5, 2)).ok();
//!     assert_eq!(ledger.verify_balance(), BalanceResult::Balanced);
//! }
//! ```

pub mod balance;
pub mod event;
pub mod ledger;
pub mod report;
pub mod reservoir;
pub mod shared;

// Re-export primary types at crate root.
pub use balance::BalanceResult;
pub use event::{CaptureEvent, CriticalAlert, LeakCompensation, LedgerEvent, LedgerEventKind};
pub use ledger::{FlowRates, ReservoirLedger};
pub use report::{render_report, ReservoirStatus, GAUGE_WIDTH};
pub use reservoir::{Reservoir, ReservoirSeed};
pub use shared::SharedLedger;

use std::collections::BTreeMap;

use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors returned by ledger operations.
///
/// Every variant is non-fatal for the ledger itself: a failed call leaves
/// all reservoirs exactly as they were before it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// The substance is not part of the ledger's seed set.
    #[error("unknown substance: {0}")]
    UnknownSubstance(String),

    /// A withdrawal asked for more mass than the reservoir holds.
    #[error("insufficient {substance} stock: requested {requested} kg, available {available} kg")]
    InsufficientStock {
        /// The reservoir that was asked to cover the loss.
        substance: String,
        /// Requested withdrawal in kg.
        requested: Decimal,
        /// Mass available at the time of the call in kg.
        available: Decimal,
    },

    /// Arithmetic produced a value the ledger cannot represent.
    #[error("invalid ledger state: {0}")]
    InvalidState(String),

    /// A reservoir seed violates the data model.
    #[error("invalid seed for {substance}: {reason}")]
    InvalidSeed {
        /// The offending seed's name (may be empty).
        substance: String,
        /// Which constraint failed.
        reason: &'static str,
    },

    /// Two seeds share the same substance name.
    #[error("duplicate substance in seed set: {0}")]
    DuplicateSubstance(String),

    /// Trap efficiency must lie in `(0, 1]`.
    #[error("trap efficiency must be in (0, 1], got {0}")]
    InvalidTrapEfficiency(Decimal),

    /// Capture duration must be strictly positive.
    #[error("capture duration must be positive, got {0}")]
    InvalidDuration(Decimal),

    /// A rate or loss amount was negative.
    #[error("quantity for {substance} must not be negative, got {quantity}")]
    NegativeQuantity {
        /// The substance the quantity referred to.
        substance: String,
        /// The invalid quantity.
        quantity: Decimal,
    },

    /// The mutex guarding a [`SharedLedger`] was poisoned.
    #[error("shared ledger lock poisoned: {0}")]
    LockPoisoned(String),
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A mass-balance violation found by [`ReservoirLedger::verify_balance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceAnomaly {
    /// Per-substance (`expected_mass`, `actual_mass`) for every reservoir
    /// that did not balance.
    pub imbalances: BTreeMap<String, (Decimal, Decimal)>,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for BalanceAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}
