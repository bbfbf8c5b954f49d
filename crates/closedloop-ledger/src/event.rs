//! Structured events emitted by ledger operations.
//!
//! Operations return their events to the caller and also append them to
//! the ledger's journal as [`LedgerEvent`] records. Rendering them for a
//! console or log sink is left to the caller.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of capture for a single substance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CaptureEvent {
    /// The increment was accepted.
    Captured {
        /// Substance name.
        substance: String,
        /// Mass added in kg.
        quantity: Decimal,
        /// Resulting mass in kg.
        mass: Decimal,
        /// Resulting pressure in bar.
        pressure: Decimal,
    },
    /// The increment would have overflowed capacity and was refused whole.
    ReservoirFull {
        /// Substance name.
        substance: String,
        /// Mass that would have been added in kg.
        attempted: Decimal,
        /// Unchanged mass in kg.
        mass: Decimal,
        /// Reservoir capacity in kg.
        capacity: Decimal,
    },
}

impl CaptureEvent {
    /// Substance the event refers to.
    pub fn substance(&self) -> &str {
        match self {
            Self::Captured { substance, .. } | Self::ReservoirFull { substance, .. } => substance,
        }
    }

    /// Whether the increment was accepted.
    pub const fn is_captured(&self) -> bool {
        matches!(self, Self::Captured { .. })
    }
}

/// A successful leak compensation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeakCompensation {
    /// Substance drawn from.
    pub substance: String,
    /// Mass withdrawn in kg.
    pub withdrawn: Decimal,
    /// Remaining mass in kg.
    pub mass: Decimal,
}

/// A leak that could not be covered from stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalAlert {
    /// Substance that ran short.
    pub substance: String,
    /// Requested withdrawal in kg.
    pub requested: Decimal,
    /// Mass available in kg.
    pub available: Decimal,
}

/// The payload of a journal record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEventKind {
    /// Per-substance capture outcome.
    Capture(CaptureEvent),
    /// Stock withdrawn to cover a leak.
    LeakCompensated(LeakCompensation),
    /// Stock was insufficient to cover a leak.
    CriticalAlert(CriticalAlert),
}

/// One record of the append-only ledger journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    /// Unique, time-ordered event identifier.
    pub id: Uuid,
    /// Wall-clock time the event was recorded.
    pub created_at: DateTime<Utc>,
    /// What happened.
    pub kind: LedgerEventKind,
}

impl LedgerEvent {
    /// Stamp a new event with a UUID v7 and the current time.
    pub fn new(kind: LedgerEventKind) -> Self {
        Self {
            id: Uuid::now_v7(),
            created_at: Utc::now(),
            kind,
        }
    }
}
