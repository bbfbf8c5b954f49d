//! Reservoir seeds and the validated reservoir record.
//!
//! A [`ReservoirSeed`] is the injected configuration for one substance. The
//! ledger turns each seed into a [`Reservoir`] after checking the data-model
//! constraints; from then on only the ledger can change a reservoir's mass
//! and pressure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Initial state of one reservoir, supplied at ledger construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservoirSeed {
    /// Substance name, unique within the ledger.
    pub name: String,
    /// Starting mass in kg.
    pub mass: Decimal,
    /// Fixed capacity in kg. Zero is accepted but makes the reservoir inert.
    pub capacity: Decimal,
    /// Starting pressure in bar.
    pub pressure: Decimal,
    /// Informational low-stock floor in kg.
    pub alert_threshold: Decimal,
}

/// A tracked reservoir.
///
/// Invariants held by the ledger:
/// - `0 <= mass <= capacity`
/// - `pressure > 0`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reservoir {
    name: String,
    mass: Decimal,
    capacity: Decimal,
    pressure: Decimal,
    alert_threshold: Decimal,
    seed_mass: Decimal,
}

impl Reservoir {
    /// Validate a seed and build the reservoir from it.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidSeed`] naming the first violated
    /// constraint.
    pub fn from_seed(seed: ReservoirSeed) -> Result<Self, LedgerError> {
        let reason = if seed.name.trim().is_empty() {
            Some("name must not be empty")
        } else if seed.capacity < Decimal::ZERO {
            Some("capacity must not be negative")
        } else if seed.mass < Decimal::ZERO {
            Some("mass must not be negative")
        } else if seed.mass > seed.capacity {
            Some("mass must not exceed capacity")
        } else if seed.pressure <= Decimal::ZERO {
            Some("pressure must be positive")
        } else if seed.alert_threshold < Decimal::ZERO {
            Some("alert threshold must not be negative")
        } else {
            None
        };

        if let Some(reason) = reason {
            return Err(LedgerError::InvalidSeed {
                substance: seed.name,
                reason,
            });
        }

        Ok(Self {
            name: seed.name,
            mass: seed.mass,
            capacity: seed.capacity,
            pressure: seed.pressure,
            alert_threshold: seed.alert_threshold,
            seed_mass: seed.mass,
        })
    }

    /// Substance name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current mass in kg.
    pub const fn mass(&self) -> Decimal {
        self.mass
    }

    /// Capacity in kg.
    pub const fn capacity(&self) -> Decimal {
        self.capacity
    }

    /// Current pressure in bar.
    pub const fn pressure(&self) -> Decimal {
        self.pressure
    }

    /// Low-stock floor in kg.
    pub const fn alert_threshold(&self) -> Decimal {
        self.alert_threshold
    }

    /// Mass the reservoir was seeded with.
    pub const fn seed_mass(&self) -> Decimal {
        self.seed_mass
    }

    /// Whether the current mass is strictly below the alert threshold.
    pub fn is_low(&self) -> bool {
        self.mass < self.alert_threshold
    }

    /// Compute the post-capture mass and pressure without applying them.
    ///
    /// Returns `Ok(None)` when the increment would overflow capacity.
    /// Pressure scales with `new_mass / old_mass`; an empty reservoir keeps
    /// its seeded pressure on the first accumulation.
    pub(crate) fn plan_capture(
        &self,
        captured: Decimal,
    ) -> Result<Option<(Decimal, Decimal)>, LedgerError> {
        let new_mass = self
            .mass
            .checked_add(captured)
            .ok_or_else(|| overflow(&self.name, "mass addition"))?;

        if new_mass > self.capacity {
            return Ok(None);
        }

        let new_pressure = if self.mass.is_zero() {
            self.pressure
        } else {
            self.pressure
                .checked_mul(new_mass)
                .and_then(|p| p.checked_div(self.mass))
                .ok_or_else(|| overflow(&self.name, "pressure rescale"))?
        };

        if new_pressure <= Decimal::ZERO {
            return Err(LedgerError::InvalidState(format!(
                "{} pressure would drop to {new_pressure} bar",
                self.name
            )));
        }

        Ok(Some((new_mass, new_pressure)))
    }

    pub(crate) const fn apply_capture(&mut self, new_mass: Decimal, new_pressure: Decimal) {
        self.mass = new_mass;
        self.pressure = new_pressure;
    }

    /// Withdraw `amount` kg. The caller has already checked `amount <= mass`.
    pub(crate) fn withdraw(&mut self, amount: Decimal) -> Result<Decimal, LedgerError> {
        self.mass = self
            .mass
            .checked_sub(amount)
            .ok_or_else(|| overflow(&self.name, "mass subtraction"))?;
        Ok(self.mass)
    }
}

fn overflow(substance: &str, what: &str) -> LedgerError {
    LedgerError::InvalidState(format!("arithmetic overflow in {substance} {what}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn seed(mass: Decimal, capacity: Decimal, pressure: Decimal) -> ReservoirSeed {
        ReservoirSeed {
            name: "Argon".to_owned(),
            mass,
            capacity,
            pressure,
            alert_threshold: dec!(1),
        }
    }

    #[test]
    fn valid_seed_builds_reservoir() {
        let r = Reservoir::from_seed(seed(dec!(5), dec!(10), dec!(60))).unwrap();
        assert_eq!(r.seed_mass(), dec!(5));
        assert_eq!(r.mass(), dec!(5));
        assert_eq!(r.pressure(), dec!(60));
    }

    #[test]
    fn mass_above_capacity_rejected() {
        let r = Reservoir::from_seed(seed(dec!(11), dec!(10), dec!(60)));
        assert!(matches!(
            r,
            Err(LedgerError::InvalidSeed {
                reason: "mass must not exceed capacity",
                ..
            })
        ));
    }

    #[test]
    fn non_positive_pressure_rejected() {
        let r = Reservoir::from_seed(seed(dec!(5), dec!(10), dec!(0)));
        assert!(matches!(r, Err(LedgerError::InvalidSeed { .. })));
    }

    #[test]
    fn empty_name_rejected() {
        let mut s = seed(dec!(5), dec!(10), dec!(60));
        s.name = "  ".to_owned();
        assert!(matches!(
            Reservoir::from_seed(s),
            Err(LedgerError::InvalidSeed {
                reason: "name must not be empty",
                ..
            })
        ));
    }

    #[test]
    fn zero_capacity_is_accepted() {
        let r = Reservoir::from_seed(seed(dec!(0), dec!(0), dec!(1)));
        assert!(r.is_ok());
    }

    #[test]
    fn plan_capture_scales_pressure_by_mass_ratio() {
        let r = Reservoir::from_seed(seed(dec!(5), dec!(10), dec!(60))).unwrap();
        assert_eq!(
            r.plan_capture(dec!(0.29997)).unwrap(),
            Some((dec!(5.29997), dec!(63.59964)))
        );
        // Planning leaves the reservoir untouched.
        assert_eq!(r.mass(), dec!(5));
    }

    #[test]
    fn plan_capture_into_empty_reservoir_keeps_pressure() {
        let r = Reservoir::from_seed(seed(dec!(0), dec!(10), dec!(2))).unwrap();
        assert_eq!(r.plan_capture(dec!(1.5)).unwrap(), Some((dec!(1.5), dec!(2))));
    }

    #[test]
    fn plan_capture_over_capacity_is_refused() {
        let r = Reservoir::from_seed(seed(dec!(9.9), dec!(10), dec!(60))).unwrap();
        assert_eq!(r.plan_capture(dec!(0.2)).unwrap(), None);
    }

    #[test]
    fn plan_capture_exactly_to_capacity_is_accepted() {
        let r = Reservoir::from_seed(seed(dec!(9.8), dec!(10), dec!(49))).unwrap();
        assert_eq!(
            r.plan_capture(dec!(0.2)).unwrap(),
            Some((dec!(10.0), dec!(50)))
        );
    }

    #[test]
    fn low_stock_is_strictly_below_threshold() {
        let at = Reservoir::from_seed(seed(dec!(1), dec!(10), dec!(60))).unwrap();
        assert!(!at.is_low());
        let below = Reservoir::from_seed(seed(dec!(0.5), dec!(10), dec!(60))).unwrap();
        assert!(below.is_low());
    }
}
