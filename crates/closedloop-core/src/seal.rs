//! Freeze/thaw wear of reservoir seals.
//!
//! Each day the glider crosses the terminator the tank seals go through one
//! thermal cycle. Fatigue damage per cycle grows with the square of the
//! temperature swing:
//!
//! ```text
//! damage/day = (daily_amplitude / reference_amplitude)^2 / lifetime_days * acceleration
//! ```
//!
//! Seal condition starts at 1 (new) and falls toward 0 (worn). The daily leak
//! fraction grows quadratically with wear, from `initial_leak_rate` for a new
//! seal up to `max_leak_rate` for a worn one:
//!
//! ```text
//! leak = initial * (1 + (1 - condition)^2 * (max / initial - 1))
//! ```
//!
//! The seal is critical once `leak >= critical_leak_rate`.

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::SealConfig;

/// Errors from the seal model.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SealError {
    /// A seal constant is out of range.
    #[error("invalid seal config: {0}")]
    InvalidConfig(&'static str),

    /// Decimal arithmetic left the representable range.
    #[error("arithmetic overflow in seal model")]
    Overflow,
}

/// One simulated day of seal wear.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealDay {
    /// 1-based day number.
    pub day: u32,
    /// Condition after today's cycle, `[0, 1]`.
    pub condition: Decimal,
    /// Daily leak fraction after today's cycle.
    pub leak_rate: Decimal,
    /// Whether the leak fraction has reached the critical rate.
    pub critical: bool,
}

/// Running state of a seal under daily thermal cycling.
#[derive(Debug, Clone)]
pub struct SealWear {
    config: SealConfig,
    damage_per_day: Decimal,
    condition: Decimal,
    day: u32,
    critical_day: Option<u32>,
}

impl SealWear {
    /// A new seal.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::InvalidConfig`] if the lifetime, reference
    /// amplitude or initial leak rate is not positive, if the acceleration
    /// is negative, or if `max_leak_rate < initial_leak_rate`.
    pub fn new(config: SealConfig) -> Result<Self, SealError> {
        if config.lifetime_days <= Decimal::ZERO {
            return Err(SealError::InvalidConfig("lifetime_days must be positive"));
        }
        if config.reference_amplitude_k <= Decimal::ZERO {
            return Err(SealError::InvalidConfig(
                "reference_amplitude_k must be positive",
            ));
        }
        if config.acceleration < Decimal::ZERO {
            return Err(SealError::InvalidConfig("acceleration must not be negative"));
        }
        if config.initial_leak_rate <= Decimal::ZERO {
            return Err(SealError::InvalidConfig("initial_leak_rate must be positive"));
        }
        if config.max_leak_rate < config.initial_leak_rate {
            return Err(SealError::InvalidConfig(
                "max_leak_rate must be at least initial_leak_rate",
            ));
        }

        let ratio = config
            .daily_amplitude_k
            .checked_div(config.reference_amplitude_k)
            .ok_or(SealError::Overflow)?;
        let damage_per_day = ratio
            .checked_mul(ratio)
            .and_then(|r| r.checked_div(config.lifetime_days))
            .and_then(|r| r.checked_mul(config.acceleration))
            .ok_or(SealError::Overflow)?;

        Ok(Self {
            config,
            damage_per_day,
            condition: Decimal::ONE,
            day: 0,
            critical_day: None,
        })
    }

    /// Condition in `[0, 1]`; 1 is new.
    pub const fn condition(&self) -> Decimal {
        self.condition
    }

    /// Days cycled so far.
    pub const fn day(&self) -> u32 {
        self.day
    }

    /// First day the leak fraction reached the critical rate.
    pub const fn critical_day(&self) -> Option<u32> {
        self.critical_day
    }

    /// Fatigue damage accrued per day.
    pub const fn damage_per_day(&self) -> Decimal {
        self.damage_per_day
    }

    /// Current daily leak fraction.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Overflow`] if the arithmetic cannot be represented.
    pub fn leak_rate(&self) -> Result<Decimal, SealError> {
        let wear = Decimal::ONE
            .checked_sub(self.condition)
            .ok_or(SealError::Overflow)?;
        let span = self
            .config
            .max_leak_rate
            .checked_div(self.config.initial_leak_rate)
            .and_then(|r| r.checked_sub(Decimal::ONE))
            .ok_or(SealError::Overflow)?;
        wear.checked_mul(wear)
            .and_then(|w| w.checked_mul(span))
            .and_then(|w| w.checked_add(Decimal::ONE))
            .and_then(|w| w.checked_mul(self.config.initial_leak_rate))
            .ok_or(SealError::Overflow)
    }

    /// Mass lost today from a reservoir holding `basis` kg.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Overflow`] if the arithmetic cannot be represented.
    pub fn daily_loss(&self, basis: Decimal) -> Result<Decimal, SealError> {
        self.leak_rate()?
            .checked_mul(basis)
            .ok_or(SealError::Overflow)
    }

    /// Cycle the seal through one more day.
    ///
    /// # Errors
    ///
    /// Returns [`SealError::Overflow`] if the day counter or the arithmetic
    /// overflows.
    pub fn advance_day(&mut self) -> Result<SealDay, SealError> {
        let day = self.day.checked_add(1).ok_or(SealError::Overflow)?;
        let condition = self
            .condition
            .checked_sub(self.damage_per_day)
            .ok_or(SealError::Overflow)?
            .max(Decimal::ZERO);

        self.day = day;
        self.condition = condition;

        let leak_rate = self.leak_rate()?;
        let critical = leak_rate >= self.config.critical_leak_rate;

        if critical && self.critical_day.is_none() {
            self.critical_day = Some(day);
            warn!(
                day,
                condition = %condition.round_dp(4),
                leak_rate = %leak_rate.round_dp(5),
                "Seal leak rate reached critical level"
            );
        }

        Ok(SealDay {
            day,
            condition,
            leak_rate,
            critical,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn seal() -> SealWear {
        SealWear::new(SealConfig::default()).unwrap()
    }

    #[test]
    fn new_seal_leaks_at_initial_rate() {
        let seal = seal();
        assert_eq!(seal.condition(), Decimal::ONE);
        assert_eq!(seal.leak_rate().unwrap(), dec!(0.001));
        assert_eq!(seal.daily_loss(dec!(2)).unwrap(), dec!(0.002));
    }

    #[test]
    fn worn_seal_leaks_at_max_rate() {
        let config = SealConfig {
            lifetime_days: dec!(1),
            ..SealConfig::default()
        };
        let mut seal = SealWear::new(config).unwrap();
        let day = seal.advance_day().unwrap();
        assert_eq!(day.condition, Decimal::ZERO);
        assert_eq!(seal.leak_rate().unwrap(), dec!(0.1));

        // Condition never goes below zero.
        seal.advance_day().unwrap();
        assert_eq!(seal.condition(), Decimal::ZERO);
    }

    #[test]
    fn reference_swing_reaches_critical_on_day_320() {
        let mut seal = seal();
        let mut first_critical = None;
        for _ in 0..400 {
            let day = seal.advance_day().unwrap();
            if day.critical && first_critical.is_none() {
                first_critical = Some(day.day);
            }
        }
        assert_eq!(first_critical, Some(320));
        assert_eq!(seal.critical_day(), Some(320));
        assert_eq!(seal.day(), 400);
    }

    #[test]
    fn larger_swing_wears_quadratically_faster() {
        let config = SealConfig {
            daily_amplitude_k: dec!(100),
            ..SealConfig::default()
        };
        let fast = SealWear::new(config).unwrap();
        let ratio = fast
            .damage_per_day()
            .checked_div(seal().damage_per_day())
            .unwrap();
        assert_eq!(ratio.round_dp(10), dec!(4));
    }

    #[test]
    fn zero_swing_does_not_wear() {
        let config = SealConfig {
            daily_amplitude_k: Decimal::ZERO,
            ..SealConfig::default()
        };
        let mut seal = SealWear::new(config).unwrap();
        for _ in 0..10 {
            seal.advance_day().unwrap();
        }
        assert_eq!(seal.condition(), Decimal::ONE);
        assert_eq!(seal.critical_day(), None);
    }

    #[test]
    fn invalid_constants_are_rejected() {
        let cases = [
            SealConfig {
                lifetime_days: Decimal::ZERO,
                ..SealConfig::default()
            },
            SealConfig {
                reference_amplitude_k: dec!(-1),
                ..SealConfig::default()
            },
            SealConfig {
                acceleration: dec!(-0.5),
                ..SealConfig::default()
            },
            SealConfig {
                initial_leak_rate: Decimal::ZERO,
                ..SealConfig::default()
            },
            SealConfig {
                max_leak_rate: dec!(0.0001),
                ..SealConfig::default()
            },
        ];
        for config in cases {
            assert!(matches!(
                SealWear::new(config),
                Err(SealError::InvalidConfig(_))
            ));
        }
    }
}
