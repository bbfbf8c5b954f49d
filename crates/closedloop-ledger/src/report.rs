//! Report rows and their console rendering.
//!
//! [`ReservoirStatus`] is the structured record behind the report; its
//! [`Display`](core::fmt::Display) impl draws one fixed-width gauge line.
//! Nothing here mutates the ledger.

use core::fmt;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::reservoir::Reservoir;

/// Number of cells in the fill gauge.
pub const GAUGE_WIDTH: usize = 20;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;
const FILLED_CELL: char = '█';
const EMPTY_CELL: char = '░';

/// Snapshot of one reservoir for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservoirStatus {
    /// Substance name.
    pub substance: String,
    /// `mass / capacity * 100`; zero when capacity is zero.
    pub fill_percent: Decimal,
    /// Current mass in kg.
    pub mass: Decimal,
    /// Capacity in kg.
    pub capacity: Decimal,
    /// Current pressure in bar.
    pub pressure: Decimal,
    /// Whether mass is below the alert threshold.
    pub low_stock: bool,
}

impl ReservoirStatus {
    /// Snapshot a reservoir.
    pub fn from_reservoir(reservoir: &Reservoir) -> Self {
        Self {
            substance: reservoir.name().to_owned(),
            fill_percent: fill_percent(reservoir.mass(), reservoir.capacity()),
            mass: reservoir.mass(),
            capacity: reservoir.capacity(),
            pressure: reservoir.pressure(),
            low_stock: reservoir.is_low(),
        }
    }

    /// Number of filled gauge cells, `0..=GAUGE_WIDTH`.
    pub fn filled_cells(&self) -> usize {
        self.fill_percent
            .checked_mul(Decimal::from(GAUGE_WIDTH))
            .and_then(|v| v.checked_div(HUNDRED))
            .map(|v| v.floor())
            .and_then(|v| v.to_usize())
            .unwrap_or(0)
            .min(GAUGE_WIDTH)
    }

    /// The fixed-width gauge, e.g. `██████████░░░░░░░░░░`.
    pub fn gauge(&self) -> String {
        let filled = self.filled_cells();
        let mut bar = String::with_capacity(GAUGE_WIDTH.saturating_mul(FILLED_CELL.len_utf8()));
        bar.extend(core::iter::repeat_n(FILLED_CELL, filled));
        bar.extend(core::iter::repeat_n(
            EMPTY_CELL,
            GAUGE_WIDTH.saturating_sub(filled),
        ));
        bar
    }
}

impl fmt::Display for ReservoirStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:<8} [{}] {:>6}% | {:>8} kg | {:>7} bar",
            self.substance,
            self.gauge(),
            self.fill_percent.round_dp(1).to_string(),
            self.mass.round_dp(3).to_string(),
            self.pressure.round_dp(1).to_string(),
        )?;
        if self.low_stock {
            write!(f, " LOW")?;
        }
        Ok(())
    }
}

/// Render a full report, one line per row.
pub fn render_report(rows: &[ReservoirStatus]) -> String {
    rows.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

fn fill_percent(mass: Decimal, capacity: Decimal) -> Decimal {
    if capacity <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    mass.checked_div(capacity)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .unwrap_or(Decimal::ZERO)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;
    use crate::reservoir::ReservoirSeed;

    fn status(mass: Decimal, capacity: Decimal) -> ReservoirStatus {
        let reservoir = Reservoir::from_seed(ReservoirSeed {
            name: "Argon".to_owned(),
            mass,
            capacity,
            pressure: dec!(63.59964),
            alert_threshold: dec!(1),
        })
        .unwrap();
        ReservoirStatus::from_reservoir(&reservoir)
    }

    #[test]
    fn fill_percent_is_mass_over_capacity() {
        let s = status(dec!(5.29997), dec!(10));
        assert_eq!(s.fill_percent, dec!(52.9997));
        assert_eq!(s.filled_cells(), 10);
    }

    #[test]
    fn zero_capacity_reports_empty_gauge() {
        let s = status(dec!(0), dec!(0));
        assert_eq!(s.fill_percent, Decimal::ZERO);
        assert_eq!(s.gauge(), EMPTY_CELL.to_string().repeat(GAUGE_WIDTH));
    }

    #[test]
    fn full_reservoir_fills_every_cell() {
        let s = status(dec!(10), dec!(10));
        assert_eq!(s.filled_cells(), GAUGE_WIDTH);
        assert_eq!(s.gauge(), FILLED_CELL.to_string().repeat(GAUGE_WIDTH));
    }

    #[test]
    fn display_line_rounds_values() {
        let line = status(dec!(5.29997), dec!(10)).to_string();
        assert!(line.starts_with("Argon"));
        assert!(line.contains("53.0%"));
        assert!(line.contains("5.300 kg"));
        assert!(line.contains("63.6 bar"));
        assert!(!line.ends_with("LOW"));
    }

    #[test]
    fn display_flags_low_stock() {
        let line = status(dec!(0.5), dec!(10)).to_string();
        assert!(line.ends_with("LOW"));
    }

    #[test]
    fn render_report_joins_lines() {
        let rows = vec![status(dec!(1), dec!(10)), status(dec!(2), dec!(10))];
        assert_eq!(render_report(&rows).lines().count(), 2);
    }
}
