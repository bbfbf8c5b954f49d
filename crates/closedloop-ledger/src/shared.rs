//! Thread-safe wrapper around [`ReservoirLedger`].
//!
//! Every public operation takes one coarse lock for its whole duration, so
//! concurrent callers observe the same all-or-nothing behavior as a single
//! thread. Safe to share via `Arc<SharedLedger>`.

use std::sync::{Mutex, MutexGuard};

use rust_decimal::Decimal;

use crate::event::{CaptureEvent, LeakCompensation, LedgerEvent};
use crate::ledger::{FlowRates, ReservoirLedger};
use crate::report::ReservoirStatus;
use crate::{BalanceResult, LedgerError};

/// A [`ReservoirLedger`] behind a single mutex.
#[derive(Debug)]
pub struct SharedLedger {
    inner: Mutex<ReservoirLedger>,
}

impl SharedLedger {
    /// Wrap a ledger.
    pub const fn new(ledger: ReservoirLedger) -> Self {
        Self {
            inner: Mutex::new(ledger),
        }
    }

    /// See [`ReservoirLedger::capture`].
    pub fn capture(
        &self,
        flows: &FlowRates,
        duration: Decimal,
    ) -> Result<Vec<CaptureEvent>, LedgerError> {
        self.lock()?.capture(flows, duration)
    }

    /// See [`ReservoirLedger::compensate_leak`].
    pub fn compensate_leak(
        &self,
        substance: &str,
        loss: Decimal,
    ) -> Result<LeakCompensation, LedgerError> {
        self.lock()?.compensate_leak(substance, loss)
    }

    /// See [`ReservoirLedger::report`].
    pub fn report(&self) -> Result<Vec<ReservoirStatus>, LedgerError> {
        Ok(self.lock()?.report())
    }

    /// See [`ReservoirLedger::verify_balance`].
    pub fn verify_balance(&self) -> Result<BalanceResult, LedgerError> {
        Ok(self.lock()?.verify_balance())
    }

    /// Copy of the journal.
    pub fn events(&self) -> Result<Vec<LedgerEvent>, LedgerError> {
        Ok(self.lock()?.events().to_vec())
    }

    /// Unwrap the ledger.
    pub fn into_inner(self) -> Result<ReservoirLedger, LedgerError> {
        self.inner
            .into_inner()
            .map_err(|err| LedgerError::LockPoisoned(err.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, ReservoirLedger>, LedgerError> {
        self.inner
            .lock()
            .map_err(|err| LedgerError::LockPoisoned(err.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use rust_decimal_macros::dec;

    use super::*;
    use crate::reservoir::{Reservoir, ReservoirSeed};

    fn shared() -> Arc<SharedLedger> {
        let ledger = ReservoirLedger::new(
            vec![ReservoirSeed {
                name: "CO2".to_owned(),
                mass: dec!(5),
                capacity: dec!(10),
                pressure: dec!(60),
                alert_threshold: dec!(1),
            }],
            dec!(1),
        )
        .unwrap();
        Arc::new(SharedLedger::new(ledger))
    }

    #[test]
    fn concurrent_captures_and_leaks_balance() {
        let ledger = shared();

        let mut flows = FlowRates::new();
        flows.insert("CO2".to_owned(), dec!(0.01));
        let flows = Arc::new(flows);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                let flows = Arc::clone(&flows);
                thread::spawn(move || {
                    for _ in 0..10 {
                        ledger.capture(&flows, dec!(1)).unwrap();
                        ledger.compensate_leak("CO2", dec!(0.005)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        // 80 captures of 0.01 kg and 80 withdrawals of 0.005 kg.
        let ledger = Arc::try_unwrap(ledger).unwrap().into_inner().unwrap();
        assert_eq!(ledger.reservoir("CO2").map(Reservoir::mass), Some(dec!(5.4)));
        assert_eq!(ledger.len(), 160);
        assert_eq!(ledger.verify_balance(), BalanceResult::Balanced);
    }

    #[test]
    fn shared_report_and_balance() {
        let ledger = shared();
        ledger.compensate_leak("CO2", dec!(1)).unwrap();

        let report = ledger.report().unwrap();
        assert_eq!(report.first().map(|r| r.mass), Some(dec!(4)));
        assert_eq!(ledger.verify_balance(), Ok(BalanceResult::Balanced));
        assert_eq!(ledger.events().map(|e| e.len()), Ok(1));
    }
}
