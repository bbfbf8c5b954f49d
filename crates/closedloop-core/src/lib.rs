//! Configuration, seal-wear model, and scenario drivers for the closed-loop
//! glider ledger.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `closedloop-config.yaml` into
//!   strongly-typed structs, including the default reservoir seeds.
//! - [`seal`] -- Freeze/thaw seal degradation and the daily leak fraction it
//!   produces.
//! - [`scenario`] -- The one-shot demo run and the multi-day leak campaign,
//!   both driving a [`ReservoirLedger`].
//!
//! [`ReservoirLedger`]: closedloop_ledger::ReservoirLedger

pub mod config;
pub mod scenario;
pub mod seal;
