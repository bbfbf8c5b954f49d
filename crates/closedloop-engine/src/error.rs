//! Error types for the engine binary.
//!
//! [`EngineError`] wraps every failure mode of startup and the scenario runs
//! so `main` can propagate with `?`.

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: closedloop_core::config::ConfigError,
    },

    /// The ledger could not be built from its seeds.
    #[error("ledger error: {source}")]
    Ledger {
        /// The underlying ledger error.
        #[from]
        source: closedloop_ledger::LedgerError,
    },

    /// The seal model rejected its constants.
    #[error("seal error: {source}")]
    Seal {
        /// The underlying seal error.
        #[from]
        source: closedloop_core::seal::SealError,
    },

    /// A scenario aborted.
    #[error("scenario error: {source}")]
    Scenario {
        /// The underlying scenario error.
        #[from]
        source: closedloop_core::scenario::ScenarioError,
    },
}
