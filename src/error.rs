//! Error types for the feedloom crate.
//!
//! Engine-level errors use stable string messages suitable for display and
//! programmatic handling. Per-provider trouble (timeouts, transient network
//! failures, cancellation) is never an error at this level — it is reported
//! through [`crate::types::FetchOutcome`] instead.

/// Errors the engine can return to its caller.
///
/// Deliberately small: a round cannot fail as a whole, so the only hard
/// failures are misconfiguration and internal cache serialisation problems
/// (the latter are swallowed and logged by the cache layer rather than
/// propagated).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid engine configuration (zero batch size, zero page size, etc.).
    #[error("config error: {0}")]
    Config(String),

    /// A cache payload could not be serialised or deserialised.
    #[error("cache error: {0}")]
    Cache(String),
}

/// Errors a [`crate::provider::ContentProvider`] implementation may return.
///
/// The engine treats every error as transient (and retries it) unless it is
/// specifically the cancellation signal.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The provider observed the round's cancellation signal and gave up.
    #[error("provider call cancelled")]
    Cancelled,

    /// Anything else: network failure, parse failure, upstream error.
    #[error("transient provider failure: {0}")]
    Transient(String),
}

/// Convenience type alias for feedloom results.
pub type Result<T> = std::result::Result<T, EngineError>;
