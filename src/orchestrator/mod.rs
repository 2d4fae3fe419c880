//! Fetch orchestration: batched concurrent fan-out with deadlines, retries,
//! and round-wide cancellation.
//!
//! This module turns a provider snapshot and a query into an incremental
//! stream of per-provider outcomes. Concurrency is bounded by the batch
//! size, every task is individually time-boxed and retried on transient
//! failure, and one shared cancellation token resolves everything still
//! pending the moment it fires.

pub mod round;

pub use round::run_round;
