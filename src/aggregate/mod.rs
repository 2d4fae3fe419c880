//! Result aggregation: fold per-provider outcomes into deduplicated,
//! capped category buckets.
//!
//! This module consumes the orchestrator's outcome stream in completion
//! order, merges sections into buckets keyed by their categorisation signal,
//! removes duplicate items by content fingerprint, and finalises a bounded
//! bucket list for rendering.

pub mod buckets;
pub mod fingerprint;

pub use buckets::Aggregation;
pub use fingerprint::fingerprint;
