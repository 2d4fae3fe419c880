//! # feedloom
//!
//! Multi-source content aggregation for feed-driven apps.
//!
//! Given a user query or a home-feed request, feedloom fans the same logical
//! request out to every registered content provider, bounds resource usage
//! with fixed-size concurrency batches, tolerates partial and total provider
//! failure, deduplicates and merges results into category buckets, and keeps
//! a durable fallback cache so the consumer always has something to render.
//!
//! ## Design
//!
//! - Providers are opaque capabilities behind [`ContentProvider`]; the engine
//!   never interprets their payloads beyond fingerprinting
//! - Fan-out is batched: batch N+1 waits for batch N, bounding in-flight
//!   calls without a scheduler
//! - Every task is individually time-boxed; transient failures retry with
//!   exponential backoff, timeouts and cancellations never do
//! - One shared cancellation token per round; a new round supersedes and
//!   cancels the previous one
//! - Per-provider failures never fail the round: outcomes stream
//!   incrementally and the consumer judges the aggregate
//! - Last-known-good aggregates persist through a caller-supplied
//!   [`CacheStore`] and serve instantly while fresh data loads
//!
//! ## Example
//!
//! ```no_run
//! # async fn example() -> feedloom::Result<()> {
//! use std::sync::Arc;
//!
//! let mut engine = feedloom::Engine::new(
//!     feedloom::EngineConfig::default(),
//!     Arc::new(feedloom::MemoryCacheStore::new()),
//! )?;
//! // engine.registry_mut().register(descriptor, provider);
//!
//! let mut round = engine.start_round(feedloom::RoundRequest::search("rust"));
//! if let Some(cached) = &round.initial {
//!     println!("rendering {} cached buckets first", cached.buckets.len());
//! }
//! while let Some(event) = round.events.recv().await {
//!     match event {
//!         feedloom::RoundEvent::Provider { provider, state, .. } => {
//!             println!("{provider}: {state}");
//!         }
//!         feedloom::RoundEvent::Finalized { buckets, round_failed } => {
//!             println!("{} buckets (failed: {round_failed})", buckets.len());
//!         }
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod paging;
pub mod provider;
pub mod registry;
pub mod types;

pub use cache::{CacheStore, CachedFeed, FeedCache, MemoryCacheStore};
pub use config::EngineConfig;
pub use engine::{Engine, Round, RoundEvent, RoundRequest};
pub use error::{EngineError, ProviderError, Result};
pub use paging::{page, PageView, PaneEntry, PaneProgress, ProviderPane};
pub use provider::ContentProvider;
pub use registry::{ProviderRegistry, ProviderSelection, RegisteredProvider};
pub use types::{
    CategoryBucket, FeedQuery, FetchOutcome, Item, ProviderDescriptor, ProviderState, Section,
};
