//! The aggregation engine: a process-scoped context owning the provider
//! registry, the fallback cache, and the lifecycle of aggregation rounds.
//!
//! Construct one [`Engine`] per process (or per test), register providers,
//! then call [`Engine::start_round`] for each home-feed or search request.
//! Starting a round implicitly cancels the previous one; [`Engine::shutdown`]
//! tears the engine down explicitly.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Aggregation;
use crate::cache::{round_key, CacheStore, CachedFeed, FeedCache};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::orchestrator::run_round;
use crate::registry::{ProviderRegistry, ProviderSelection};
use crate::types::{CategoryBucket, FeedQuery, FetchOutcome, Item, ProviderDescriptor, ProviderState};

/// One aggregation request from the consumer layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRequest {
    pub query: FeedQuery,
    pub selection: ProviderSelection,
    /// When `false`, any non-success outcome marks the round failed for
    /// cache purposes; partial buckets are still delivered.
    pub use_partial_results: bool,
}

impl RoundRequest {
    /// A home-feed round over a random provider sample.
    pub fn home() -> Self {
        Self {
            query: FeedQuery::Home,
            selection: ProviderSelection::Sample,
            use_partial_results: true,
        }
    }

    /// A search round across every enabled provider.
    pub fn search(text: impl Into<String>) -> Self {
        Self {
            query: FeedQuery::Search(text.into()),
            selection: ProviderSelection::All,
            use_partial_results: true,
        }
    }
}

/// Incremental round feedback for the consumer layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoundEvent {
    /// A provider changed state. `items` is populated only on success, with
    /// the provider's capped items in section order.
    Provider {
        provider: ProviderDescriptor,
        state: ProviderState,
        items: Vec<Item>,
    },
    /// The round finished; `buckets` is the finalised snapshot. A failed
    /// round still delivers whatever (possibly empty) buckets accumulated,
    /// and the consumer is expected to fall back to cached data.
    Finalized {
        buckets: Vec<CategoryBucket>,
        round_failed: bool,
    },
}

/// A running aggregation round.
///
/// `initial` is the cached feed for this request's signature, served
/// synchronously so the UI renders instantly while fresh data loads.
pub struct Round {
    pub initial: Option<CachedFeed>,
    pub events: mpsc::UnboundedReceiver<RoundEvent>,
    cancel: CancellationToken,
}

impl Round {
    /// Abort this round. Idempotent, and a no-op once the round finished.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The round's cancellation token, for callers that tie cancellation to
    /// their own lifetimes.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// Multi-provider content aggregation engine.
pub struct Engine {
    config: EngineConfig,
    registry: ProviderRegistry,
    cache: FeedCache,
    rng: StdRng,
    current_round: Option<CancellationToken>,
}

impl Engine {
    /// Build an engine over the given cache store.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` fails validation.
    pub fn new(config: EngineConfig, store: Arc<dyn CacheStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: ProviderRegistry::new(),
            cache: FeedCache::new(store),
            rng: StdRng::from_entropy(),
            current_round: None,
        })
    }

    /// Like [`Engine::new`] with a seeded random source, so provider
    /// sampling and spotlight picks are deterministic under test.
    pub fn with_rng_seed(
        config: EngineConfig,
        store: Arc<dyn CacheStore>,
        seed: u64,
    ) -> Result<Self> {
        let mut engine = Self::new(config, store)?;
        engine.rng = StdRng::seed_from_u64(seed);
        Ok(engine)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ProviderRegistry {
        &mut self.registry
    }

    /// Start an aggregation round, implicitly cancelling the previous one.
    ///
    /// The registry is snapshotted here: mutating it afterwards does not
    /// affect the in-flight round. Must be called within a Tokio runtime.
    pub fn start_round(&mut self, request: RoundRequest) -> Round {
        if let Some(previous) = self.current_round.take() {
            previous.cancel();
        }
        let cancel = CancellationToken::new();
        self.current_round = Some(cancel.clone());

        let snapshot =
            self.registry
                .snapshot(&request.selection, self.config.sample_sizes, &mut self.rng);

        // The cache signature covers the requested scope, not the sampled
        // subset, so successive sampled home rounds share one entry.
        let scope: Vec<String> = match &request.selection {
            ProviderSelection::Ids(_) => snapshot
                .iter()
                .map(|slot| slot.descriptor.id.clone())
                .collect(),
            _ => self.registry.enabled_ids(),
        };
        let key = round_key(&request.query, &scope);
        let initial = self.cache.read(&key);

        let (tx, events) = mpsc::unbounded_channel();

        if snapshot.is_empty() {
            let _ = tx.send(RoundEvent::Finalized {
                buckets: Vec::new(),
                round_failed: false,
            });
            return Round {
                initial,
                events,
                cancel,
            };
        }

        if request.query.is_blank() {
            tracing::trace!("blank query, round short-circuits to idle");
            for slot in &snapshot {
                let _ = tx.send(RoundEvent::Provider {
                    provider: slot.descriptor.clone(),
                    state: ProviderState::Idle,
                    items: Vec::new(),
                });
            }
            let _ = tx.send(RoundEvent::Finalized {
                buckets: Vec::new(),
                round_failed: false,
            });
            return Round {
                initial,
                events,
                cancel,
            };
        }

        tracing::trace!(query = %request.query, providers = snapshot.len(), "starting aggregation round");
        for slot in &snapshot {
            let _ = tx.send(RoundEvent::Provider {
                provider: slot.descriptor.clone(),
                state: ProviderState::Loading,
                items: Vec::new(),
            });
        }

        let config = self.config.clone();
        let cache = self.cache.clone();
        let query = request.query.clone();
        let use_partial = request.use_partial_results;
        let expected = snapshot.len();
        let token = cancel.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let mut aggregation = Aggregation::new(&config);
            let mut outcomes = run_round(snapshot, query.clone(), config, token);

            while let Some((provider, outcome)) = outcomes.recv().await {
                aggregation.fold(&provider, &outcome);
                let items = match &outcome {
                    FetchOutcome::Success { sections } => sections
                        .iter()
                        .flat_map(|section| section.items.iter().cloned())
                        .collect(),
                    _ => Vec::new(),
                };
                let _ = tx.send(RoundEvent::Provider {
                    provider,
                    state: ProviderState::from(&outcome),
                    items,
                });
            }

            let buckets = aggregation.finalize();
            let round_failed = if use_partial {
                aggregation.all_failed()
            } else {
                aggregation.successes() < expected
            };
            if !round_failed && !buckets.is_empty() {
                cache.write(&key, &buckets);
            }
            tracing::debug!(
                query = %query,
                providers = expected,
                successes = aggregation.successes(),
                buckets = buckets.len(),
                round_failed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "aggregation round complete"
            );
            let _ = tx.send(RoundEvent::Finalized {
                buckets,
                round_failed,
            });
        });

        Round {
            initial,
            events,
            cancel,
        }
    }

    /// Pick a uniformly random item across all buckets, for a hero/spotlight
    /// slot. `None` when there is nothing to pick.
    pub fn spotlight(&mut self, buckets: &[CategoryBucket]) -> Option<Item> {
        let total: usize = buckets.iter().map(|b| b.items.len()).sum();
        if total == 0 {
            return None;
        }
        let pick = self.rng.gen_range(0..total);
        buckets
            .iter()
            .flat_map(|b| b.items.iter())
            .nth(pick)
            .cloned()
    }

    /// Tear the engine down, cancelling any in-flight round.
    pub fn shutdown(&mut self) {
        if let Some(current) = self.current_round.take() {
            current.cancel();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
