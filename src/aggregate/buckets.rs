//! Fold state for one aggregation round.
//!
//! [`Aggregation`] consumes `(provider, outcome)` pairs in whatever order
//! they complete and merges successful sections into category buckets.
//! Bucket keys resolve from the section's categorisation signal, falling
//! back to the provider's id when the section carries neither key nor title,
//! so providers without category metadata never bleed into each other's
//! buckets. Deduplication is first-seen-wins per bucket, in fold order.

use std::collections::{HashMap, HashSet};

use crate::config::EngineConfig;
use crate::types::{CategoryBucket, FetchOutcome, Item, ProviderDescriptor};

use super::fingerprint::fingerprint;

/// Placeholder title for buckets whose source omitted one.
const FALLBACK_TITLE: &str = "Content";

struct BucketState {
    key: String,
    title: String,
    /// Set when the key fell back to the provider id.
    source_provider: Option<String>,
    items: Vec<Item>,
    seen: HashSet<String>,
}

/// Accumulated state of one aggregation round.
///
/// `fold` is order-sensitive only through the documented first-seen dedup
/// rule; `finalize` is pure, so folding the same outcomes and finalising
/// twice yields identical output.
pub struct Aggregation {
    bucket_item_cap: usize,
    bucket_cap: usize,
    buckets: Vec<BucketState>,
    index: HashMap<String, usize>,
    outcomes: usize,
    successes: usize,
}

impl Aggregation {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            bucket_item_cap: config.bucket_item_cap,
            bucket_cap: config.bucket_cap,
            buckets: Vec::new(),
            index: HashMap::new(),
            outcomes: 0,
            successes: 0,
        }
    }

    /// Merge one provider's terminal outcome into the round state.
    ///
    /// Non-success outcomes only update the round bookkeeping; their absence
    /// of items is not an error here.
    pub fn fold(&mut self, provider: &ProviderDescriptor, outcome: &FetchOutcome) {
        self.outcomes += 1;
        let FetchOutcome::Success { sections } = outcome else {
            return;
        };
        self.successes += 1;

        for section in sections {
            let (key, provider_scoped) = resolve_key(section.key.as_deref(), section.title.as_deref(), provider);
            let title = section
                .title
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or(FALLBACK_TITLE)
                .to_string();

            let slot = match self.index.get(&key) {
                Some(&slot) => slot,
                None => {
                    let slot = self.buckets.len();
                    self.buckets.push(BucketState {
                        key: key.clone(),
                        title,
                        source_provider: provider_scoped.then(|| provider.id.clone()),
                        items: Vec::new(),
                        seen: HashSet::new(),
                    });
                    self.index.insert(key, slot);
                    slot
                }
            };

            let bucket = &mut self.buckets[slot];
            for item in &section.items {
                if bucket.seen.insert(fingerprint(item)) {
                    bucket.items.push(item.clone());
                }
            }
        }
    }

    /// Number of outcomes folded so far.
    pub fn outcomes(&self) -> usize {
        self.outcomes
    }

    /// Number of successful outcomes folded so far.
    pub fn successes(&self) -> usize {
        self.successes
    }

    /// True once every folded outcome is terminal-non-success.
    ///
    /// A round with no outcomes at all (empty provider set) is not failed.
    pub fn all_failed(&self) -> bool {
        self.outcomes > 0 && self.successes == 0
    }

    /// Produce the round's bucket list.
    ///
    /// Empty buckets are dropped, each bucket's items are truncated to the
    /// per-bucket cap, and when more than `bucket_cap` buckets accumulated,
    /// the ones with the most items (pre-truncation) are kept — a stable sort,
    /// so ties resolve in insertion order.
    pub fn finalize(&self) -> Vec<CategoryBucket> {
        let mut out: Vec<(usize, CategoryBucket)> = self
            .buckets
            .iter()
            .filter(|b| !b.items.is_empty())
            .map(|b| {
                let mut items = b.items.clone();
                items.truncate(self.bucket_item_cap);
                (
                    b.items.len(),
                    CategoryBucket {
                        key: b.key.clone(),
                        title: b.title.clone(),
                        items,
                        source_provider: b.source_provider.clone(),
                    },
                )
            })
            .collect();

        out.sort_by(|a, b| b.0.cmp(&a.0));
        out.truncate(self.bucket_cap);
        out.into_iter().map(|(_, bucket)| bucket).collect()
    }
}

/// Resolve a section's bucket key; the bool marks a provider-scoped fallback.
fn resolve_key(
    key: Option<&str>,
    title: Option<&str>,
    provider: &ProviderDescriptor,
) -> (String, bool) {
    let explicit = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .or_else(|| title.map(str::trim).filter(|t| !t.is_empty()));
    match explicit {
        Some(k) => (k.to_string(), false),
        None => (provider.id.clone(), true),
    }
}
