//! Provider registry: the ordered set of installed providers and the
//! selection policies that pick a round's snapshot from it.
//!
//! The registry is read-only from the engine's perspective during a round:
//! [`ProviderRegistry::snapshot`] clones the matching entries at round start,
//! so caller-side mutation (installing or disabling a provider mid-round)
//! never affects an in-flight round.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::sync::Arc;

use crate::provider::ContentProvider;
use crate::types::ProviderDescriptor;

/// A descriptor paired with its capability, as held by the registry and
/// snapshotted into rounds.
#[derive(Clone)]
pub struct RegisteredProvider {
    pub descriptor: ProviderDescriptor,
    pub source: Arc<dyn ContentProvider>,
}

impl fmt::Debug for RegisteredProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredProvider")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

/// Which providers a round should fan out to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSelection {
    /// Every enabled provider.
    All,
    /// A random sample of enabled providers (size drawn from the configured
    /// range), used by home feeds to shed load.
    Sample,
    /// Specific providers by id; unknown or disabled ids are skipped.
    Ids(Vec<String>),
}

/// Ordered set of installed providers, kept sorted by display name.
#[derive(Default)]
pub struct ProviderRegistry {
    entries: Vec<RegisteredProvider>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace a provider.
    ///
    /// An existing entry with the same id is replaced; the registry stays
    /// sorted by display name.
    pub fn register(&mut self, descriptor: ProviderDescriptor, source: Arc<dyn ContentProvider>) {
        self.entries.retain(|e| e.descriptor.id != descriptor.id);
        self.entries.push(RegisteredProvider { descriptor, source });
        self.entries
            .sort_by(|a, b| a.descriptor.display_name.cmp(&b.descriptor.display_name));
    }

    /// Remove a provider by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.descriptor.id != id);
        self.entries.len() != before
    }

    /// Flip a provider's enabled flag. Returns `false` for unknown ids.
    pub fn set_enabled(&mut self, id: &str, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|e| e.descriptor.id == id) {
            Some(entry) => {
                entry.descriptor.enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All descriptors in registry order.
    pub fn descriptors(&self) -> Vec<ProviderDescriptor> {
        self.entries.iter().map(|e| e.descriptor.clone()).collect()
    }

    /// Ids of every enabled provider, in registry order. This is the scope a
    /// round's cache key is derived from, regardless of sampling.
    pub fn enabled_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| e.descriptor.enabled)
            .map(|e| e.descriptor.id.clone())
            .collect()
    }

    /// Clone the entries a round will fan out to.
    ///
    /// Disabled providers never appear in a snapshot. `Sample` shuffles the
    /// enabled entries and draws a size from `sample_sizes` using the
    /// caller-supplied RNG, so test runs are deterministic.
    pub fn snapshot(
        &self,
        selection: &ProviderSelection,
        sample_sizes: (usize, usize),
        rng: &mut StdRng,
    ) -> Vec<RegisteredProvider> {
        let enabled: Vec<RegisteredProvider> = self
            .entries
            .iter()
            .filter(|e| e.descriptor.enabled)
            .cloned()
            .collect();

        match selection {
            ProviderSelection::All => enabled,
            ProviderSelection::Ids(ids) => enabled
                .into_iter()
                .filter(|e| ids.iter().any(|id| *id == e.descriptor.id))
                .collect(),
            ProviderSelection::Sample => {
                let (lo, hi) = sample_sizes;
                let drawn = if lo >= hi { lo } else { rng.gen_range(lo..=hi) };
                let count = drawn.min(enabled.len());
                let mut shuffled = enabled;
                shuffled.shuffle(rng);
                shuffled.truncate(count);
                shuffled
            }
        }
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderError;
    use crate::types::{FeedQuery, Section};
    use async_trait::async_trait;
    use rand::SeedableRng;
    use tokio_util::sync::CancellationToken;

    struct NullProvider;

    #[async_trait]
    impl ContentProvider for NullProvider {
        async fn fetch(
            &self,
            _query: &FeedQuery,
            _cancel: &CancellationToken,
        ) -> Result<Vec<Section>, ProviderError> {
            Ok(vec![])
        }
    }

    fn registry_with(names: &[(&str, &str)]) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        for (id, display) in names {
            registry.register(ProviderDescriptor::new(*id, *display), Arc::new(NullProvider));
        }
        registry
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn registry_sorted_by_display_name() {
        let registry = registry_with(&[("z", "Zeta"), ("a", "Alpha"), ("m", "Mu")]);
        let names: Vec<String> = registry
            .descriptors()
            .into_iter()
            .map(|d| d.display_name)
            .collect();
        assert_eq!(names, vec!["Alpha", "Mu", "Zeta"]);
    }

    #[test]
    fn register_replaces_same_id() {
        let mut registry = registry_with(&[("a", "Alpha")]);
        registry.register(
            ProviderDescriptor::new("a", "Alpha Prime"),
            Arc::new(NullProvider),
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptors()[0].display_name, "Alpha Prime");
    }

    #[test]
    fn remove_by_id() {
        let mut registry = registry_with(&[("a", "Alpha"), ("b", "Beta")]);
        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn set_enabled_unknown_id_is_false() {
        let mut registry = registry_with(&[("a", "Alpha")]);
        assert!(registry.set_enabled("a", false));
        assert!(!registry.set_enabled("ghost", false));
    }

    #[test]
    fn disabled_providers_excluded_from_snapshot() {
        let mut registry = registry_with(&[("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")]);
        registry.set_enabled("b", false);

        let snapshot = registry.snapshot(&ProviderSelection::All, (2, 3), &mut rng());
        let ids: Vec<&str> = snapshot.iter().map(|e| e.descriptor.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
        assert_eq!(registry.enabled_ids(), vec!["a", "c"]);
    }

    #[test]
    fn ids_selection_keeps_registry_order_and_skips_unknown() {
        let registry = registry_with(&[("a", "Alpha"), ("b", "Beta"), ("c", "Gamma")]);
        let snapshot = registry.snapshot(
            &ProviderSelection::Ids(vec!["c".into(), "a".into(), "ghost".into()]),
            (2, 3),
            &mut rng(),
        );
        let ids: Vec<&str> = snapshot.iter().map(|e| e.descriptor.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn ids_selection_skips_disabled() {
        let mut registry = registry_with(&[("a", "Alpha"), ("b", "Beta")]);
        registry.set_enabled("a", false);
        let snapshot = registry.snapshot(
            &ProviderSelection::Ids(vec!["a".into(), "b".into()]),
            (2, 3),
            &mut rng(),
        );
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].descriptor.id, "b");
    }

    #[test]
    fn sample_draws_within_configured_range() {
        let registry = registry_with(&[
            ("a", "Alpha"),
            ("b", "Beta"),
            ("c", "Gamma"),
            ("d", "Delta"),
            ("e", "Epsilon"),
        ]);
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let snapshot = registry.snapshot(&ProviderSelection::Sample, (2, 3), &mut rng);
            assert!(
                snapshot.len() == 2 || snapshot.len() == 3,
                "sample size {} out of range",
                snapshot.len()
            );
        }
    }

    #[test]
    fn sample_clamped_to_available_providers() {
        let registry = registry_with(&[("a", "Alpha")]);
        let snapshot = registry.snapshot(&ProviderSelection::Sample, (2, 3), &mut rng());
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn sample_is_deterministic_for_a_seed() {
        let registry = registry_with(&[
            ("a", "Alpha"),
            ("b", "Beta"),
            ("c", "Gamma"),
            ("d", "Delta"),
        ]);
        let pick = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            registry
                .snapshot(&ProviderSelection::Sample, (2, 3), &mut rng)
                .into_iter()
                .map(|e| e.descriptor.id)
                .collect::<Vec<_>>()
        };
        assert_eq!(pick(42), pick(42));
    }

    #[test]
    fn empty_registry_snapshots_empty() {
        let registry = ProviderRegistry::new();
        assert!(registry.is_empty());
        let snapshot = registry.snapshot(&ProviderSelection::All, (2, 3), &mut rng());
        assert!(snapshot.is_empty());
        let snapshot = registry.snapshot(&ProviderSelection::Sample, (2, 3), &mut rng());
        assert!(snapshot.is_empty());
    }
}
