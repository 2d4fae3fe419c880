//! Core types for aggregation rounds: providers, queries, items, outcomes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A content provider as seen by the engine: identity, display name, and an
/// enabled flag. Immutable once snapshotted into a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderDescriptor {
    /// Stable provider identity. Two descriptors with the same `id` refer to
    /// the same provider.
    pub id: String,
    /// Human-readable name, used for pane ordering and logging.
    pub display_name: String,
    /// Disabled providers are excluded from round snapshots.
    pub enabled: bool,
}

impl ProviderDescriptor {
    /// Build an enabled descriptor.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            enabled: true,
        }
    }
}

impl fmt::Display for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

/// The logical request fanned out to every provider in a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedQuery {
    /// The "home feed" request: each provider returns its curated catalogue.
    Home,
    /// A user search. Blank text short-circuits the round: no provider is
    /// called and every provider reports [`ProviderState::Idle`].
    Search(String),
}

impl FeedQuery {
    /// True for a search whose text is empty after trimming.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Home => false,
            Self::Search(text) => text.trim().is_empty(),
        }
    }

    /// Normalised label used in cache keys and logging: `home`, or the
    /// trimmed, lowercased search text.
    pub fn label(&self) -> String {
        match self {
            Self::Home => "home".to_string(),
            Self::Search(text) => text.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for FeedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("home"),
            Self::Search(text) => write!(f, "search {text:?}"),
        }
    }
}

/// A single content item. The engine treats the payload as opaque beyond
/// fingerprinting the three fields below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub title: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Item {
    /// Build an item without a description.
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            description: None,
        }
    }
}

/// One categorised slice of a provider's response.
///
/// `key` and `title` are the provider's categorisation signal; either or both
/// may be absent. Search-style providers typically return a single section
/// with neither, which the aggregator buckets under the provider's own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub items: Vec<Item>,
}

impl Section {
    /// An uncategorised section (bucketed under the provider id).
    pub fn uncategorised(items: Vec<Item>) -> Self {
        Self {
            key: None,
            title: None,
            items,
        }
    }

    /// A section with an explicit category key and title.
    pub fn categorised(
        key: impl Into<String>,
        title: impl Into<String>,
        items: Vec<Item>,
    ) -> Self {
        Self {
            key: Some(key.into()),
            title: Some(title.into()),
            items,
        }
    }
}

/// Terminal result of one provider's fetch lineage within a round.
///
/// Exactly one outcome is recorded per provider per round; retries share the
/// lineage and the outcome reflects the final attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The provider returned, possibly with zero items.
    Success { sections: Vec<Section> },
    /// The deadline expired. Never retried.
    Timeout,
    /// The round was cancelled before the provider resolved. Never retried.
    Cancelled,
    /// Transient failures exhausted the retry cap.
    Failed { cause: String },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Total item count across this outcome's sections.
    pub fn item_count(&self) -> usize {
        match self {
            Self::Success { sections } => sections.iter().map(|s| s.items.len()).sum(),
            _ => 0,
        }
    }
}

/// Per-provider state as surfaced to consumers over the round event stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderState {
    /// The round short-circuited (blank query); the provider was never called.
    Idle,
    /// The provider's fetch task has been issued and has not yet resolved.
    Loading,
    Success,
    Timeout,
    Failed,
    Cancelled,
}

impl ProviderState {
    /// True once the provider can no longer change state this round.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Loading)
    }
}

impl From<&FetchOutcome> for ProviderState {
    fn from(outcome: &FetchOutcome) -> Self {
        match outcome {
            FetchOutcome::Success { .. } => Self::Success,
            FetchOutcome::Timeout => Self::Timeout,
            FetchOutcome::Cancelled => Self::Cancelled,
            FetchOutcome::Failed { .. } => Self::Failed,
        }
    }
}

impl fmt::Display for ProviderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Success => "success",
            Self::Timeout => "timeout",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A named group of deduplicated items sharing a category key.
///
/// At most one bucket exists per key per aggregation round. `source_provider`
/// is set only when the key fell back to a provider's id, i.e. the bucket is
/// provider-scoped rather than an explicit category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub key: String,
    pub title: String,
    pub items: Vec<Item>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_provider: Option<String>,
}
