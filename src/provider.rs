//! Trait definition for pluggable content providers.
//!
//! Each concrete provider (whatever it scrapes, proxies, or serves) implements
//! [`ContentProvider`] to expose a uniform capability to the engine: given a
//! query, return sections of items, or fail. The engine never looks inside a
//! provider beyond this seam.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::ProviderError;
use crate::types::{FeedQuery, Section};

/// A pluggable content provider backend.
///
/// Implementations are free to ignore `cancel`; the engine races every call
/// against the round's cancellation signal and its deadline regardless.
/// Cooperative providers can observe the token to abandon work early and
/// return [`ProviderError::Cancelled`].
///
/// Any other error is treated as transient and retried up to the engine's
/// retry cap. All implementations must be `Send + Sync` so a round can hold
/// several calls in flight.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Fetch content for `query`.
    ///
    /// For [`FeedQuery::Home`] the provider returns its curated catalogue,
    /// typically several categorised sections. For [`FeedQuery::Search`] a
    /// single uncategorised section is the common shape.
    ///
    /// # Errors
    ///
    /// [`ProviderError::Cancelled`] if the provider observed `cancel`;
    /// [`ProviderError::Transient`] for anything else.
    async fn fetch(
        &self,
        query: &FeedQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Section>, ProviderError>;
}
