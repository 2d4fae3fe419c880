//! Core fan-out loop: batches, deadlines, retries, cancellation.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::EngineConfig;
use crate::error::ProviderError;
use crate::registry::RegisteredProvider;
use crate::types::{FeedQuery, FetchOutcome, ProviderDescriptor, Section};

/// Fan a query out to `providers` and stream `(provider, outcome)` pairs.
///
/// # Pipeline
///
/// 1. Partition the snapshot into batches of `config.batch_size`
/// 2. Launch each batch concurrently with [`futures::future::join_all`];
///    batch N+1 never starts before batch N is fully terminal
/// 3. Race each call against `config.request_timeout` and the shared
///    cancellation token; retry transient failures with exponential backoff
/// 4. Truncate each provider's items to `config.per_provider_cap`
/// 5. Emit every outcome as its task resolves, not at batch completion
///
/// The orchestrator itself cannot fail: every per-provider problem becomes a
/// [`FetchOutcome`] on the stream, and exactly one outcome is emitted per
/// provider — cancellation resolves not-yet-started providers to
/// `Cancelled` without waiting out their timeout window. An empty snapshot
/// yields a stream that closes without emitting.
///
/// Must be called from within a Tokio runtime; the returned receiver is
/// serviced by a spawned task owning the whole round.
pub fn run_round(
    providers: Vec<RegisteredProvider>,
    query: FeedQuery,
    config: EngineConfig,
    cancel: CancellationToken,
) -> mpsc::UnboundedReceiver<(ProviderDescriptor, FetchOutcome)> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(drive(providers, query, config, cancel, tx));
    rx
}

async fn drive(
    providers: Vec<RegisteredProvider>,
    query: FeedQuery,
    config: EngineConfig,
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<(ProviderDescriptor, FetchOutcome)>,
) {
    let total = providers.len();
    let mut next = 0;

    while next < total {
        if cancel.is_cancelled() {
            break;
        }
        if next > 0 {
            // Inter-batch pause, abandoned the moment the round is cancelled.
            tokio::select! {
                () = cancel.cancelled() => break,
                () = tokio::time::sleep(config.batch_delay) => {}
            }
        }

        let end = (next + config.batch_size).min(total);
        let batch = &providers[next..end];
        tracing::debug!(
            batch_start = next,
            batch_len = batch.len(),
            total,
            "launching provider batch"
        );

        let tasks = batch
            .iter()
            .map(|slot| fetch_one(slot, &query, &config, &cancel, &tx));
        futures::future::join_all(tasks).await;

        next = end;
    }

    // Anything the loop never reached resolves as cancelled.
    for slot in &providers[next..] {
        let _ = tx.send((slot.descriptor.clone(), FetchOutcome::Cancelled));
    }
}

/// Run one provider's fetch lineage to its terminal outcome and emit it.
///
/// Timeouts and cancellations are terminal immediately; only transient
/// failures are retried, up to `config.retry_cap` extra attempts.
async fn fetch_one(
    slot: &RegisteredProvider,
    query: &FeedQuery,
    config: &EngineConfig,
    cancel: &CancellationToken,
    tx: &mpsc::UnboundedSender<(ProviderDescriptor, FetchOutcome)>,
) {
    let provider = &slot.descriptor;
    let mut attempt: u32 = 0;

    let outcome = loop {
        if cancel.is_cancelled() {
            break FetchOutcome::Cancelled;
        }

        let call = slot.source.fetch(query, cancel);
        let raced = tokio::select! {
            () = cancel.cancelled() => break FetchOutcome::Cancelled,
            raced = tokio::time::timeout(config.request_timeout, call) => raced,
        };

        match raced {
            Err(_elapsed) => {
                tracing::warn!(provider = %provider, "provider timed out");
                break FetchOutcome::Timeout;
            }
            Ok(Ok(sections)) => {
                let sections = cap_items(sections, config.per_provider_cap);
                break FetchOutcome::Success { sections };
            }
            Ok(Err(ProviderError::Cancelled)) => break FetchOutcome::Cancelled,
            Ok(Err(ProviderError::Transient(cause))) => {
                if attempt >= config.retry_cap {
                    tracing::warn!(
                        provider = %provider,
                        attempts = attempt + 1,
                        error = %cause,
                        "provider failed, retries exhausted"
                    );
                    break FetchOutcome::Failed { cause };
                }
                let delay = backoff_delay(config, attempt);
                tracing::debug!(
                    provider = %provider,
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %cause,
                    "provider failed, retrying"
                );
                tokio::select! {
                    () = cancel.cancelled() => break FetchOutcome::Cancelled,
                    () = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
        }
    };

    tracing::debug!(
        provider = %provider,
        state = %crate::types::ProviderState::from(&outcome),
        items = outcome.item_count(),
        "provider resolved"
    );
    let _ = tx.send((provider.clone(), outcome));
}

/// Exponential backoff: `base * 2^attempt`, saturating at the cap.
fn backoff_delay(config: &EngineConfig, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    config.backoff_base.saturating_mul(factor).min(config.backoff_cap)
}

/// Truncate a provider's combined item count to `cap`, dropping sections
/// that end up empty.
fn cap_items(sections: Vec<Section>, cap: usize) -> Vec<Section> {
    let mut budget = cap;
    let mut out = Vec::with_capacity(sections.len());
    for mut section in sections {
        if budget == 0 {
            break;
        }
        if section.items.len() > budget {
            section.items.truncate(budget);
        }
        budget -= section.items.len();
        if !section.items.is_empty() {
            out.push(section);
        }
    }
    out
}
