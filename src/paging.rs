//! Pagination windower for progressive disclosure of provider panes.
//!
//! Slices a set of per-provider panes into fixed-size pages, re-sorting on
//! every call as loading states change: panes still loading sort first, then
//! panes with results, then the rest alphabetically. Page membership is
//! therefore allowed to shift while a round resolves; `has_next`/`has_prev`
//! are always recomputed from the current filtered set.

use crate::error::EngineError;
use crate::types::{Item, ProviderDescriptor, ProviderState};

/// Anything the windower can order and filter.
pub trait PaneEntry {
    fn is_loading(&self) -> bool;
    fn has_items(&self) -> bool;
    fn display_name(&self) -> &str;
}

/// One provider's pane: its descriptor, current state, and items so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderPane {
    pub provider: ProviderDescriptor,
    pub state: ProviderState,
    pub items: Vec<Item>,
}

impl ProviderPane {
    /// A pane in the `Loading` state with no items yet.
    pub fn loading(provider: ProviderDescriptor) -> Self {
        Self {
            provider,
            state: ProviderState::Loading,
            items: Vec::new(),
        }
    }
}

impl PaneEntry for ProviderPane {
    fn is_loading(&self) -> bool {
        self.state == ProviderState::Loading
    }

    fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    fn display_name(&self) -> &str {
        &self.provider.display_name
    }
}

/// One page of panes plus derived navigation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView<T> {
    pub entries: Vec<T>,
    /// The page actually returned, after clamping. 1-based.
    pub page_index: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

/// How many panes are still loading, out of how many visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaneProgress {
    pub loading: usize,
    pub total: usize,
}

impl PaneProgress {
    /// True once nothing is still loading.
    pub fn settled(&self) -> bool {
        self.loading == 0
    }
}

/// Count loading panes for a "searching X of Y" style indicator.
pub fn progress<T: PaneEntry>(entries: &[T]) -> PaneProgress {
    PaneProgress {
        loading: entries.iter().filter(|e| e.is_loading()).count(),
        total: entries.len(),
    }
}

/// Slice `entries` into the requested page window.
///
/// Only entries that are still loading or have non-empty results
/// participate. `page_index` is 1-based; out-of-range indices clamp to the
/// nearest valid page (an empty set clamps to page 1).
///
/// # Errors
///
/// `page_size == 0` is a configuration error, never silently coerced.
pub fn page<T: PaneEntry + Clone>(
    entries: &[T],
    page_size: usize,
    page_index: usize,
) -> Result<PageView<T>, EngineError> {
    if page_size == 0 {
        return Err(EngineError::Config(
            "page_size must be greater than 0".into(),
        ));
    }

    let mut visible: Vec<&T> = entries
        .iter()
        .filter(|e| e.is_loading() || e.has_items())
        .collect();
    visible.sort_by(|a, b| {
        b.is_loading()
            .cmp(&a.is_loading())
            .then_with(|| b.has_items().cmp(&a.has_items()))
            .then_with(|| a.display_name().cmp(b.display_name()))
    });

    let total_pages = visible.len().div_ceil(page_size);
    let page_index = page_index.clamp(1, total_pages.max(1));

    let start = (page_index - 1) * page_size;
    let slice = visible
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    Ok(PageView {
        entries: slice,
        page_index,
        total_pages,
        has_next: page_index < total_pages,
        has_prev: page_index > 1,
    })
}
