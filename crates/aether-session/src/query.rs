//! Query composition: free text plus filter markers.
//!
//! The engine parses markers by prefix, so they are appended as
//! space-delimited suffixes in a fixed order: date marker first, then the
//! category marker.

use aether_core::defaults::{CATEGORY_MARKER_PREFIX, DATE_MARKER};
use aether_core::{ComposedQuery, QueryState};

/// Compose the exact string sent to the search endpoint.
pub fn compose(state: &QueryState) -> ComposedQuery {
    let mut query = state.free_text.clone();

    if state.sort_by_date {
        query.push(' ');
        query.push_str(DATE_MARKER);
    }

    let category = state.category_filter.trim();
    if !category.is_empty() {
        query.push(' ');
        query.push_str(CATEGORY_MARKER_PREFIX);
        query.push_str(category);
    }

    ComposedQuery::new(query)
}
