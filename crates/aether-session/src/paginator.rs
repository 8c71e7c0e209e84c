//! Client-side pagination over the result set of one search.

use aether_core::defaults::PAGE_SIZE;
use aether_core::SearchResult;

/// Holds the full result sequence of the latest search and exposes a
/// fixed-size, zero-indexed window over it.
///
/// Invariant: `page_index < total_pages()`, so the window is never past the
/// end of a non-empty result set.
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    results: Vec<SearchResult>,
    page_index: usize,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the held sequence and rewind to the first page.
    pub fn set_results(&mut self, results: Vec<SearchResult>) {
        self.results = results;
        self.page_index = 0;
    }

    pub fn clear(&mut self) {
        self.set_results(Vec::new());
    }

    /// Results on the current page, in server order.
    pub fn window(&self) -> &[SearchResult] {
        let start = (self.page_index * PAGE_SIZE).min(self.results.len());
        let end = (start + PAGE_SIZE).min(self.results.len());
        &self.results[start..end]
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn page_size(&self) -> usize {
        PAGE_SIZE
    }

    /// `max(1, ceil(len / PAGE_SIZE))`.
    pub fn total_pages(&self) -> usize {
        self.results.len().div_ceil(PAGE_SIZE).max(1)
    }

    pub fn results(&self) -> &[SearchResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn has_next(&self) -> bool {
        self.page_index + 1 < self.total_pages()
    }

    pub fn has_prev(&self) -> bool {
        self.page_index > 0
    }

    /// Advance one page. Returns false at the last page.
    pub fn next_page(&mut self) -> bool {
        if !self.has_next() {
            return false;
        }
        self.page_index += 1;
        true
    }

    /// Go back one page. Returns false at the first page.
    pub fn prev_page(&mut self) -> bool {
        if !self.has_prev() {
            return false;
        }
        self.page_index -= 1;
        true
    }

    /// Jump to `page`, clamped into `[0, total_pages - 1]`.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.page_index = page.min(self.total_pages() - 1);
        self.page_index
    }
}
