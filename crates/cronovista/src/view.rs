use crate::group::Granularity;

/// Records shown per page, for both date pages and per-group item pages.
pub const PAGE_SIZE: usize = 5;

/// Page-turn direction for the pagination actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

/// User-controlled view parameters owned by one control instance.
///
/// Mutated only through the interaction transitions below; a single page
/// counter is shared between date-scope and group-scope pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub granularity: Granularity,
    pub page: usize,
}

impl ViewState {
    pub fn new() -> Self {
        Self {
            granularity: Granularity::default(),
            page: 1,
        }
    }

    /// Switch the bucketing unit; pagination restarts from the first page.
    pub fn select_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
        self.page = 1;
    }

    /// Move one page within `[1, page_count]`; boundary moves are no-ops.
    pub fn turn_page(&mut self, direction: Direction, page_count: usize) {
        match direction {
            Direction::Previous if self.page > 1 => self.page -= 1,
            Direction::Next if self.page < page_count => self.page += 1,
            _ => {}
        }
    }

    /// Pull the page back into range after the underlying count changed.
    pub fn clamp_page(&mut self, page_count: usize) {
        self.page = self.page.clamp(1, page_count.max(1));
    }
}

impl Default for ViewState {
    fn default() -> Self {
        Self::new()
    }
}

/// Number of pages needed for `len` items; at least one.
pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE).max(1)
}

/// Index range of `page` within `len` items.
pub fn page_window(page: usize, len: usize) -> std::ops::Range<usize> {
    let start = page.saturating_sub(1) * PAGE_SIZE;
    start.min(len)..(start + PAGE_SIZE).min(len)
}

/// Pagination controls appear only once the count exceeds the page size.
pub fn needs_pagination(len: usize) -> bool {
    len > PAGE_SIZE
}
