pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Builds a window from a 1-based page number. Sizes are clamped to
    /// `1..=MAX_PAGE_SIZE` and the offset saturates instead of overflowing.
    pub fn page(page: i64, size: i64) -> Self {
        let size = size.clamp(1, MAX_PAGE_SIZE);
        Self::new(size, (page.max(1) - 1).saturating_mul(size))
    }
}
