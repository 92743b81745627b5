/// Catalog listings use a fixed page size.
pub const PAGE_SIZE: u64 = 10;

/// Highest page a client can ask for; the row offset stays well inside `i64`.
pub const MAX_PAGE: u64 = 1_000_000_000;

/// One-based page number as clients send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationParams {
    pub page: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self { page: 1 }
    }
}

impl PaginationParams {
    /// Page 0 reads as the first page; anything past `MAX_PAGE` as the last one.
    pub fn new(page: u64) -> Self {
        Self {
            page: page.clamp(1, MAX_PAGE),
        }
    }

    /// Zero-based page index as the store expects it.
    pub fn index(&self) -> u64 {
        self.page.saturating_sub(1)
    }
}

pub fn page_count(total: u64, per_page: u64) -> u64 {
    if per_page == 0 {
        return 0;
    }
    total.div_ceil(per_page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(page_count(0, PAGE_SIZE), 0);
        assert_eq!(page_count(10, PAGE_SIZE), 1);
        assert_eq!(page_count(11, PAGE_SIZE), 2);
        assert_eq!(page_count(25, PAGE_SIZE), 3);
    }

    #[test]
    fn page_index_is_zero_based() {
        assert_eq!(PaginationParams::default().index(), 0);
        assert_eq!(PaginationParams::new(1).index(), 0);
        assert_eq!(PaginationParams::new(0).index(), 0);
        assert_eq!(PaginationParams::new(4).index(), 3);
    }

    #[test]
    fn huge_pages_are_capped() {
        let page = PaginationParams::new(u64::MAX);
        assert_eq!(page.page, MAX_PAGE);
        assert!(page.index().checked_mul(PAGE_SIZE).is_some_and(|o| o <= i64::MAX as u64));
    }
}
