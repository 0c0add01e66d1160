use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const DEFAULT_MAX_PAGE_SIZE: u32 = 100;

/// Requested page, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Bring page and size into bounds: page >= 1, 1 <= size <= max.
    pub fn clamped(self, max_page_size: u32) -> Self {
        let max = max_page_size.max(1);
        Self {
            page: self.page.max(1),
            page_size: self.page_size.clamp(1, max),
        }
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size)
    }

    pub fn limit(&self) -> u64 {
        u64::from(self.page_size)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    pub fn new(items: Vec<T>, total_count: u64, request: PageRequest) -> Self {
        let page_size = request.page_size.max(1);
        let total_pages = total_count.div_ceil(u64::from(page_size));
        Self {
            items,
            total_count,
            page: request.page,
            page_size,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }

    pub fn empty(request: PageRequest) -> Self {
        Self::new(Vec::new(), 0, request)
    }

    pub fn has_next_page(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_previous_page(&self) -> bool {
        self.page > 1
    }

    pub fn map<U, F>(self, f: F) -> PagedResult<U>
    where
        F: FnMut(T) -> U,
    {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total_count: self.total_count,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_page_size_to_maximum() {
        let request = PageRequest::new(3, 500).clamped(100);
        assert_eq!(request.page, 3);
        assert_eq!(request.page_size, 100);
    }

    #[test]
    fn test_clamps_zero_values() {
        let request = PageRequest::new(0, 0).clamped(50);
        assert_eq!(request, PageRequest::new(1, 1));
        assert_eq!(request.offset(), 0);
    }

    #[test]
    fn test_offset() {
        let request = PageRequest::new(3, 20);
        assert_eq!(request.offset(), 40);
        assert_eq!(request.limit(), 20);
    }

    #[test]
    fn test_paged_result_page_counts() {
        let result = PagedResult::new(vec![1, 2], 45, PageRequest::new(2, 20));
        assert_eq!(result.total_pages, 3);
        assert!(result.has_next_page());
        assert!(result.has_previous_page());

        let last = PagedResult::new(vec![1], 41, PageRequest::new(3, 20));
        assert!(!last.has_next_page());
    }

    #[test]
    fn test_map_keeps_paging() {
        let result = PagedResult::new(vec![1, 2, 3], 3, PageRequest::new(1, 10)).map(|n| n * 10);
        assert_eq!(result.items, vec![10, 20, 30]);
        assert_eq!(result.total_pages, 1);
    }

    #[test]
    fn test_empty_result() {
        let result: PagedResult<u8> = PagedResult::empty(PageRequest::default());
        assert_eq!(result.total_pages, 0);
        assert!(!result.has_next_page());
    }
}
