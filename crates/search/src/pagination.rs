//! Pagination
//!
//! 1-indexed pages with the page size clamped to [1, 100].

use serde::Serialize;

/// Hard cap on page size
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default page size when the caller does not specify one
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub page_size: u64,
}

impl PageWindow {
    /// Clamp caller input into a valid window
    pub fn resolve(page: Option<u64>, page_size: Option<u64>) -> Self {
        Self::resolve_with(page, page_size, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Clamp against deployment-configured limits
    pub fn resolve_with(
        page: Option<u64>,
        page_size: Option<u64>,
        default_size: u64,
        max_size: u64,
    ) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, max_size.max(1)),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1) * self.page_size
    }
}

/// Page metadata returned with every result set
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub current_page: u64,
    pub page_size: u64,
    pub total_pages: u64,
    pub total_count: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageInfo {
    pub fn new(window: PageWindow, total_count: u64) -> Self {
        let total_pages = if total_count > 0 {
            total_count.div_ceil(window.page_size)
        } else {
            1
        };
        Self {
            current_page: window.page,
            page_size: window.page_size,
            total_pages,
            total_count,
            has_next: window.page < total_pages,
            has_prev: window.page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_clamped() {
        assert_eq!(PageWindow::resolve(None, Some(0)).page_size, 1);
        assert_eq!(PageWindow::resolve(None, Some(500)).page_size, MAX_PAGE_SIZE);
        assert_eq!(PageWindow::resolve(None, None).page_size, DEFAULT_PAGE_SIZE);
        assert_eq!(PageWindow::resolve(Some(0), None).page, 1);
    }

    #[test]
    fn test_page_info_math() {
        let window = PageWindow { page: 2, page_size: 10 };
        let info = PageInfo::new(window, 25);
        assert_eq!(info.total_pages, 3);
        assert!(info.has_next);
        assert!(info.has_prev);

        let last = PageInfo::new(PageWindow { page: 3, page_size: 10 }, 25);
        assert!(!last.has_next);

        let empty = PageInfo::new(PageWindow { page: 1, page_size: 10 }, 0);
        assert_eq!(empty.total_pages, 1);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }

    #[test]
    fn test_skip_window() {
        assert_eq!(PageWindow { page: 1, page_size: 20 }.skip(), 0);
        assert_eq!(PageWindow { page: 4, page_size: 25 }.skip(), 75);
    }
}
