//! Pagination for record listings (100 records per page)

use serde::{Deserialize, Serialize};

/// Page size for every listing
pub const PAGE_SIZE: i64 = 100;

/// `?page=` query parameter, 1-indexed
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageQuery {
    #[serde(default = "first_page")]
    pub page: i64,
}

fn first_page() -> i64 {
    1
}

impl PageQuery {
    /// Window of this page over a listing of `total` records
    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination::new(total, self.page)
    }
}

/// Where a page starts and how many pages there are
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub total_pages: i64,
    /// Records to skip
    pub offset: i64,
}

impl Pagination {
    /// Clamp `requested` into `[1, total_pages]`
    ///
    /// # Examples
    /// ```
    /// use catequesis_web::pagination::Pagination;
    ///
    /// // 250 catechumens: pages of 100, 100 and 50
    /// let p = Pagination::new(250, 2);
    /// assert_eq!((p.page, p.total_pages, p.offset), (2, 3, 100));
    ///
    /// let p = Pagination::new(250, 99);
    /// assert_eq!((p.page, p.offset), (3, 200));
    /// ```
    pub fn new(total: i64, requested: i64) -> Self {
        let total_pages = (total.max(0) + PAGE_SIZE - 1) / PAGE_SIZE;
        let page = requested.clamp(1, total_pages.max(1));
        Self {
            page,
            total_pages,
            offset: (page - 1) * PAGE_SIZE,
        }
    }

    pub fn next_page(&self) -> Option<i64> {
        (self.page < self.total_pages).then_some(self.page + 1)
    }
}

/// One page of a listing
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_pages: i64,
    /// Absent on the last page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i64>,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(total: i64, pagination: Pagination, items: Vec<T>) -> Self {
        Self {
            total,
            page: pagination.page,
            page_size: PAGE_SIZE,
            total_pages: pagination.total_pages,
            next_page: pagination.next_page(),
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requested_page_is_clamped() {
        assert_eq!(Pagination::new(150, 1), Pagination { page: 1, total_pages: 2, offset: 0 });
        assert_eq!(Pagination::new(150, 99).offset, 100);
        assert_eq!(Pagination::new(150, -3).page, 1);
        assert_eq!(Pagination::new(200, 3).page, 2);
    }

    #[test]
    fn test_empty_listing_has_one_blank_page() {
        let p = Pagination::new(0, 4);
        assert_eq!(p, Pagination { page: 1, total_pages: 0, offset: 0 });
        assert_eq!(p.next_page(), None);
    }

    #[test]
    fn test_next_page_stops_at_last() {
        assert_eq!(Pagination::new(250, 2).next_page(), Some(3));
        assert_eq!(Pagination::new(250, 3).next_page(), None);
    }

    #[test]
    fn test_page_from_query() {
        let query: PageQuery = serde_json::from_str("{}").unwrap();
        let page = Page::new(120, query.pagination(120), vec!["a"]);
        let written = serde_json::to_value(&page).unwrap();
        assert_eq!(written["page"], 1);
        assert_eq!(written["next_page"], 2);
        assert_eq!(written["page_size"], 100);
    }
}
