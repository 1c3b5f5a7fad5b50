use serde::{Deserialize, Serialize};

/// Parameters for the published-post listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostQuery {
    /// 1-based page number.
    pub page: u64,
    /// Page size, 1-100.
    pub limit: u64,
    /// Case-insensitive substring over title and content.
    pub search: Option<String>,
    /// Exact tag-token match over the tag list.
    pub tag: Option<String>,
}

impl Default for PostQuery {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            search: None,
            tag: None,
        }
    }
}

impl PostQuery {
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }
}

/// Pagination metadata attached to listing responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub current_page: u64,
    pub total_pages: u64,
    pub total_posts: u64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PageMeta {
    /// Compute metadata for a page. `limit` must be at least 1 (enforced by
    /// query validation upstream).
    pub fn new(page: u64, limit: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(limit);
        Self {
            current_page: page,
            total_pages,
            total_posts: total,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

/// One page of results plus its metadata.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_first_page_of_ten() {
        let query = PostQuery::default();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn twenty_five_posts_at_ten_per_page() {
        let first = PageMeta::new(1, 10, 25);
        assert_eq!(first.total_pages, 3);
        assert_eq!(first.total_posts, 25);
        assert!(first.has_next);
        assert!(!first.has_prev);

        let last = PageMeta::new(3, 10, 25);
        assert!(!last.has_next);
        assert!(last.has_prev);
    }

    #[test]
    fn empty_result_has_zero_pages() {
        let meta = PageMeta::new(1, 10, 0);
        assert_eq!(meta.total_pages, 0);
        assert!(!meta.has_next);
        assert!(!meta.has_prev);
    }

    #[test]
    fn exact_multiple_does_not_round_up() {
        let meta = PageMeta::new(2, 10, 20);
        assert_eq!(meta.total_pages, 2);
        assert!(!meta.has_next);
        assert!(meta.has_prev);
    }

    #[test]
    fn offset_advances_by_page() {
        let query = PostQuery {
            page: 3,
            limit: 10,
            ..Default::default()
        };
        assert_eq!(query.offset(), 20);
    }
}
