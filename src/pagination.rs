use serde::{Deserialize, Serialize};

/// Page-number pagination envelope: `{count, next, previous, results}`.
#[derive(Serialize, Deserialize, Debug)]
pub struct Page<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

/// Resolved `page`/`limit` pair for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Missing or non-positive values fall back to page 1 and the default
    /// size; the size is capped at `max_limit`. The page is clamped so the
    /// offset stays representable.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let limit = limit
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(max_limit)
            .max(1);
        let page = page.filter(|p| *p > 0).unwrap_or(1).min(i64::MAX / limit);

        Self { page, limit }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl<T> Page<T> {
    /// `base_path` may already carry a query string; the page and limit
    /// parameters are appended to it.
    pub fn from_rows(rows: Vec<T>, total: i64, request: PageRequest, base_path: &str) -> Self {
        let link = |page: i64| {
            let separator = if base_path.contains('?') { '&' } else { '?' };
            format!(
                "{}{}page={}&limit={}",
                base_path, separator, page, request.limit
            )
        };

        let next = if request.page.saturating_mul(request.limit) < total {
            Some(link(request.page + 1))
        } else {
            None
        };

        let previous = if request.page > 1 {
            Some(link(request.page - 1))
        } else {
            None
        };

        Self {
            count: total,
            next,
            previous,
            results: rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_request_defaults_and_caps() {
        let request = PageRequest::new(None, None, 6, 100);
        assert_eq!(request, PageRequest { page: 1, limit: 6 });

        let request = PageRequest::new(Some(0), Some(1000), 6, 100);
        assert_eq!(request, PageRequest { page: 1, limit: 100 });
        assert_eq!(PageRequest::new(Some(3), Some(10), 6, 100).offset(), 20);
    }

    #[test]
    fn test_page_links() {
        let request = PageRequest::new(Some(2), Some(2), 6, 100);
        let page = Page::from_rows(vec![3, 4], 5, request, "/api/recipes?author=1");

        assert_eq!(page.count, 5);
        assert_eq!(
            page.next.as_deref(),
            Some("/api/recipes?author=1&page=3&limit=2")
        );
        assert_eq!(
            page.previous.as_deref(),
            Some("/api/recipes?author=1&page=1&limit=2")
        );

        let last = Page::from_rows(vec![5], 5, PageRequest::new(Some(3), Some(2), 6, 100), "/x");
        assert!(last.next.is_none());
    }

    #[test]
    fn test_huge_page_is_clamped() {
        let request = PageRequest::new(Some(i64::MAX), Some(10), 6, 100);
        assert_eq!(request.page, i64::MAX / 10);
        assert!(request.offset() > 0);

        let page = Page::<i64>::from_rows(vec![], 3, request, "/api/recipes");
        assert!(page.next.is_none());
        assert!(page.results.is_empty());
        assert!(page.previous.is_some());
    }
}
