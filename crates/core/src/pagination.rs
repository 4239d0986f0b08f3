//! Offset pagination for stored event listings.
//!
//! Pages are 1-based. Page numbers below one are treated as the first page and
//! page sizes have no upper bound; callers that accept user input are expected
//! to substitute defaults before building a request.

/// Default number of events per page in the event log.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A request for one page of results.
///
/// ```
/// use shoplog_core::PageRequest;
///
/// let request = PageRequest::new(3, 10);
/// assert_eq!(request.offset(), 20);
/// assert_eq!(request.limit(), 10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Create a request for `page` (1-based) with `page_size` items per page.
    ///
    /// A page of zero is clamped to one. A page size of zero falls back to
    /// [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub const fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            page_size: if page_size == 0 {
                DEFAULT_PAGE_SIZE
            } else {
                page_size
            },
        }
    }

    /// Build a request from loosely-typed query parameters.
    ///
    /// Missing, non-numeric, zero, or negative values fall back to page one
    /// and [`DEFAULT_PAGE_SIZE`] respectively.
    #[must_use]
    pub fn from_params(page: Option<&str>, page_size: Option<&str>) -> Self {
        let parse = |value: Option<&str>| {
            value
                .and_then(|v| v.trim().parse::<i64>().ok())
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0)
        };
        Self::new(parse(page), parse(page_size))
    }

    /// The 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Maximum number of rows to fetch.
    #[must_use]
    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }

    /// Number of rows to skip: `(page - 1) * page_size`, saturating at
    /// `i64::MAX` so huge requests land past the last page.
    #[must_use]
    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1).saturating_mul(i64::from(self.page_size))
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

/// One page of results plus the totals needed to render pagination controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    /// The items on this page (may be empty past the last page).
    pub items: Vec<T>,
    /// Total number of items across all pages.
    pub total: u64,
    /// The request that produced this page.
    pub request: PageRequest,
}

impl<T> Page<T> {
    /// Create a new page.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, request: PageRequest) -> Self {
        Self {
            items,
            total,
            request,
        }
    }

    /// Total number of pages: `ceil(total / page_size)`.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        self.total.div_ceil(u64::from(self.request.page_size()))
    }

    /// The 1-based number of this page.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.request.page()
    }

    /// Whether a previous page exists.
    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.request.page() > 1
    }

    /// Whether a next page exists.
    #[must_use]
    pub fn has_next(&self) -> bool {
        u64::from(self.request.page()) < self.total_pages()
    }

    /// Transform the items while keeping the totals.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            request: self.request,
        }
    }
}
