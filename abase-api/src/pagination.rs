//! Page arithmetic for public catalog listings

/// Records per listing page
pub const PAGE_SIZE: i64 = 50;

/// One page of a listing, already clamped into range
///
/// An empty listing still has one (empty) page, so `page` never exceeds
/// `total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page actually served
    pub page: i64,
    pub total_pages: i64,
    /// Rows to skip before this page
    pub offset: i64,
}

impl Pagination {
    /// Resolve `requested` against a listing of `total` rows
    ///
    /// Pages below 1 serve the first page; pages past the end serve the last.
    ///
    /// # Examples
    /// ```
    /// use abase_api::pagination::Pagination;
    ///
    /// let p = Pagination::for_listing(120, 99);
    /// assert_eq!((p.page, p.total_pages, p.offset), (3, 3, 100));
    ///
    /// let empty = Pagination::for_listing(0, 4);
    /// assert_eq!((empty.page, empty.total_pages), (1, 1));
    /// ```
    pub fn for_listing(total: i64, requested: i64) -> Self {
        let total_pages = ((total.max(0) + PAGE_SIZE - 1) / PAGE_SIZE).max(1);
        let page = requested.clamp(1, total_pages);

        Self {
            page,
            total_pages,
            offset: (page - 1) * PAGE_SIZE,
        }
    }
}
