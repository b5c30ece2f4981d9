use thiserror::Error;

/// Error for paging parameters outside the accepted range
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaginationError {
    #[error("Page must be a number, got '{0}'")]
    InvalidPage(String),

    #[error("Limit must be a number, got '{0}'")]
    InvalidLimit(String),

    #[error("Page must be greater than 0, got {0}")]
    PageOutOfRange(i64),

    #[error("Limit must be between 1 and {max}, got {actual}")]
    LimitOutOfRange { max: u32, actual: i64 },
}

/// Validated paging and search parameters for list queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    limit: u32,
    search: Option<String>,
}

impl PageRequest {
    pub const DEFAULT_PAGE: u32 = 1;
    pub const DEFAULT_LIMIT: u32 = 10;
    pub const MAX_LIMIT: u32 = 100;

    /// Build a page request, applying defaults for absent values.
    ///
    /// # Errors
    /// * `PageOutOfRange` - page < 1
    /// * `LimitOutOfRange` - limit outside 1..=100
    pub fn new(
        page: Option<i64>,
        limit: Option<i64>,
        search: Option<String>,
    ) -> Result<Self, PaginationError> {
        let page = page.unwrap_or(Self::DEFAULT_PAGE as i64);
        if page < 1 || page > u32::MAX as i64 {
            return Err(PaginationError::PageOutOfRange(page));
        }

        let limit = limit.unwrap_or(Self::DEFAULT_LIMIT as i64);
        if limit < 1 || limit > Self::MAX_LIMIT as i64 {
            return Err(PaginationError::LimitOutOfRange {
                max: Self::MAX_LIMIT,
                actual: limit,
            });
        }

        let search = search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            page: page as u32,
            limit: limit as u32,
            search,
        })
    }

    /// Parse raw query-string values.
    ///
    /// # Errors
    /// * `InvalidPage` / `InvalidLimit` - Non-numeric input
    /// * Range errors from [`PageRequest::new`]
    pub fn parse(
        page: Option<&str>,
        limit: Option<&str>,
        search: Option<String>,
    ) -> Result<Self, PaginationError> {
        let page = page
            .map(|p| {
                p.trim()
                    .parse::<i64>()
                    .map_err(|_| PaginationError::InvalidPage(p.to_string()))
            })
            .transpose()?;
        let limit = limit
            .map(|l| {
                l.trim()
                    .parse::<i64>()
                    .map_err(|_| PaginationError::InvalidLimit(l.to_string()))
            })
            .transpose()?;

        Self::new(page, limit, search)
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        (self.page as u64 - 1) * self.limit as u64
    }

    /// `ILIKE` pattern for the search term with wildcards escaped.
    pub fn search_pattern(&self) -> Option<String> {
        self.search.as_ref().map(|term| {
            let escaped = term
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_");
            format!("%{}%", escaped)
        })
    }

    /// Case-insensitive substring match of the search term against any of `fields`.
    ///
    /// Always true without a search term.
    pub fn matches(&self, fields: &[&str]) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                fields.iter().any(|f| f.to_lowercase().contains(&term))
            }
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::DEFAULT_PAGE,
            limit: Self::DEFAULT_LIMIT,
            search: None,
        }
    }
}

/// One page of rows as read from storage, with the unpaged total.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSlice<T> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub total_pages: u64,
}

/// A page of results plus its paging metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> Page<T> {
    pub fn from_slice(slice: PageSlice<T>, request: &PageRequest) -> Self {
        let limit = request.limit() as u64;
        Self {
            data: slice.items,
            pagination: Pagination {
                page: request.page(),
                limit: request.limit(),
                total: slice.total,
                total_pages: slice.total.div_ceil(limit),
            },
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}
