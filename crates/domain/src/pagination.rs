use crate::errors::DomainError;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

const INVALID_PAGE_OR_LIMIT: &str = "Invalid page or limit value.";

/// Validated page/limit pair. Both values are always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: usize,
    limit: usize,
}

impl PageRequest {
    pub fn new(page: i64, limit: i64) -> Result<Self, DomainError> {
        if page <= 0 || limit <= 0 {
            return Err(DomainError::InvalidInput(INVALID_PAGE_OR_LIMIT.to_string()));
        }
        let page = usize::try_from(page)
            .map_err(|_| DomainError::InvalidInput(INVALID_PAGE_OR_LIMIT.to_string()))?;
        let limit = usize::try_from(limit)
            .map_err(|_| DomainError::InvalidInput(INVALID_PAGE_OR_LIMIT.to_string()))?;
        Ok(Self { page, limit })
    }

    /// Builds a request from raw query-string values. Missing values fall back
    /// to page 1 and `default_limit`; anything that is not a plain positive
    /// integer (`"1.5"`, `"abc"`, `"-1"`, `"0"`) is rejected.
    pub fn from_query(
        page: Option<&str>,
        limit: Option<&str>,
        default_limit: usize,
    ) -> Result<Self, DomainError> {
        let page = match page {
            Some(raw) => parse_positive(raw)?,
            None => DEFAULT_PAGE as i64,
        };
        let limit = match limit {
            Some(raw) => parse_positive(raw)?,
            None => i64::try_from(default_limit)
                .map_err(|_| DomainError::InvalidInput(INVALID_PAGE_OR_LIMIT.to_string()))?,
        };
        Self::new(page, limit)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Index of the first item on this page.
    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

fn parse_positive(raw: &str) -> Result<i64, DomainError> {
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(DomainError::InvalidInput(INVALID_PAGE_OR_LIMIT.to_string())),
    }
}

/// One page of a larger result set. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub current_page: usize,
    pub has_next_page: bool,
    pub items: Vec<T>,
}

/// Slices `data` into the requested page.
///
/// Fails with [`DomainError::InvalidInput`] when `page` or `limit` is not positive.
/// Pages past the end yield no items and `has_next_page == false`.
pub fn paginate<T>(data: Vec<T>, page: i64, limit: i64) -> Result<Page<T>, DomainError> {
    let request = PageRequest::new(page, limit)?;
    Ok(paginate_with(data, request))
}

pub fn paginate_with<T>(data: Vec<T>, request: PageRequest) -> Page<T> {
    let start_index = request.offset();
    let end_index = start_index.saturating_add(request.limit);
    let has_next_page = end_index < data.len();

    let items = data
        .into_iter()
        .skip(start_index)
        .take(request.limit)
        .collect();

    Page {
        current_page: request.page,
        has_next_page,
        items,
    }
}
