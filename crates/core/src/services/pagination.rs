//! Page bookkeeping for paginated listings.

use fedblog_common::{AppError, AppResult};
use serde::Serialize;

/// Highest page number a listing accepts.
pub const MAX_PAGE: u64 = 100_000;

/// One page of a listing.
#[derive(Debug, Clone)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
}

/// Pagination metadata as sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total: u64,
    pub per_page: u64,
    pub current_page: u64,
    pub last_page: u64,
    pub first_page: u64,
}

impl<T> Paginated<T> {
    /// Build a page; `current_page` is 1-based.
    #[must_use]
    pub const fn new(items: Vec<T>, total: u64, per_page: u64, current_page: u64) -> Self {
        Self {
            items,
            total,
            per_page,
            current_page,
        }
    }

    /// Metadata for this page.
    #[must_use]
    pub fn meta(&self) -> PageMeta {
        let per_page = self.per_page.max(1);
        PageMeta {
            total: self.total,
            per_page,
            current_page: self.current_page,
            last_page: self.total.div_ceil(per_page).max(1),
            first_page: 1,
        }
    }

    /// Convert every item, keeping the page bookkeeping.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            per_page: self.per_page,
            current_page: self.current_page,
        }
    }
}

/// Normalize a 1-based page number; zero and absent mean the first page.
#[must_use]
pub fn page_or_first(page: Option<u64>) -> u64 {
    page.unwrap_or(1).max(1)
}

/// Like [`page_or_first`], rejecting page numbers above [`MAX_PAGE`].
pub fn checked_page(page: Option<u64>) -> AppResult<u64> {
    let page = page_or_first(page);
    if page > MAX_PAGE {
        return Err(AppError::Validation(
            "La page demandée n'est pas valide.".to_string(),
        ));
    }
    Ok(page)
}
