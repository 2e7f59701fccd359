//! Offset-based pagination input and result page.

use serde::{Deserialize, Serialize};

/// Pagination input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Page {
    /// Maximum number of items to return (default 25, capped at 100)
    pub limit: Option<i64>,
    /// Number of items to skip
    pub offset: Option<i64>,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 25;
    pub const MAX_LIMIT: i64 = 100;

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT).clamp(0, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// One page of search results plus the total match count.
#[derive(Debug, Clone, Serialize)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

impl<T> SearchPage<T> {
    /// Whether more matches exist past this page.
    pub fn has_more(&self) -> bool {
        self.offset + (self.items.len() as i64) < self.total
    }
}
