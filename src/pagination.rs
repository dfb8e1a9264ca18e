//! This module defines the common functionality for paging data.

use serde::Deserialize;

/// The page number to default to when not specified in a query.
pub const DEFAULT_PAGE: u64 = 1;
/// The records to request per page when not specified in a query.
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Pagination metadata as reported by the server's list endpoints.
///
/// The zero state (all fields zero) is what a store holds before any page
/// has loaded, and what a list resets to when a response is malformed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// The total number of records matching the query.
    pub total: u64,
    /// The page the most recent response covered (1-based).
    pub page: u64,
    /// The page size the most recent response was produced with.
    pub limit: u64,
    /// The total number of pages at the current limit.
    pub total_pages: u64,
}

impl Pagination {
    /// Whether a further page can be requested.
    ///
    /// This is the single source of truth the UI polls to decide whether to
    /// ask for more records.
    pub fn has_more(&self) -> bool {
        self.page < self.total_pages
    }
}
