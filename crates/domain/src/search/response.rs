//! Paginated-search response payload

use serde::{Deserialize, Serialize};

/// One page of results from a paginated-search endpoint.
///
/// Produced only by the remote resource and treated as opaque
/// pass-through by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequestResponse<T> {
    /// The page of items, in server order.
    pub data: Vec<T>,
    /// One-based index of this page.
    pub page: u32,
    /// Page size the server applied.
    pub limit: u32,
    /// Total number of pages.
    pub total_pages: u32,
    /// Total number of items across all pages.
    pub total: u64,
}
