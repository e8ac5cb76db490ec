//! Paginated-search request payload

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::search::SearchFilter;

/// Sort direction for a paginated search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Ascending order.
    Asc,
    /// Descending order.
    #[default]
    Desc,
}

impl SortOrder {
    /// Returns the order as its wire string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(DomainError::InvalidSortOrder(other.to_string())),
        }
    }
}

/// The wire payload sent to a paginated-search endpoint.
///
/// Field names are the contract with the remote resource and serialize
/// exactly as `page`, `limit`, `sortBy`, `sortOrder`, `search`, `filters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// One-based page index.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Field the results are sorted by.
    pub sort_by: String,
    /// Sort direction.
    pub sort_order: SortOrder,
    /// Free-text search term.
    pub search: String,
    /// Per-field filters, keyed by field name.
    pub filters: BTreeMap<String, SearchFilter>,
}

impl Default for SearchRequest {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 15,
            sort_by: "createdAt".to_string(),
            sort_order: SortOrder::Desc,
            search: String::new(),
            filters: BTreeMap::new(),
        }
    }
}
