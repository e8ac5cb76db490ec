//! Filter descriptors attached to a search request

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator attached to a filter value.
///
/// Purely descriptive metadata for the remote resource; the client never
/// interprets operator semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    /// Substring match.
    Contains,
    /// Exact match.
    Equals,
    /// Strictly-less-than comparison.
    LessThan,
    /// Strictly-greater-than comparison.
    GreaterThan,
    /// Prefix match.
    StartsWith,
    /// Suffix match.
    EndsWith,
    /// Membership in a list of values.
    In,
    /// Inclusive range between two values.
    Between,
}

/// A filter value together with its operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchFilter {
    /// The value to compare against; any JSON shape the operator expects.
    pub value: Value,
    /// The comparison the remote resource should apply.
    pub operator: FilterOperator,
}

impl SearchFilter {
    /// Creates a filter from a value and operator.
    #[must_use]
    pub fn new(value: impl Into<Value>, operator: FilterOperator) -> Self {
        Self {
            value: value.into(),
            operator,
        }
    }
}
