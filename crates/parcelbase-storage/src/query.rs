//! Structured query model for the backend's generic query primitive.
//!
//! A [`SelectQuery`] describes a read over one table: equality/pattern
//! filters, optional ordering, optional row limit. Rows come back as
//! [`serde_json::Value`] — the backend owns the schema, callers give rows
//! structure at the edge.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single row filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// Exact match on a column.
    Eq { field: String, value: Value },
    /// Case-insensitive substring match on a text column.
    Like { field: String, pattern: String },
    /// Membership in a value set.
    In { field: String, values: Vec<Value> },
    /// Column is null.
    IsNull { field: String },
}

impl Filter {
    /// Equality filter, accepting anything serializable as the value.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Substring filter.
    #[must_use]
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::Like {
            field: field.into(),
            pattern: pattern.into(),
        }
    }

    /// Membership filter.
    #[must_use]
    pub fn is_in(field: impl Into<String>, values: Vec<Value>) -> Self {
        Self::In {
            field: field.into(),
            values,
        }
    }

    /// Null-check filter.
    #[must_use]
    pub fn is_null(field: impl Into<String>) -> Self {
        Self::IsNull {
            field: field.into(),
        }
    }

    /// Check whether a row matches this filter.
    ///
    /// Used by in-memory backends; network backends translate filters into
    /// their own query syntax instead.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        match self {
            Self::Eq { field, value } => row.get(field) == Some(value),
            Self::Like { field, pattern } => match row.get(field) {
                Some(Value::String(s)) => {
                    s.to_lowercase().contains(&pattern.to_lowercase())
                }
                _ => false,
            },
            Self::In { field, values } => match row.get(field) {
                Some(v) => values.contains(v),
                None => false,
            },
            Self::IsNull { field } => matches!(row.get(field), None | Some(Value::Null)),
        }
    }
}

/// Sort order for a select.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    pub ascending: bool,
}

impl OrderBy {
    #[must_use]
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    #[must_use]
    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// A read over one table.
///
/// Built with chained methods:
///
/// ```
/// use parcelbase_storage::{Filter, OrderBy, SelectQuery};
///
/// let query = SelectQuery::table("packages")
///     .filter(Filter::eq("status", "arrived"))
///     .order(OrderBy::desc("created_at"))
///     .limit(50);
/// assert_eq!(query.table, "packages");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectQuery {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Option<OrderBy>,
    pub limit: Option<usize>,
}

impl SelectQuery {
    /// Start a query over `table`.
    #[must_use]
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
            limit: None,
        }
    }

    /// Add a filter; filters combine with AND.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Set the sort order.
    #[must_use]
    pub fn order(mut self, order: OrderBy) -> Self {
        self.order = Some(order);
        self
    }

    /// Cap the number of returned rows.
    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Check whether a row passes every filter.
    #[must_use]
    pub fn matches(&self, row: &Value) -> bool {
        self.filters.iter().all(|f| f.matches(row))
    }
}
