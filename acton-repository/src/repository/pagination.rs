//! Pagination and ordering types for repository queries
//!
//! Pages are 1-indexed. Missing or zero values fall back to the configured
//! defaults, and limits are clamped to the configured maximum.
//!
//! # Example
//!
//! ```rust
//! use acton_repository::repository::{total_pages, OrderDirection, OrderSpec, Pagination};
//!
//! let pagination = Pagination::page(3, 20);
//! let window = pagination.resolve(20, 100);
//! assert_eq!(window.offset, 40);
//! assert_eq!(window.limit, 20);
//!
//! let orders = vec![
//!     OrderSpec::desc("created_at"),
//!     OrderSpec::new("id", OrderDirection::Ascending),
//! ];
//! assert_eq!(orders.len(), 2);
//!
//! assert_eq!(total_pages(10, 3), 4);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::ColumnRef;

/// Direction for ordering results
///
/// # Example
///
/// ```rust
/// use acton_repository::repository::OrderDirection;
///
/// assert_eq!(format!("{}", OrderDirection::Ascending), "ASC");
/// assert_eq!(format!("{}", OrderDirection::Descending), "DESC");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Sort in ascending order (A-Z, 0-9)
    #[default]
    #[serde(rename = "ASC")]
    Ascending,
    /// Sort in descending order (Z-A, 9-0)
    #[serde(rename = "DESC")]
    Descending,
}

impl OrderDirection {
    /// SQL keyword
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// One ORDER BY term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSpec {
    pub order_by: ColumnRef,
    #[serde(default, rename = "order_dir")]
    pub direction: OrderDirection,
}

impl OrderSpec {
    pub fn new(order_by: impl Into<ColumnRef>, direction: OrderDirection) -> Self {
        Self {
            order_by: order_by.into(),
            direction,
        }
    }

    pub fn asc(order_by: impl Into<ColumnRef>) -> Self {
        Self::new(order_by, OrderDirection::Ascending)
    }

    pub fn desc(order_by: impl Into<ColumnRef>) -> Self {
        Self::new(order_by, OrderDirection::Descending)
    }

    /// Render as `"table"."column" DIR`, qualifying with `default_alias`
    #[must_use]
    pub fn to_sql(&self, default_alias: &str) -> String {
        format!("{} {}", self.order_by.qualify(default_alias), self.direction)
    }
}

/// Requested page (1-indexed) and page size
///
/// # Example
///
/// ```rust
/// use acton_repository::repository::Pagination;
///
/// // Nothing requested: defaults apply
/// let window = Pagination::default().resolve(20, 100);
/// assert_eq!((window.offset, window.limit), (0, 20));
///
/// // Oversized limits are clamped
/// let window = Pagination::page(2, 500).resolve(20, 100);
/// assert_eq!((window.offset, window.limit), (100, 100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    /// Page number, starting at 1
    #[serde(default)]
    pub page: Option<u64>,
    /// Maximum number of rows per page
    #[serde(default)]
    pub limit: Option<u64>,
}

impl Pagination {
    /// Pagination for a specific page number (1-indexed)
    #[must_use]
    pub const fn page(page: u64, limit: u64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    /// First page with the given limit
    #[must_use]
    pub const fn first_page(limit: u64) -> Self {
        Self::page(1, limit)
    }

    /// Resolve into a concrete offset/limit window
    ///
    /// Zero or missing values fall back to page 1 and `default_limit`; the
    /// limit never exceeds `max_limit`. Offset and limit are capped at
    /// PostgreSQL's `bigint` maximum.
    #[must_use]
    pub fn resolve(&self, default_limit: u64, max_limit: u64) -> PageWindow {
        let page = self.page.filter(|p| *p > 0).unwrap_or(1);
        let limit = self
            .limit
            .filter(|l| *l > 0)
            .unwrap_or(default_limit)
            .min(max_limit.max(1))
            .min(MAX_SQL_BIGINT);
        PageWindow {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit).min(MAX_SQL_BIGINT),
        }
    }
}

// Largest value accepted by LIMIT and OFFSET
const MAX_SQL_BIGINT: u64 = i64::MAX as u64;

/// A resolved page window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: u64,
    pub limit: u64,
    pub offset: u64,
}

/// Number of pages needed to hold `total` rows at `limit` rows per page
///
/// ```rust
/// use acton_repository::repository::total_pages;
///
/// assert_eq!(total_pages(10, 3), 4);
/// assert_eq!(total_pages(9, 3), 3);
/// assert_eq!(total_pages(0, 3), 0);
/// ```
#[must_use]
pub const fn total_pages(total: u64, limit: u64) -> u64 {
    if limit == 0 {
        return 0;
    }
    let pages = total / limit;
    if total % limit > 0 {
        pages + 1
    } else {
        pages
    }
}
