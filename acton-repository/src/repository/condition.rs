//! Declarative condition model
//!
//! A query is filtered by a list of [`ConditionNode`]s. Each node is either a
//! leaf comparison, a parenthesised group of nested nodes, or a builder
//! callback that writes directly into the where-building context.
//!
//! # Example
//!
//! ```rust
//! use acton_repository::repository::{ConditionNode, FilterValue, Operator, WhereType};
//!
//! let conditions = vec![
//!     ConditionNode::where_("status", Operator::Equal, "active"),
//!     ConditionNode::optional(WhereType::And, "name", Operator::Contains, None::<String>),
//!     ConditionNode::group(
//!         WhereType::And,
//!         vec![
//!             ConditionNode::where_("age", Operator::GreaterThanOrEqual, 18),
//!             ConditionNode::or("role", Operator::In, vec!["admin", "owner"]),
//!         ],
//!     ),
//! ];
//! assert_eq!(conditions.len(), 3);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::compiler::WhereBuilder;
use super::error::RepositoryError;
use super::statement::quote_ident;
use super::traits::RepositoryResult;

/// How a condition combines with the conditions before it at the same level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum WhereType {
    /// Sets the predicate of the current scope, replacing anything before it
    #[serde(rename = "WHERE")]
    Where,
    /// Conjoins with the current predicate
    #[serde(rename = "WHERE_AND")]
    And,
    /// Disjoins with the current predicate
    #[serde(rename = "WHERE_OR")]
    Or,
}

impl WhereType {
    /// Wire name of the where type
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Where => "WHERE",
            Self::And => "WHERE_AND",
            Self::Or => "WHERE_OR",
        }
    }
}

impl fmt::Display for WhereType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WhereType {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "WHERE" => Ok(Self::Where),
            "WHERE_AND" => Ok(Self::And),
            "WHERE_OR" => Ok(Self::Or),
            other => Err(RepositoryError::unsupported_where_type(other)),
        }
    }
}

impl TryFrom<String> for WhereType {
    type Error = RepositoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Comparison operators accepted by leaf conditions
///
/// Pattern operators (`StartWith`, `EndWith`, `Contains`, `Contain`) compile
/// to `LIKE` and wrap the bound value with `%` wildcards.
///
/// ```rust
/// use acton_repository::repository::{FilterValue, Operator};
///
/// assert_eq!(Operator::Contains.as_sql(), "LIKE");
/// assert_eq!(
///     Operator::StartWith.apply(FilterValue::from("abc")),
///     FilterValue::from("abc%"),
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    StartWith,
    EndWith,
    Contains,
    Contain,
    Like,
    NotEqual,
    Equal,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    GreaterOrEqualThan,
    LessOrEqualThan,
    LessThanOrEqual,
    In,
    NotIn,
    Between,
}

impl Operator {
    /// Wire name of the operator
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::StartWith => "START_WITH",
            Self::EndWith => "END_WITH",
            Self::Contains => "CONTAINS",
            Self::Contain => "CONTAIN",
            Self::Like => "LIKE",
            Self::NotEqual => "NOT_EQUAL",
            Self::Equal => "EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::LessThan => "LESS_THAN",
            Self::GreaterThanOrEqual => "GREATER_THAN_OR_EQUAL",
            Self::GreaterOrEqualThan => "GREATER_OR_EQUAL_THAN",
            Self::LessOrEqualThan => "LESS_OR_EQUAL_THAN",
            Self::LessThanOrEqual => "LESS_THAN_OR_EQUAL",
            Self::In => "IN",
            Self::NotIn => "NOT_IN",
            Self::Between => "BETWEEN",
        }
    }

    /// SQL comparison token
    #[must_use]
    pub const fn as_sql(&self) -> &'static str {
        match self {
            Self::StartWith | Self::EndWith | Self::Contains | Self::Contain | Self::Like => "LIKE",
            Self::NotEqual => "!=",
            Self::Equal => "=",
            Self::GreaterThan => ">",
            Self::LessThan => "<",
            Self::GreaterThanOrEqual | Self::GreaterOrEqualThan => ">=",
            Self::LessThanOrEqual | Self::LessOrEqualThan => "<=",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
        }
    }

    /// Operators whose value is a list bound as one array parameter
    #[must_use]
    pub const fn is_list(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }

    /// Apply the operator's value transform
    ///
    /// Only the pattern operators change the value; everything else passes
    /// through untouched.
    #[must_use]
    pub fn apply(&self, value: FilterValue) -> FilterValue {
        match self {
            Self::StartWith => FilterValue::String(format!("{}%", value)),
            Self::EndWith => FilterValue::String(format!("%{}", value)),
            Self::Contains | Self::Contain => FilterValue::String(format!("%{}%", value)),
            _ => value,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operator {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let operator = match s {
            "START_WITH" => Self::StartWith,
            "END_WITH" => Self::EndWith,
            "CONTAINS" => Self::Contains,
            "CONTAIN" => Self::Contain,
            "LIKE" => Self::Like,
            "NOT_EQUAL" => Self::NotEqual,
            "EQUAL" => Self::Equal,
            "GREATER_THAN" => Self::GreaterThan,
            "LESS_THAN" => Self::LessThan,
            "GREATER_THAN_OR_EQUAL" => Self::GreaterThanOrEqual,
            "GREATER_OR_EQUAL_THAN" => Self::GreaterOrEqualThan,
            "LESS_OR_EQUAL_THAN" => Self::LessOrEqualThan,
            "LESS_THAN_OR_EQUAL" => Self::LessThanOrEqual,
            "IN" => Self::In,
            "NOT_IN" => Self::NotIn,
            "BETWEEN" => Self::Between,
            other => return Err(RepositoryError::unsupported_operator(other)),
        };
        Ok(operator)
    }
}

impl TryFrom<String> for Operator {
    type Error = RepositoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A value bound into a compiled query
///
/// JSON strings that parse as a UUID or an RFC 3339 timestamp deserialize
/// into the typed variants so they bind with the column's type; any other
/// string stays text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Boolean value
    Boolean(bool),
    /// 64-bit integer value
    Integer(i64),
    /// 64-bit floating point value
    Float(f64),
    /// UUID value
    Uuid(Uuid),
    /// Timestamp value
    Timestamp(DateTime<Utc>),
    /// String value
    String(String),
    /// Ordered list (IN / NOT IN / BETWEEN)
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Items of a list value, `None` for scalars
    pub fn as_list(&self) -> Option<&[FilterValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(n) => write!(f, "{}", n),
            Self::String(s) => f.write_str(s),
            Self::Uuid(id) => write!(f, "{}", id),
            Self::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            Self::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                Ok(())
            }
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&String> for FilterValue {
    fn from(s: &String) -> Self {
        Self::String(s.clone())
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl From<Uuid> for FilterValue {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<DateTime<Utc>> for FilterValue {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::Timestamp(ts)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

/// A column reference, optionally qualified with a table alias
///
/// Unqualified references are resolved against the default alias of the
/// scope they are compiled in. [`ColumnRef::field`] never splits on `.`;
/// the string conversions split on the first `.` as a convenience.
///
/// ```rust
/// use acton_repository::repository::ColumnRef;
///
/// let col = ColumnRef::from("profile.display_name");
/// assert_eq!(col.table.as_deref(), Some("profile"));
/// assert_eq!(col.field, "display_name");
/// assert_eq!(col.qualify("users"), r#""profile"."display_name""#);
/// assert_eq!(ColumnRef::field("email").qualify("users"), r#""users"."email""#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ColumnRef {
    /// Table alias, `None` for the scope's default alias
    pub table: Option<String>,
    /// Column name
    pub field: String,
}

impl ColumnRef {
    /// Unqualified column; the name is taken verbatim
    pub fn field(name: impl Into<String>) -> Self {
        Self {
            table: None,
            field: name.into(),
        }
    }

    /// Column explicitly qualified with a table alias
    pub fn qualified(table: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            field: field.into(),
        }
    }

    /// Split `table.field` on the first `.`
    pub fn parse(path: &str) -> Self {
        match path.split_once('.') {
            Some((table, field)) => Self::qualified(table, field),
            None => Self::field(path),
        }
    }

    /// Quoted, qualified SQL identifier
    #[must_use]
    pub fn qualify(&self, default_alias: &str) -> String {
        let table = self.table.as_deref().unwrap_or(default_alias);
        format!("{}.{}", quote_ident(table), quote_ident(&self.field))
    }

    /// Parameter name derived from the field
    ///
    /// Characters that cannot appear in a parameter name become `_`.
    #[must_use]
    pub fn param_name(&self) -> String {
        self.field
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect()
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.field),
            None => f.write_str(&self.field),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(path: &str) -> Self {
        Self::parse(path)
    }
}

impl From<String> for ColumnRef {
    fn from(path: String) -> Self {
        Self::parse(&path)
    }
}

impl From<ColumnRef> for String {
    fn from(column: ColumnRef) -> Self {
        column.to_string()
    }
}

/// A leaf comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub where_type: WhereType,
    /// `None` or an empty field name drops the leaf during compilation
    #[serde(default)]
    pub column: Option<ColumnRef>,
    pub operator: Operator,
    /// `None` drops the leaf during compilation
    #[serde(default)]
    pub value: Option<FilterValue>,
}

impl Condition {
    /// Column the leaf filters on, `None` when it is unset
    pub fn target(&self) -> Option<&ColumnRef> {
        self.column.as_ref().filter(|column| !column.field.is_empty())
    }
}

/// Escape-hatch callback receiving the live where-building context
///
/// Whatever the callback writes bypasses the declarative checks; parameters
/// it binds still go through [`WhereBuilder`]'s binding map.
#[derive(Clone)]
pub struct ConditionFn(Arc<dyn Fn(&mut WhereBuilder<'_>) -> RepositoryResult<()> + Send + Sync>);

impl ConditionFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&mut WhereBuilder<'_>) -> RepositoryResult<()> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, builder: &mut WhereBuilder<'_>) -> RepositoryResult<()> {
        (self.0)(builder)
    }
}

impl fmt::Debug for ConditionFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ConditionFn(..)")
    }
}

/// One node of a condition tree
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "ConditionSpec")]
pub enum ConditionNode {
    /// A single comparison
    Leaf(Condition),
    /// Nested conditions compiled into a parenthesised sub-expression
    Group {
        where_type: WhereType,
        conditions: Vec<ConditionNode>,
    },
    /// Raw callback into the where-building context
    Builder(ConditionFn),
}

impl ConditionNode {
    /// Leaf with an optional value; `None` is skipped at compile time
    pub fn optional<T>(
        where_type: WhereType,
        column: impl Into<ColumnRef>,
        operator: Operator,
        value: Option<T>,
    ) -> Self
    where
        T: Into<FilterValue>,
    {
        Self::Leaf(Condition {
            where_type,
            column: Some(column.into()),
            operator,
            value: value.map(Into::into),
        })
    }

    /// `WHERE` leaf
    pub fn where_(
        column: impl Into<ColumnRef>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self::optional(WhereType::Where, column, operator, Some(value))
    }

    /// `WHERE_AND` leaf
    pub fn and(
        column: impl Into<ColumnRef>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self::optional(WhereType::And, column, operator, Some(value))
    }

    /// `WHERE_OR` leaf
    pub fn or(
        column: impl Into<ColumnRef>,
        operator: Operator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self::optional(WhereType::Or, column, operator, Some(value))
    }

    /// Parenthesised group of nested conditions
    pub fn group(where_type: WhereType, conditions: Vec<ConditionNode>) -> Self {
        Self::Group {
            where_type,
            conditions,
        }
    }

    /// Builder callback node
    pub fn builder<F>(f: F) -> Self
    where
        F: Fn(&mut WhereBuilder<'_>) -> RepositoryResult<()> + Send + Sync + 'static,
    {
        Self::Builder(ConditionFn::new(f))
    }
}

impl From<Condition> for ConditionNode {
    fn from(condition: Condition) -> Self {
        Self::Leaf(condition)
    }
}

// Wire shape of a condition; builder callbacks have no serialized form.
#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionSpec {
    Group {
        where_type: WhereType,
        conditions: Vec<ConditionNode>,
    },
    Leaf(Condition),
}

impl From<ConditionSpec> for ConditionNode {
    fn from(spec: ConditionSpec) -> Self {
        match spec {
            ConditionSpec::Group {
                where_type,
                conditions,
            } => Self::Group {
                where_type,
                conditions,
            },
            ConditionSpec::Leaf(condition) => Self::Leaf(condition),
        }
    }
}
