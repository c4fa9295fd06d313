//! Repository trait definitions
//!
//! - [`Entity`]: table metadata a row type declares about itself
//! - [`QueryExecutor`]: runs rendered statements against a store
//!
//! Both use RPITIT (Return Position Impl Trait In Traits) for async methods
//! instead of `async_trait`.
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_repository::repository::{Entity, FilterValue, RelationDef};
//! use sqlx::types::Json;
//!
//! #[derive(sqlx::FromRow)]
//! struct Account {
//!     id: i32,
//!     email: String,
//!     // Filled by `RelationSpec::left("profile", "profile")`
//!     #[sqlx(default)]
//!     profile: Option<Json<Profile>>,
//!     // Filled by `RelationSpec::left("posts", "posts")`
//!     #[sqlx(default)]
//!     posts: Option<Json<Vec<Post>>>,
//!     // Filled by `RelationSpec::count("posts", "post_count")`
//!     #[sqlx(default)]
//!     post_count: Option<i64>,
//! }
//!
//! impl Entity for Account {
//!     const TABLE: &'static str = "accounts";
//!
//!     fn primary_key_values(&self) -> Vec<FilterValue> {
//!         vec![self.id.into()]
//!     }
//!
//!     fn relations() -> &'static [RelationDef] {
//!         const RELATIONS: &[RelationDef] = &[
//!             RelationDef::one("accounts", "profile", "profiles", "id", "account_id"),
//!             RelationDef::many("accounts", "posts", "posts", "id", "author_id"),
//!         ];
//!         RELATIONS
//!     }
//! }
//! ```

use std::future::Future;

use super::condition::FilterValue;
use super::error::RepositoryError;
use super::relation::RelationDef;
use super::statement::Statement;

/// Result type for repository operations
pub type RepositoryResult<T> = std::result::Result<T, RepositoryError>;

/// A row type backed by a table
///
/// Relations requested through a `RelationSpec` arrive as extra result
/// columns named after the relation alias. A row type receives them with
/// `#[sqlx(default)]` fields of that name, so queries without the relation
/// still decode:
///
/// - to-one joins: `Option<sqlx::types::Json<T>>`, `None` when absent
/// - to-many joins: `Option<sqlx::types::Json<Vec<T>>>`, an empty list when absent
/// - count joins: `Option<i64>`
pub trait Entity: Send + Sync + Unpin + 'static {
    /// Table name; also the default alias in compiled queries
    const TABLE: &'static str;

    /// Primary-key columns, in declaration order
    const PRIMARY_KEY: &'static [&'static str] = &["id"];

    /// Primary-key values of this row, aligned with [`Entity::PRIMARY_KEY`]
    fn primary_key_values(&self) -> Vec<FilterValue>;

    /// Relations that can be joined from this entity's table
    fn relations() -> &'static [RelationDef] {
        &[]
    }
}

/// Executes rendered statements
///
/// Every method takes an optional transaction; when present the statement
/// runs on it instead of the executor's own connection source.
pub trait QueryExecutor<E>: Send + Sync {
    /// Caller-owned unit of work
    type Transaction: Send;

    /// Run a row-returning statement and materialize every row
    fn fetch_all(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> impl Future<Output = RepositoryResult<Vec<E>>> + Send;

    /// Run a statement returning a single count
    fn fetch_count(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Run a statement for its side effects; returns the affected row count
    fn execute(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> impl Future<Output = RepositoryResult<u64>> + Send;
}
