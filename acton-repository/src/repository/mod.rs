//! Declarative query compilation and the generic repository
//!
//! This module lowers condition trees, relation requests, orderings and
//! pagination into parameterized PostgreSQL statements and executes them.
//!
//! # Features
//!
//! - **Conditions**: [`ConditionNode`] leaves, nested groups and builder callbacks
//! - **Compilation**: [`compile`] produces a [`Predicate`] plus its [`Bindings`]
//! - **Relations**: [`RelationSpec`] left, inner and count joins over [`RelationDef`]s
//! - **Pagination**: 1-indexed [`Pagination`] with [`total_pages`]
//! - **Execution**: [`BaseRepository`] over any [`QueryExecutor`], [`PgExecutor`] by default
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_repository::repository::{
//!     BaseRepository, ConditionNode, FilterValue, FindManyParams, Operator, PgExecutor,
//!     WhereType,
//! };
//!
//! let repo: BaseRepository<StorageFile> = BaseRepository::new(PgExecutor::new(pool));
//!
//! let params = FindManyParams {
//!     conditions: vec![
//!         ConditionNode::where_("disk", Operator::Equal, "s3"),
//!         ConditionNode::group(
//!             WhereType::And,
//!             vec![
//!                 ConditionNode::where_("mime_type", Operator::StartWith, "image/"),
//!                 ConditionNode::or("size", Operator::LessThan, 1024),
//!             ],
//!         ),
//!         ConditionNode::builder(|qb| {
//!             qb.and_where(
//!                 "storage_files.created_at > now() - interval '7 days' AND size <= :max_size",
//!                 [("max_size", FilterValue::from(10_485_760))],
//!             )
//!         }),
//!     ],
//!     ..Default::default()
//! };
//!
//! let page = repo.find_many(&params, None).await?;
//! ```

mod base;
mod compiler;
mod condition;
mod error;
mod pagination;
mod postgres;
mod relation;
mod statement;
#[cfg(test)]
pub(crate) mod testing;
mod traits;

// Re-export all public types
pub use base::{BaseRepository, FindManyParams, FindManyResult, GetOneParams};
pub use compiler::{compile, Bindings, Predicate, WhereBuilder};
pub use condition::{
    ColumnRef, Condition, ConditionFn, ConditionNode, FilterValue, Operator, WhereType,
};
pub use error::{RepositoryError, RepositoryErrorKind, RepositoryOperation};
pub use pagination::{total_pages, OrderDirection, OrderSpec, PageWindow, Pagination};
pub use postgres::PgExecutor;
pub use relation::{
    attach_relations, Cardinality, JoinCondition, JoinType, RelationDef, RelationSpec,
};
pub use statement::{Changeset, SelectQuery, Statement};
pub use traits::{Entity, QueryExecutor, RepositoryResult};
