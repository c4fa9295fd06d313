//! # acton-repository
//!
//! Declarative query-condition compiler and generic repository for PostgreSQL.
//!
//! ## Features
//!
//! - **Condition trees**: leaves, nested groups and raw builder callbacks compiled to
//!   parameterized SQL
//! - **Relations**: left, inner and count joins declared per entity
//! - **Pagination**: 1-indexed pages with total and page counts
//! - **Transactions**: every operation runs on an optional caller-owned transaction
//! - **Configuration**: layered Figment config with XDG paths and `ACTON_` environment overrides
//! - **Observability**: JSON `tracing` output filtered by the configured log level
//!
//! ## Example
//!
//! ```rust,no_run
//! use acton_repository::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let database = config
//!         .database
//!         .clone()
//!         .ok_or_else(|| Error::Internal("database is not configured".to_string()))?;
//!     let pool = create_pool(&database).await?;
//!
//!     let tokens: AccessTokenRepository =
//!         BaseRepository::with_config(PgExecutor::new(pool), config.repository);
//!
//!     let page = tokens
//!         .find_many(
//!             &FindManyParams {
//!                 conditions: vec![ConditionNode::where_(
//!                     "resource_owner_type",
//!                     Operator::Equal,
//!                     "User",
//!                 )],
//!                 pagination: Pagination::page(1, 20),
//!                 orders: vec![OrderSpec::desc("created_at")],
//!                 ..Default::default()
//!             },
//!             None,
//!         )
//!         .await?;
//!
//!     info!(total = page.total, pages = page.total_pages, "Loaded access tokens");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod database;
pub mod entities;
pub mod error;
pub mod observability;
pub mod repository;

pub mod prelude {
    //! Common imports

    pub use crate::config::{Config, DatabaseConfig, RepositoryConfig, ServiceConfig};
    pub use crate::database::create_pool;
    pub use crate::entities::{
        AccessToken, AccessTokenRepository, NewAccessToken, NewStorageFile, StorageFile,
        StorageFileRepository,
    };
    pub use crate::error::{Error, Result};
    pub use crate::observability::init_tracing;
    pub use crate::repository::{
        BaseRepository, Cardinality, Changeset, ColumnRef, ConditionNode, Entity, FilterValue,
        FindManyParams, FindManyResult, GetOneParams, JoinCondition, JoinType, Operator,
        OrderDirection, OrderSpec, Pagination, PgExecutor, QueryExecutor, RelationDef,
        RelationSpec, RepositoryError, RepositoryErrorKind, RepositoryResult, WhereType,
    };

    pub use serde::{Deserialize, Serialize};

    // Re-export tracing macros and types
    pub use tracing::{debug, error, info, trace, warn};

    // Re-export tokio for async runtime
    pub use tokio;
}
