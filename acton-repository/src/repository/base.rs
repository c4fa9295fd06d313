//! Generic repository over a single entity table
//!
//! [`BaseRepository`] compiles declarative conditions, relations, orderings
//! and pagination into statements and runs them through a
//! [`QueryExecutor`]. Every operation accepts an optional transaction; when
//! one is supplied all of the operation's statements run on it.
//!
//! # Example
//!
//! ```rust,ignore
//! use acton_repository::repository::{
//!     BaseRepository, ConditionNode, FindManyParams, Operator, OrderSpec, Pagination, PgExecutor,
//! };
//!
//! let repo: BaseRepository<AccessToken> = BaseRepository::new(PgExecutor::new(pool));
//!
//! let page = repo
//!     .find_many(
//!         &FindManyParams {
//!             conditions: vec![ConditionNode::where_("resource_owner_id", Operator::Equal, 42)],
//!             pagination: Pagination::page(2, 10),
//!             orders: vec![OrderSpec::desc("created_at")],
//!             ..Default::default()
//!         },
//!         None,
//!     )
//!     .await?;
//!
//! println!("{} of {} tokens, {} pages", page.rows.len(), page.total, page.total_pages);
//! ```

use std::marker::PhantomData;

use serde::{Deserialize, Serialize};

use super::compiler::compile;
use super::condition::{ColumnRef, ConditionNode, FilterValue, Operator};
use super::error::{RepositoryError, RepositoryOperation};
use super::pagination::{total_pages, OrderSpec, Pagination};
use super::postgres::PgExecutor;
use super::relation::{attach_relations, RelationSpec};
use super::statement::{Changeset, SelectQuery, Statement};
use super::traits::{Entity, QueryExecutor, RepositoryResult};
use crate::config::RepositoryConfig;

/// Parameters of [`BaseRepository::find_many`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FindManyParams {
    pub conditions: Vec<ConditionNode>,
    pub relations: Vec<RelationSpec>,
    pub pagination: Pagination,
    /// First entry is the primary ordering
    pub orders: Vec<OrderSpec>,
}

/// Parameters of [`BaseRepository::get_one`]
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GetOneParams {
    pub conditions: Vec<ConditionNode>,
    pub relations: Vec<RelationSpec>,
}

impl GetOneParams {
    pub fn new(conditions: Vec<ConditionNode>) -> Self {
        Self {
            conditions,
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_relations(mut self, relations: Vec<RelationSpec>) -> Self {
        self.relations = relations;
        self
    }
}

/// One page of rows plus totals over the unpaginated result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FindManyResult<E> {
    pub rows: Vec<E>,
    pub total: u64,
    pub total_pages: u64,
}

/// Repository for entity `E` executing through `X`
pub struct BaseRepository<E, X = PgExecutor> {
    executor: X,
    config: RepositoryConfig,
    _entity: PhantomData<fn() -> E>,
}

impl<E, X: Clone> Clone for BaseRepository<E, X> {
    fn clone(&self) -> Self {
        Self {
            executor: self.executor.clone(),
            config: self.config,
            _entity: PhantomData,
        }
    }
}

impl<E, X: std::fmt::Debug> std::fmt::Debug for BaseRepository<E, X> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BaseRepository")
            .field("entity", &std::any::type_name::<E>())
            .field("executor", &self.executor)
            .field("config", &self.config)
            .finish()
    }
}

impl<E, X> BaseRepository<E, X>
where
    E: Entity,
    X: QueryExecutor<E>,
{
    pub fn new(executor: X) -> Self {
        Self::with_config(executor, RepositoryConfig::default())
    }

    pub fn with_config(executor: X, config: RepositoryConfig) -> Self {
        Self {
            executor,
            config,
            _entity: PhantomData,
        }
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Compile conditions and relations into a query over `E::TABLE`
    pub fn build_query(
        &self,
        conditions: &[ConditionNode],
        relations: &[RelationSpec],
    ) -> RepositoryResult<SelectQuery> {
        let mut query = SelectQuery::new(E::TABLE).with_primary_key(E::PRIMARY_KEY);
        if !conditions.is_empty() {
            let (predicate, bindings) = compile(conditions, query.alias())?;
            query.set_filter(predicate, bindings);
        }
        if !relations.is_empty() {
            attach_relations(&mut query, relations, E::relations())?;
        }
        Ok(query)
    }

    /// One page of matching rows with the total count and page count
    pub async fn find_many(
        &self,
        params: &FindManyParams,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<FindManyResult<E>> {
        self.find_many_inner(params, tx)
            .await
            .map_err(|e| self.tag(e, RepositoryOperation::FindMany))
    }

    async fn find_many_inner(
        &self,
        params: &FindManyParams,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<FindManyResult<E>> {
        let mut query = self.build_query(&params.conditions, &params.relations)?;
        for order in &params.orders {
            query.push_order(order);
        }
        let window = params
            .pagination
            .resolve(self.config.default_page_size, self.config.max_page_size);
        query.set_window(window.limit, window.offset);

        let page = query.to_select()?;
        let count = query.to_count()?;

        let (rows, total) = match tx {
            Some(tx) => {
                let rows = self.executor.fetch_all(&page, Some(&mut *tx)).await?;
                let total = self.executor.fetch_count(&count, Some(tx)).await?;
                (rows, total)
            }
            None => tokio::try_join!(
                self.executor.fetch_all(&page, None),
                self.executor.fetch_count(&count, None)
            )?,
        };

        tracing::debug!(
            entity = E::TABLE,
            page = window.page,
            rows = rows.len(),
            total,
            "find_many completed"
        );

        Ok(FindManyResult {
            rows,
            total,
            total_pages: total_pages(total, window.limit),
        })
    }

    /// The first matching row, or `NotFound`
    pub async fn get_one(
        &self,
        params: &GetOneParams,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        self.get_one_inner(&params.conditions, &params.relations, tx)
            .await
            .map_err(|e| self.tag(e, RepositoryOperation::GetOne))
    }

    async fn get_one_inner(
        &self,
        conditions: &[ConditionNode],
        relations: &[RelationSpec],
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        let mut query = self.build_query(conditions, relations)?;
        query.set_limit(1);
        let statement = query.to_select()?;

        self.executor
            .fetch_all(&statement, tx)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found(E::TABLE))
    }

    /// Reload `entity` by primary key with `relations` attached
    pub async fn get_relations(
        &self,
        entity: &E,
        relations: &[RelationSpec],
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        let result = async {
            let conditions: Vec<ConditionNode> = Self::primary_key_of(entity)?
                .into_iter()
                .map(|(column, value)| {
                    ConditionNode::and(ColumnRef::field(column), Operator::Equal, value)
                })
                .collect();
            self.get_one_inner(&conditions, relations, tx).await
        }
        .await;
        result.map_err(|e| self.tag(e, RepositoryOperation::GetRelations))
    }

    /// Insert a row and return it as stored
    pub async fn create_one(
        &self,
        changeset: &Changeset,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        let statement = Statement::insert(E::TABLE, changeset);
        let result = async {
            self.executor
                .fetch_all(&statement, tx)
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| {
                    RepositoryError::database_error(
                        RepositoryOperation::Create,
                        "INSERT returned no row",
                    )
                })
        }
        .await;
        result.map_err(|e| self.tag(e, RepositoryOperation::Create))
    }

    /// Apply `changeset` to the first row matching `conditions`
    ///
    /// An empty changeset returns the matched row without writing.
    pub async fn update_one(
        &self,
        conditions: &[ConditionNode],
        changeset: &Changeset,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        self.update_one_inner(conditions, changeset, tx)
            .await
            .map_err(|e| self.tag(e, RepositoryOperation::Update))
    }

    async fn update_one_inner(
        &self,
        conditions: &[ConditionNode],
        changeset: &Changeset,
        mut tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        let existing = self.get_one_inner(conditions, &[], tx.as_deref_mut()).await?;
        if changeset.is_empty() {
            return Ok(existing);
        }

        let key = Self::primary_key_of(&existing)?;
        let statement = Statement::update(E::TABLE, changeset, &key);
        self.executor
            .fetch_all(&statement, tx)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| RepositoryError::not_found(E::TABLE))
    }

    /// Delete the first row matching `conditions` and return it
    pub async fn remove_one(
        &self,
        conditions: &[ConditionNode],
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        self.remove_one_inner(conditions, tx)
            .await
            .map_err(|e| self.tag(e, RepositoryOperation::Remove))
    }

    async fn remove_one_inner(
        &self,
        conditions: &[ConditionNode],
        mut tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<E> {
        let existing = self.get_one_inner(conditions, &[], tx.as_deref_mut()).await?;
        let key = Self::primary_key_of(&existing)?;
        let statement = Statement::delete(E::TABLE, &key);
        let affected = self.executor.execute(&statement, tx).await?;
        if affected == 0 {
            return Err(RepositoryError::not_found(E::TABLE));
        }
        Ok(existing)
    }

    /// Number of distinct rows matching `conditions`
    pub async fn count(
        &self,
        conditions: &[ConditionNode],
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<u64> {
        let result = async {
            let statement = self.build_query(conditions, &[])?.to_count()?;
            self.executor.fetch_count(&statement, tx).await
        }
        .await;
        result.map_err(|e| self.tag(e, RepositoryOperation::Count))
    }

    fn primary_key_of(entity: &E) -> RepositoryResult<Vec<(&'static str, FilterValue)>> {
        let values = entity.primary_key_values();
        if values.len() != E::PRIMARY_KEY.len() {
            return Err(RepositoryError::invalid_condition(format!(
                "{} declares {} primary key column(s) but the entity returned {} value(s)",
                E::TABLE,
                E::PRIMARY_KEY.len(),
                values.len()
            )));
        }
        Ok(E::PRIMARY_KEY.iter().copied().zip(values).collect())
    }

    fn tag(&self, err: RepositoryError, operation: RepositoryOperation) -> RepositoryError {
        let mut err = err.with_operation(operation);
        if err.entity_type.is_none() {
            err.entity_type = Some(E::TABLE.to_string());
        }
        err
    }
}
