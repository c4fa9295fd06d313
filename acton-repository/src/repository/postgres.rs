//! PostgreSQL executor backed by `sqlx`

use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{Arguments, FromRow, PgPool, Postgres};

use super::condition::FilterValue;
use super::error::{RepositoryError, RepositoryOperation};
use super::statement::Statement;
use super::traits::{QueryExecutor, RepositoryResult};

/// Runs statements on a [`PgPool`], or on a caller's transaction
#[derive(Debug, Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Begin a transaction to pass into repository operations
    pub async fn begin(&self) -> RepositoryResult<sqlx::Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            RepositoryError::from(e).with_operation(RepositoryOperation::Begin)
        })
    }
}

impl From<PgPool> for PgExecutor {
    fn from(pool: PgPool) -> Self {
        Self::new(pool)
    }
}

fn encode_error(operation: RepositoryOperation, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::serialization_error(operation, format!("Failed to bind argument: {}", err))
}

/// Bind one value; lists bind as homogeneous PostgreSQL arrays
fn add_value(
    args: &mut PgArguments,
    value: &FilterValue,
    operation: RepositoryOperation,
) -> RepositoryResult<()> {
    let added = match value {
        FilterValue::Boolean(b) => args.add(*b),
        FilterValue::Integer(n) => args.add(*n),
        FilterValue::Float(n) => args.add(*n),
        FilterValue::String(s) => args.add(s.clone()),
        FilterValue::Uuid(id) => args.add(*id),
        FilterValue::Timestamp(ts) => args.add(*ts),
        FilterValue::List(items) => return add_list(args, items, operation),
    };
    added.map_err(|e| encode_error(operation, e))
}

fn add_list(
    args: &mut PgArguments,
    items: &[FilterValue],
    operation: RepositoryOperation,
) -> RepositoryResult<()> {
    fn collect<T>(
        items: &[FilterValue],
        pick: impl Fn(&FilterValue) -> Option<T>,
        operation: RepositoryOperation,
    ) -> RepositoryResult<Vec<T>> {
        items
            .iter()
            .map(|item| {
                pick(item).ok_or_else(|| {
                    RepositoryError::serialization_error(
                        operation,
                        "List values must all have the same type",
                    )
                })
            })
            .collect()
    }

    let Some(first) = items.first() else {
        return Err(RepositoryError::serialization_error(
            operation,
            "Cannot infer the element type of an empty list",
        ));
    };

    let added = match first {
        FilterValue::Boolean(_) => args.add(collect(
            items,
            |v| match v {
                FilterValue::Boolean(b) => Some(*b),
                _ => None,
            },
            operation,
        )?),
        FilterValue::Integer(_) => args.add(collect(
            items,
            |v| match v {
                FilterValue::Integer(n) => Some(*n),
                _ => None,
            },
            operation,
        )?),
        FilterValue::Float(_) => args.add(collect(
            items,
            |v| match v {
                FilterValue::Float(n) => Some(*n),
                FilterValue::Integer(n) => Some(*n as f64),
                _ => None,
            },
            operation,
        )?),
        FilterValue::String(_) => args.add(collect(
            items,
            |v| match v {
                FilterValue::String(s) => Some(s.clone()),
                _ => None,
            },
            operation,
        )?),
        FilterValue::Uuid(_) => args.add(collect(
            items,
            |v| match v {
                FilterValue::Uuid(id) => Some(*id),
                _ => None,
            },
            operation,
        )?),
        FilterValue::Timestamp(_) => args.add(collect(
            items,
            |v| match v {
                FilterValue::Timestamp(ts) => Some(*ts),
                _ => None,
            },
            operation,
        )?),
        FilterValue::List(_) => {
            return Err(RepositoryError::serialization_error(
                operation,
                "Nested lists cannot be bound",
            ))
        }
    };
    added.map_err(|e| encode_error(operation, e))
}

fn arguments(statement: &Statement, operation: RepositoryOperation) -> RepositoryResult<PgArguments> {
    let mut args = PgArguments::default();
    for value in statement.args() {
        add_value(&mut args, value, operation)?;
    }
    Ok(args)
}

impl<E> QueryExecutor<E> for PgExecutor
where
    E: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static,
{
    type Transaction = sqlx::Transaction<'static, Postgres>;

    async fn fetch_all(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> RepositoryResult<Vec<E>> {
        let operation = RepositoryOperation::Query;
        let args = arguments(statement, operation)?;
        tracing::debug!(sql = %statement.sql(), params = statement.args().len(), "Executing query");

        let query = sqlx::query_as_with::<_, E, _>(statement.sql(), args);
        let rows = match tx {
            Some(tx) => query.fetch_all(&mut **tx).await,
            None => query.fetch_all(&self.pool).await,
        };
        rows.map_err(|e| RepositoryError::from(e).with_operation(operation))
    }

    async fn fetch_count(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> RepositoryResult<u64> {
        let operation = RepositoryOperation::Count;
        let args = arguments(statement, operation)?;
        tracing::debug!(sql = %statement.sql(), params = statement.args().len(), "Executing count");

        let query = sqlx::query_scalar_with::<_, i64, _>(statement.sql(), args);
        let count = match tx {
            Some(tx) => query.fetch_one(&mut **tx).await,
            None => query.fetch_one(&self.pool).await,
        }
        .map_err(|e| RepositoryError::from(e).with_operation(operation))?;

        u64::try_from(count).map_err(|_| {
            RepositoryError::serialization_error(operation, format!("Negative row count {}", count))
        })
    }

    async fn execute(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> RepositoryResult<u64> {
        let operation = RepositoryOperation::Execute;
        let args = arguments(statement, operation)?;
        tracing::debug!(sql = %statement.sql(), params = statement.args().len(), "Executing statement");

        let query = sqlx::query_with(statement.sql(), args);
        let result = match tx {
            Some(tx) => query.execute(&mut **tx).await,
            None => query.execute(&self.pool).await,
        }
        .map_err(|e| RepositoryError::from(e).with_operation(operation))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::error::RepositoryErrorKind;
    use crate::repository::statement::{Changeset, SelectQuery};

    #[test]
    fn test_arguments_bind_scalars_and_lists() {
        let changes = Changeset::new()
            .set("token", "abc")
            .set("resource_owner_id", 7)
            .set("scopes", vec!["read", "write"]);
        let statement = Statement::insert("access_tokens", &changes);
        assert!(arguments(&statement, RepositoryOperation::Create).is_ok());
    }

    #[test]
    fn test_mixed_list_is_rejected() {
        let mut args = PgArguments::default();
        let items = vec![FilterValue::Integer(1), FilterValue::from("two")];
        let err = add_list(&mut args, &items, RepositoryOperation::Create).unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::SerializationError);
    }

    #[test]
    fn test_empty_list_is_rejected() {
        let mut args = PgArguments::default();
        let err = add_list(&mut args, &[], RepositoryOperation::Create).unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::SerializationError);
        assert_eq!(err.operation, RepositoryOperation::Create);
    }

    fn unreachable_executor() -> PgExecutor {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(200))
            .connect_lazy("postgres://nobody@127.0.0.1:1/none")
            .unwrap();
        PgExecutor::new(pool)
    }

    #[tokio::test]
    async fn test_direct_executor_errors_carry_neutral_operations() {
        let executor = unreachable_executor();

        let err = executor.begin().await.unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::Begin);
        assert!(err.is_retriable());

        let statement = Statement::delete("access_tokens", &[("id", FilterValue::Integer(1))]);
        let err = QueryExecutor::<crate::entities::AccessToken>::execute(
            &executor, &statement, None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::Execute);

        let statement = SelectQuery::new("access_tokens").to_select().unwrap();
        let err = QueryExecutor::<crate::entities::AccessToken>::fetch_all(
            &executor, &statement, None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.operation, RepositoryOperation::Query);
    }

    #[test]
    fn test_integers_widen_inside_float_lists() {
        let mut args = PgArguments::default();
        let items = vec![FilterValue::Float(1.5), FilterValue::Integer(2)];
        assert!(add_list(&mut args, &items, RepositoryOperation::Create).is_ok());
    }
}
