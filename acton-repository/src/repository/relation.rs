//! Relation attachment
//!
//! Entities declare the relations they can join through [`RelationDef`];
//! callers request them per query with [`RelationSpec`]. Left and inner
//! joins hydrate the related rows into a `jsonb` column named after the
//! relation alias: an object (or NULL) for to-one relations, an array for
//! to-many relations. Count joins add a correlated `COUNT(*)` column.
//!
//! A query with hydrating joins groups its rows by the base entity's primary
//! key, so every entity appears once no matter how many related rows match,
//! and `LIMIT`/`OFFSET` page over entities.
//!
//! # Example
//!
//! ```rust
//! use acton_repository::repository::{
//!     attach_relations, JoinCondition, Operator, OrderSpec, RelationDef, RelationSpec,
//!     SelectQuery,
//! };
//!
//! const RELATIONS: &[RelationDef] = &[
//!     RelationDef::one("users", "profile", "profiles", "id", "user_id"),
//!     RelationDef::many("users", "posts", "posts", "id", "author_id"),
//! ];
//!
//! let mut query = SelectQuery::new("users");
//! attach_relations(
//!     &mut query,
//!     &[
//!         RelationSpec::left("profile", "profile").with_order(OrderSpec::asc("city")),
//!         RelationSpec::count("posts", "post_count").with_condition(JoinCondition::new(
//!             "published",
//!             Operator::Equal,
//!             "true",
//!         )),
//!     ],
//!     RELATIONS,
//! )
//! .unwrap();
//!
//! let sql = query.to_select().unwrap().sql().to_string();
//! assert!(sql.contains(r#"LEFT JOIN "profiles" AS "profile" ON "profile"."user_id" = "users"."id""#));
//! assert!(sql.contains(r#"GROUP BY "users"."id""#));
//! assert!(sql.ends_with(r#"ORDER BY MIN("profile"."city") ASC"#));
//! ```

use serde::{Deserialize, Serialize};

use super::condition::{ColumnRef, Operator};
use super::error::RepositoryError;
use super::pagination::OrderSpec;
use super::statement::{quote_ident, SelectQuery};
use super::traits::RepositoryResult;

/// How many target rows one owner row relates to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Hydrated as a `jsonb` object, NULL when absent
    One,
    /// Hydrated as a `jsonb` array, empty when absent
    Many,
}

/// A relation an entity table can join
///
/// The join condition is `target.target_column = owner.owner_column`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationDef {
    /// Table declaring the relation
    pub owner_table: &'static str,
    /// Relation property name used in [`RelationSpec::column`]
    pub property: &'static str,
    /// Joined table
    pub target_table: &'static str,
    pub owner_column: &'static str,
    pub target_column: &'static str,
    pub cardinality: Cardinality,
}

impl RelationDef {
    /// To-one relation (many-to-one or one-to-one)
    #[must_use]
    pub const fn one(
        owner_table: &'static str,
        property: &'static str,
        target_table: &'static str,
        owner_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            owner_table,
            property,
            target_table,
            owner_column,
            target_column,
            cardinality: Cardinality::One,
        }
    }

    /// To-many relation (one-to-many)
    #[must_use]
    pub const fn many(
        owner_table: &'static str,
        property: &'static str,
        target_table: &'static str,
        owner_column: &'static str,
        target_column: &'static str,
    ) -> Self {
        Self {
            cardinality: Cardinality::Many,
            ..Self::one(owner_table, property, target_table, owner_column, target_column)
        }
    }
}

/// How a relation is joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    /// `LEFT JOIN`, related rows hydrated
    #[default]
    Left,
    /// `INNER JOIN`, related rows hydrated; entities without a match drop out
    Inner,
    /// Related-row count only
    Count,
}

/// Extra predicate appended to a join's ON clause
///
/// The value is interpolated into the SQL verbatim. It is never bound as a
/// parameter, so it must not carry untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinCondition {
    pub column: ColumnRef,
    pub operator: Operator,
    /// Raw SQL operand
    pub value: String,
}

impl JoinCondition {
    pub fn new(column: impl Into<ColumnRef>, operator: Operator, value: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            operator,
            value: value.into(),
        }
    }

    fn to_sql(&self, relation_alias: &str) -> String {
        format!(
            "{} {} {}",
            self.column.qualify(relation_alias),
            self.operator.as_sql(),
            self.value
        )
    }
}

/// A relation requested for one query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationSpec {
    /// `parent_alias.property`, or just `property` on the base alias
    pub column: ColumnRef,
    /// Alias of the joined table in this query
    pub alias: String,
    #[serde(default)]
    pub join_type: JoinType,
    #[serde(default)]
    pub join_condition: Option<JoinCondition>,
    #[serde(default)]
    pub order: Option<OrderSpec>,
}

impl RelationSpec {
    pub fn new(column: impl Into<ColumnRef>, alias: impl Into<String>, join_type: JoinType) -> Self {
        Self {
            column: column.into(),
            alias: alias.into(),
            join_type,
            join_condition: None,
            order: None,
        }
    }

    pub fn left(column: impl Into<ColumnRef>, alias: impl Into<String>) -> Self {
        Self::new(column, alias, JoinType::Left)
    }

    pub fn inner(column: impl Into<ColumnRef>, alias: impl Into<String>) -> Self {
        Self::new(column, alias, JoinType::Inner)
    }

    pub fn count(column: impl Into<ColumnRef>, alias: impl Into<String>) -> Self {
        Self::new(column, alias, JoinType::Count)
    }

    #[must_use]
    pub fn with_condition(mut self, condition: JoinCondition) -> Self {
        self.join_condition = Some(condition);
        self
    }

    #[must_use]
    pub fn with_order(mut self, order: OrderSpec) -> Self {
        self.order = Some(order);
        self
    }
}

/// Attach `relations` to `query` in order
///
/// A relation's parent is either the query's base alias or the alias of a
/// relation attached before it.
pub fn attach_relations(
    query: &mut SelectQuery,
    relations: &[RelationSpec],
    defs: &[RelationDef],
) -> RepositoryResult<()> {
    for relation in relations {
        attach_relation(query, relation, defs)?;
    }
    Ok(())
}

fn attach_relation(
    query: &mut SelectQuery,
    relation: &RelationSpec,
    defs: &[RelationDef],
) -> RepositoryResult<()> {
    let parent = relation
        .column
        .table
        .clone()
        .unwrap_or_else(|| query.alias().to_string());
    let property = relation.column.field.as_str();

    let parent_table = query
        .table_of(&parent)
        .ok_or_else(|| RepositoryError::unknown_relation(&relation.column))?;
    let def = defs
        .iter()
        .find(|def| def.owner_table == parent_table && def.property == property)
        .ok_or_else(|| RepositoryError::unknown_relation(&relation.column))?;

    let alias = relation.alias.as_str();
    let quoted_alias = quote_ident(alias);
    let mut on = format!(
        "{}.{} = {}.{}",
        quoted_alias,
        quote_ident(def.target_column),
        quote_ident(&parent),
        quote_ident(def.owner_column)
    );
    if let Some(condition) = &relation.join_condition {
        on.push_str(" AND ");
        on.push_str(&condition.to_sql(alias));
    }

    match relation.join_type {
        JoinType::Left | JoinType::Inner => {
            query.register_alias(alias, Some(def.target_table))?;
            let keyword = if relation.join_type == JoinType::Left {
                "LEFT JOIN"
            } else {
                "INNER JOIN"
            };
            query.push_join(format!(
                "{} {} AS {} ON {}",
                keyword,
                quote_ident(def.target_table),
                quoted_alias,
                on
            ));
            query.push_hydration(hydration(def, &quoted_alias));
            if let Some(order) = &relation.order {
                query.push_relation_order(order, alias);
            }
        }
        JoinType::Count => {
            if parent != query.alias() {
                return Err(RepositoryError::invalid_condition(format!(
                    "Count relation '{}' must hang off the base alias '{}'",
                    relation.column,
                    query.alias()
                )));
            }
            query.register_alias(alias, None)?;
            query.push_selection(format!(
                "(SELECT COUNT(*) FROM {} AS {} WHERE {}) AS {}",
                quote_ident(def.target_table),
                quoted_alias,
                on,
                quoted_alias
            ));
            if let Some(order) = &relation.order {
                query.push_output_order(alias, order.direction);
            }
        }
    }

    tracing::debug!(
        relation = %relation.column,
        alias,
        join_type = ?relation.join_type,
        "Attached relation"
    );
    Ok(())
}

// Aggregated jsonb column for one hydrated relation; rows where the join
// found nothing carry a NULL target column and are filtered out.
fn hydration(def: &RelationDef, quoted_alias: &str) -> String {
    let present = format!("{}.{} IS NOT NULL", quoted_alias, quote_ident(def.target_column));
    match def.cardinality {
        Cardinality::One => format!(
            "(jsonb_agg(to_jsonb({alias}.*)) FILTER (WHERE {present})) -> 0 AS {alias}",
            alias = quoted_alias,
            present = present
        ),
        Cardinality::Many => format!(
            "COALESCE(jsonb_agg(DISTINCT to_jsonb({alias}.*)) FILTER (WHERE {present}), '[]'::jsonb) AS {alias}",
            alias = quoted_alias,
            present = present
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::compiler::compile;
    use crate::repository::condition::ConditionNode;
    use crate::repository::error::RepositoryErrorKind;

    const DEFS: &[RelationDef] = &[
        RelationDef::one("users", "profile", "profiles", "id", "user_id"),
        RelationDef::many("users", "posts", "posts", "id", "author_id"),
        RelationDef::one("profiles", "address", "addresses", "address_id", "id"),
    ];

    fn select(relations: &[RelationSpec]) -> RepositoryResult<String> {
        let mut query = SelectQuery::new("users");
        attach_relations(&mut query, relations, DEFS)?;
        Ok(query.to_select()?.sql().to_string())
    }

    #[test]
    fn test_left_join_hydrates_alias_column() {
        let sql = select(&[RelationSpec::left("profile", "profile")]).unwrap();
        assert_eq!(
            sql,
            r#"SELECT "users".*, (jsonb_agg(to_jsonb("profile".*)) FILTER (WHERE "profile"."user_id" IS NOT NULL)) -> 0 AS "profile" FROM "users" AS "users" LEFT JOIN "profiles" AS "profile" ON "profile"."user_id" = "users"."id" GROUP BY "users"."id""#
        );
    }

    #[test]
    fn test_to_many_join_hydrates_array_once_per_entity() {
        let mut query = SelectQuery::new("users");
        attach_relations(&mut query, &[RelationSpec::left("posts", "posts")], DEFS).unwrap();
        query.set_window(3, 0);
        assert!(query.is_grouped());

        let sql = query.to_select().unwrap().sql().to_string();
        assert_eq!(
            sql,
            r#"SELECT "users".*, COALESCE(jsonb_agg(DISTINCT to_jsonb("posts".*)) FILTER (WHERE "posts"."author_id" IS NOT NULL), '[]'::jsonb) AS "posts" FROM "users" AS "users" LEFT JOIN "posts" AS "posts" ON "posts"."author_id" = "users"."id" GROUP BY "users"."id" LIMIT 3 OFFSET 0"#
        );
    }

    #[test]
    fn test_count_only_query_is_not_grouped() {
        let mut query = SelectQuery::new("users");
        attach_relations(&mut query, &[RelationSpec::count("posts", "post_count")], DEFS).unwrap();
        assert!(!query.is_grouped());
    }

    #[test]
    fn test_inner_join_with_raw_condition() {
        let sql = select(&[RelationSpec::inner("users.posts", "post").with_condition(
            JoinCondition::new("status", Operator::Equal, "'published'"),
        )])
        .unwrap();
        assert!(sql.contains(
            r#"INNER JOIN "posts" AS "post" ON "post"."author_id" = "users"."id" AND "post"."status" = 'published'"#
        ));
    }

    #[test]
    fn test_count_join_adds_subquery_column() {
        let sql = select(&[RelationSpec::count("posts", "post_count")]).unwrap();
        assert_eq!(
            sql,
            r#"SELECT "users".*, (SELECT COUNT(*) FROM "posts" AS "post_count" WHERE "post_count"."author_id" = "users"."id") AS "post_count" FROM "users" AS "users""#
        );
    }

    #[test]
    fn test_count_order_sorts_by_alias() {
        let sql = select(&[
            RelationSpec::count("posts", "post_count").with_order(OrderSpec::desc("id"))
        ])
        .unwrap();
        assert!(sql.ends_with(r#"ORDER BY "post_count" DESC"#));
    }

    #[test]
    fn test_nested_relation_through_parent_alias() {
        let sql = select(&[
            RelationSpec::left("profile", "profile"),
            RelationSpec::left("profile.address", "address"),
        ])
        .unwrap();
        assert!(sql.contains(
            r#"LEFT JOIN "addresses" AS "address" ON "address"."id" = "profile"."address_id""#
        ));
    }

    #[test]
    fn test_relation_order_follows_base_orders() {
        let mut query = SelectQuery::new("users");
        query.push_order(&OrderSpec::desc("created_at"));
        attach_relations(
            &mut query,
            &[RelationSpec::left("profile", "profile").with_order(OrderSpec::asc("city"))],
            DEFS,
        )
        .unwrap();
        let sql = query.to_select().unwrap().sql().to_string();
        assert!(sql.ends_with(r#"ORDER BY "users"."created_at" DESC, MIN("profile"."city") ASC"#));
    }

    #[test]
    fn test_unknown_relation_is_rejected() {
        let err = select(&[RelationSpec::left("comments", "comment")]).unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::UnknownRelation);

        let err = select(&[RelationSpec::left("ghost.profile", "profile")]).unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::UnknownRelation);
    }

    #[test]
    fn test_cannot_join_through_count_alias() {
        let err = select(&[
            RelationSpec::count("profile", "profile"),
            RelationSpec::left("profile.address", "address"),
        ])
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::UnknownRelation);
    }

    #[test]
    fn test_count_through_joined_alias_is_rejected() {
        let err = select(&[
            RelationSpec::left("profile", "profile"),
            RelationSpec::count("profile.address", "address_count"),
        ])
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidCondition);
    }

    #[test]
    fn test_duplicate_alias_is_rejected() {
        let err = select(&[
            RelationSpec::left("profile", "p"),
            RelationSpec::count("posts", "p"),
        ])
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidCondition);
    }

    #[test]
    fn test_relation_filter_binds_field_name() {
        let mut query = SelectQuery::new("users");
        attach_relations(&mut query, &[RelationSpec::inner("profile", "profile")], DEFS).unwrap();
        let (predicate, bindings) = compile(
            &[ConditionNode::where_("profile.city", Operator::Equal, "Oslo")],
            query.alias(),
        )
        .unwrap();
        query.set_filter(predicate, bindings);

        let statement = query.to_select().unwrap();
        assert!(statement
            .sql()
            .ends_with(r#"WHERE "profile"."city" = $1 GROUP BY "users"."id""#));
    }

    #[test]
    fn test_relation_spec_deserialize() {
        let spec: RelationSpec = serde_json::from_str(
            r#"{
                "column": "users.posts",
                "alias": "post_count",
                "join_type": "count",
                "order": {"order_by": "id", "order_dir": "DESC"}
            }"#,
        )
        .unwrap();
        assert_eq!(spec.join_type, JoinType::Count);
        assert_eq!(spec.column.table.as_deref(), Some("users"));
        assert!(spec.join_condition.is_none());

        let spec: RelationSpec =
            serde_json::from_str(r#"{"column": "profile", "alias": "profile"}"#).unwrap();
        assert_eq!(spec.join_type, JoinType::Left);
    }
}
