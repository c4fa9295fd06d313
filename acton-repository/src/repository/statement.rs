//! SQL statement assembly
//!
//! [`SelectQuery`] holds the pieces of a read query (selections, joins, the
//! compiled predicate, orderings and the page window) and renders them into
//! an executable [`Statement`]. Statements carry PostgreSQL positional
//! placeholders (`$1`, `$2`, ...) and the argument values in placeholder
//! order. List parameters expand to one placeholder per element.

use std::collections::HashMap;

use super::compiler::{Bindings, Fragment, Predicate};
use super::condition::FilterValue;
use super::error::RepositoryError;
use super::pagination::{OrderDirection, OrderSpec};
use super::traits::RepositoryResult;

/// Quote an SQL identifier, doubling embedded quotes
pub(crate) fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// An executable statement with positional arguments
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statement {
    sql: String,
    args: Vec<FilterValue>,
}

impl Statement {
    /// Statement text with `$n` placeholders
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Arguments in placeholder order
    pub fn args(&self) -> &[FilterValue] {
        &self.args
    }

    fn push_sql(&mut self, sql: &str) {
        self.sql.push_str(sql);
    }

    fn push_arg(&mut self, value: FilterValue) -> String {
        self.args.push(value);
        format!("${}", self.args.len())
    }

    /// Render a named-parameter predicate into this statement
    fn push_predicate(&mut self, predicate: &Predicate, bindings: &Bindings) -> RepositoryResult<()> {
        let mut scalars: HashMap<&str, String> = HashMap::new();

        for fragment in predicate.fragments() {
            match fragment {
                Fragment::Sql(sql) => self.push_sql(sql),
                Fragment::Param(name) => {
                    if let Some(placeholder) = scalars.get(name.as_str()) {
                        let placeholder = placeholder.clone();
                        self.push_sql(&placeholder);
                        continue;
                    }
                    let value = lookup(bindings, name)?;
                    let placeholder = self.push_arg(value.clone());
                    self.push_sql(&placeholder);
                    scalars.insert(name.as_str(), placeholder);
                }
                Fragment::ParamList(name) => {
                    let items = match lookup(bindings, name)? {
                        FilterValue::List(items) => items.clone(),
                        scalar => vec![scalar.clone()],
                    };
                    if items.is_empty() {
                        return Err(RepositoryError::invalid_condition(format!(
                            "List parameter ':...{}' is empty",
                            name
                        )));
                    }
                    let placeholders: Vec<String> =
                        items.into_iter().map(|item| self.push_arg(item)).collect();
                    self.push_sql(&placeholders.join(", "));
                }
            }
        }
        Ok(())
    }

    /// `INSERT ... RETURNING *`
    pub fn insert(table: &str, changeset: &Changeset) -> Self {
        let mut statement = Self::default();
        statement.push_sql(&format!("INSERT INTO {}", quote_ident(table)));

        if changeset.is_empty() {
            statement.push_sql(" DEFAULT VALUES RETURNING *");
            return statement;
        }

        let columns: Vec<String> = changeset.columns().map(quote_ident).collect();
        let placeholders: Vec<String> = changeset
            .iter()
            .map(|(_, value)| statement.push_arg(value.clone()))
            .collect();
        statement.push_sql(&format!(
            " ({}) VALUES ({}) RETURNING *",
            columns.join(", "),
            placeholders.join(", ")
        ));
        statement
    }

    /// `UPDATE ... SET ... WHERE <key> RETURNING *`
    pub fn update(table: &str, changeset: &Changeset, key: &[(&str, FilterValue)]) -> Self {
        let mut statement = Self::default();
        let assignments: Vec<String> = changeset
            .iter()
            .map(|(column, value)| {
                let placeholder = statement.push_arg(value.clone());
                format!("{} = {}", quote_ident(column), placeholder)
            })
            .collect();
        let sql = format!(
            "UPDATE {} SET {}",
            quote_ident(table),
            assignments.join(", ")
        );
        statement.push_sql(&sql);
        statement.push_key(key);
        statement.push_sql(" RETURNING *");
        statement
    }

    /// `DELETE ... WHERE <key>`
    pub fn delete(table: &str, key: &[(&str, FilterValue)]) -> Self {
        let mut statement = Self::default();
        statement.push_sql(&format!("DELETE FROM {}", quote_ident(table)));
        statement.push_key(key);
        statement
    }

    fn push_key(&mut self, key: &[(&str, FilterValue)]) {
        let clauses: Vec<String> = key
            .iter()
            .map(|(column, value)| {
                let placeholder = self.push_arg(value.clone());
                format!("{} = {}", quote_ident(column), placeholder)
            })
            .collect();
        self.push_sql(&format!(" WHERE {}", clauses.join(" AND ")));
    }
}

fn lookup<'b>(bindings: &'b Bindings, name: &str) -> RepositoryResult<&'b FilterValue> {
    bindings.get(name).ok_or_else(|| {
        RepositoryError::invalid_condition(format!("Parameter ':{}' is referenced but not bound", name))
    })
}

/// Column assignments for inserts and updates
///
/// Assignments keep insertion order; setting a column again replaces its
/// value in place.
///
/// ```rust
/// use acton_repository::repository::{Changeset, FilterValue};
///
/// let changes = Changeset::new()
///     .set("status", "active")
///     .set("attempts", 3)
///     .set("status", "locked");
///
/// assert_eq!(changes.len(), 2);
/// assert_eq!(changes.get("status"), Some(&FilterValue::from("locked")));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Changeset {
    assignments: Vec<(String, FilterValue)>,
}

impl Changeset {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`Changeset::insert`]
    #[must_use]
    pub fn set(mut self, column: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.insert(column, value);
        self
    }

    /// Assign `value` to `column`, replacing an earlier assignment
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<FilterValue>) {
        let column = column.into();
        let value = value.into();
        match self.assignments.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.assignments.push((column, value)),
        }
    }

    /// Assign only when `value` is `Some`
    pub fn insert_opt<T: Into<FilterValue>>(&mut self, column: impl Into<String>, value: Option<T>) {
        if let Some(value) = value {
            self.insert(column, value);
        }
    }

    pub fn get(&self, column: &str) -> Option<&FilterValue> {
        self.assignments
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, value)| value)
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|(column, _)| column.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.assignments
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }
}

// One ORDER BY term. Columns of joined aliases are aggregated once the
// query groups rows per entity: MIN for ascending, MAX for descending.
#[derive(Debug, Clone)]
struct OrderTerm {
    expr: String,
    direction: OrderDirection,
    joined: bool,
}

impl OrderTerm {
    fn render(&self, grouped: bool) -> String {
        if grouped && self.joined {
            let aggregate = match self.direction {
                OrderDirection::Ascending => "MIN",
                OrderDirection::Descending => "MAX",
            };
            format!("{}({}) {}", aggregate, self.expr, self.direction)
        } else {
            format!("{} {}", self.expr, self.direction)
        }
    }
}

/// A read query under construction
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: String,
    alias: String,
    primary_key: Vec<String>,
    scope: Vec<(String, Option<String>)>,
    selections: Vec<String>,
    joins: Vec<String>,
    grouped: bool,
    predicate: Predicate,
    bindings: Bindings,
    orders: Vec<OrderTerm>,
    relation_orders: Vec<OrderTerm>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQuery {
    /// Query over `table`, aliased by its own name, keyed by `id`
    pub fn new(table: &str) -> Self {
        Self::with_alias(table, table)
    }

    pub fn with_alias(table: &str, alias: &str) -> Self {
        Self {
            table: table.to_string(),
            alias: alias.to_string(),
            primary_key: vec!["id".to_string()],
            scope: vec![(alias.to_string(), Some(table.to_string()))],
            selections: Vec::new(),
            joins: Vec::new(),
            grouped: false,
            predicate: Predicate::default(),
            bindings: Bindings::default(),
            orders: Vec::new(),
            relation_orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Primary-key columns of the base table
    ///
    /// They must be the table's actual primary key: grouped queries rely on
    /// it to select every base column.
    #[must_use]
    pub fn with_primary_key(mut self, columns: &[&str]) -> Self {
        self.primary_key = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Default alias of the query
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Whether rows are grouped per base entity
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    pub(crate) fn set_filter(&mut self, predicate: Predicate, bindings: Bindings) {
        self.predicate = predicate;
        self.bindings = bindings;
    }

    /// Table joined under `alias`; `None` for unknown or count-only aliases
    pub(crate) fn table_of(&self, alias: &str) -> Option<&str> {
        self.scope
            .iter()
            .find(|(a, _)| a == alias)
            .and_then(|(_, table)| table.as_deref())
    }

    /// Reserve `alias`; `table` is `None` when nothing can join through it
    pub(crate) fn register_alias(&mut self, alias: &str, table: Option<&str>) -> RepositoryResult<()> {
        if self.scope.iter().any(|(a, _)| a == alias) {
            return Err(RepositoryError::invalid_condition(format!(
                "Alias '{}' is already used in this query",
                alias
            )));
        }
        self.scope.push((alias.to_string(), table.map(str::to_string)));
        Ok(())
    }

    pub(crate) fn push_selection(&mut self, selection: String) {
        self.selections.push(selection);
    }

    /// Aggregated relation column; switches the query to one row per entity
    pub(crate) fn push_hydration(&mut self, selection: String) {
        self.selections.push(selection);
        self.grouped = true;
    }

    pub(crate) fn push_join(&mut self, join: String) {
        self.joins.push(join);
    }

    /// Base ordering; unqualified columns resolve against the base alias
    pub(crate) fn push_order(&mut self, order: &OrderSpec) {
        let joined = order
            .order_by
            .table
            .as_deref()
            .is_some_and(|table| table != self.alias);
        self.orders.push(OrderTerm {
            expr: order.order_by.qualify(&self.alias),
            direction: order.direction,
            joined,
        });
    }

    /// Relation ordering; unqualified columns resolve against `relation_alias`
    pub(crate) fn push_relation_order(&mut self, order: &OrderSpec, relation_alias: &str) {
        let joined = order
            .order_by
            .table
            .as_deref()
            .unwrap_or(relation_alias)
            != self.alias;
        self.relation_orders.push(OrderTerm {
            expr: order.order_by.qualify(relation_alias),
            direction: order.direction,
            joined,
        });
    }

    /// Relation ordering on an output column such as a count
    pub(crate) fn push_output_order(&mut self, output: &str, direction: OrderDirection) {
        self.relation_orders.push(OrderTerm {
            expr: quote_ident(output),
            direction,
            joined: false,
        });
    }

    pub(crate) fn set_window(&mut self, limit: u64, offset: u64) {
        self.limit = Some(limit);
        self.offset = Some(offset);
    }

    pub(crate) fn set_limit(&mut self, limit: u64) {
        self.limit = Some(limit);
        self.offset = None;
    }

    fn key_columns(&self) -> Vec<String> {
        self.primary_key
            .iter()
            .map(|column| format!("{}.{}", quote_ident(&self.alias), quote_ident(column)))
            .collect()
    }

    fn push_from(&self, statement: &mut Statement) -> RepositoryResult<()> {
        statement.push_sql(&format!(
            " FROM {} AS {}",
            quote_ident(&self.table),
            quote_ident(&self.alias)
        ));
        for join in &self.joins {
            statement.push_sql(" ");
            statement.push_sql(join);
        }
        if !self.predicate.is_empty() {
            statement.push_sql(" WHERE ");
            statement.push_predicate(&self.predicate, &self.bindings)?;
        }
        Ok(())
    }

    /// Page query: every row column plus relation selections
    pub fn to_select(&self) -> RepositoryResult<Statement> {
        let mut statement = Statement::default();
        let mut columns = vec![format!("{}.*", quote_ident(&self.alias))];
        columns.extend(self.selections.iter().cloned());
        statement.push_sql(&format!("SELECT {}", columns.join(", ")));

        self.push_from(&mut statement)?;
        if self.grouped {
            statement.push_sql(&format!(" GROUP BY {}", self.key_columns().join(", ")));
        }

        let orders: Vec<String> = self
            .orders
            .iter()
            .chain(&self.relation_orders)
            .map(|term| term.render(self.grouped))
            .collect();
        if !orders.is_empty() {
            statement.push_sql(&format!(" ORDER BY {}", orders.join(", ")));
        }
        if let Some(limit) = self.limit {
            statement.push_sql(&format!(" LIMIT {}", limit));
        }
        if let Some(offset) = self.offset {
            statement.push_sql(&format!(" OFFSET {}", offset));
        }
        Ok(statement)
    }

    /// Unpaginated count of distinct primary keys
    pub fn to_count(&self) -> RepositoryResult<Statement> {
        let key = self.key_columns();
        let counted = match key.len() {
            0 => "*".to_string(),
            1 => format!("DISTINCT {}", key[0]),
            _ => format!("DISTINCT ({})", key.join(", ")),
        };

        let mut statement = Statement::default();
        statement.push_sql(&format!("SELECT COUNT({})", counted));
        self.push_from(&mut statement)?;
        Ok(statement)
    }
}
