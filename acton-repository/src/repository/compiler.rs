//! Condition lowering
//!
//! [`compile`] walks a list of [`ConditionNode`]s and produces a
//! [`Predicate`] (SQL fragments referencing named parameters) together with
//! the [`Bindings`] for those parameters. Named parameters render as
//! `:name` for scalars and `:...name` for list parameters; the statement
//! layer turns them into positional placeholders at execution time.
//!
//! # Example
//!
//! ```rust
//! use acton_repository::repository::{compile, ConditionNode, FilterValue, Operator};
//!
//! let (predicate, bindings) = compile(
//!     &[
//!         ConditionNode::where_("name", Operator::Contains, "abc"),
//!         ConditionNode::and("id", Operator::In, vec![1, 2, 3]),
//!     ],
//!     "users",
//! )
//! .unwrap();
//!
//! assert_eq!(
//!     predicate.to_string(),
//!     r#""users"."name" LIKE :name AND "users"."id" IN (:...id)"#
//! );
//! assert_eq!(bindings.get("name"), Some(&FilterValue::from("%abc%")));
//! assert_eq!(bindings.len(), 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use super::condition::{Condition, ConditionNode, FilterValue, Operator, WhereType};
use super::error::RepositoryError;
use super::traits::RepositoryResult;

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Fragment {
    Sql(String),
    Param(String),
    ParamList(String),
}

/// A compiled predicate: SQL text interleaved with named parameters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    fragments: Vec<Fragment>,
}

impl Predicate {
    /// Parse SQL using `:name` / `:...name` parameter syntax
    ///
    /// `::` casts and single-quoted literals are left untouched.
    ///
    /// ```rust
    /// use acton_repository::repository::Predicate;
    ///
    /// let p = Predicate::parse("created_at::date = :day AND note = 'a:b'");
    /// assert_eq!(p.param_names(), vec!["day"]);
    /// ```
    pub fn parse(sql: &str) -> Self {
        let mut predicate = Self::default();
        let chars: Vec<char> = sql.chars().collect();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            if c == '\'' {
                // copy the quoted literal through, including '' escapes
                literal.push(c);
                i += 1;
                while i < chars.len() {
                    literal.push(chars[i]);
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            literal.push('\'');
                            i += 2;
                            continue;
                        }
                        i += 1;
                        break;
                    }
                    i += 1;
                }
                continue;
            }
            if c == ':' {
                if chars.get(i + 1) == Some(&':') {
                    literal.push_str("::");
                    i += 2;
                    continue;
                }
                let spread = chars[i + 1..].starts_with(&['.', '.', '.']);
                let start = if spread { i + 4 } else { i + 1 };
                let end = ident_end(&chars, start);
                if end > start {
                    let name: String = chars[start..end].iter().collect();
                    predicate.push_sql(&literal);
                    literal.clear();
                    if spread {
                        predicate.push_param_list(name);
                    } else {
                        predicate.push_param(name);
                    }
                    i = end;
                    continue;
                }
            }
            literal.push(c);
            i += 1;
        }
        predicate.push_sql(&literal);
        predicate
    }

    /// True when the predicate contains no SQL at all
    pub fn is_empty(&self) -> bool {
        self.fragments.iter().all(|fragment| match fragment {
            Fragment::Sql(sql) => sql.trim().is_empty(),
            _ => false,
        })
    }

    /// Names of every parameter the predicate references, in order
    pub fn param_names(&self) -> Vec<&str> {
        self.fragments
            .iter()
            .filter_map(|fragment| match fragment {
                Fragment::Param(name) | Fragment::ParamList(name) => Some(name.as_str()),
                Fragment::Sql(_) => None,
            })
            .collect()
    }

    pub(crate) fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub(crate) fn push_sql(&mut self, sql: &str) {
        if sql.is_empty() {
            return;
        }
        if let Some(Fragment::Sql(last)) = self.fragments.last_mut() {
            last.push_str(sql);
        } else {
            self.fragments.push(Fragment::Sql(sql.to_string()));
        }
    }

    pub(crate) fn push_param(&mut self, name: String) {
        self.fragments.push(Fragment::Param(name));
    }

    pub(crate) fn push_param_list(&mut self, name: String) {
        self.fragments.push(Fragment::ParamList(name));
    }

    pub(crate) fn append(&mut self, other: Predicate) {
        for fragment in other.fragments {
            match fragment {
                Fragment::Sql(sql) => self.push_sql(&sql),
                other => self.fragments.push(other),
            }
        }
    }

    /// Wrap in parentheses; empty predicates stay empty
    #[must_use]
    pub fn parenthesized(self) -> Self {
        if self.is_empty() {
            return self;
        }
        let mut wrapped = Self::default();
        wrapped.push_sql("(");
        wrapped.append(self);
        wrapped.push_sql(")");
        wrapped
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            match fragment {
                Fragment::Sql(sql) => f.write_str(sql)?,
                Fragment::Param(name) => write!(f, ":{}", name)?,
                Fragment::ParamList(name) => write!(f, ":...{}", name)?,
            }
        }
        Ok(())
    }
}

fn ident_end(chars: &[char], start: usize) -> usize {
    let mut end = start;
    while end < chars.len() {
        let c = chars[end];
        let valid = c == '_' || c.is_ascii_alphabetic() || (end > start && c.is_ascii_digit());
        if !valid {
            break;
        }
        end += 1;
    }
    end
}

/// Named parameter values collected during compilation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings(BTreeMap<String, FilterValue>);

impl Bindings {
    /// Bind `value` under `base`, or `base_1`, `base_2`, ... if taken
    pub(crate) fn bind_unique(&mut self, base: &str, value: FilterValue) -> String {
        let mut name = base.to_string();
        let mut suffix = 0;
        while self.0.contains_key(&name) {
            suffix += 1;
            name = format!("{}_{}", base, suffix);
        }
        self.0.insert(name.clone(), value);
        name
    }

    /// Bind an explicitly named parameter
    ///
    /// Re-binding a name to the same value is a no-op; re-binding it to a
    /// different value is an error rather than a silent overwrite.
    pub fn bind(&mut self, name: impl Into<String>, value: FilterValue) -> RepositoryResult<()> {
        let name = name.into();
        match self.0.get(&name) {
            Some(existing) if *existing != value => Err(RepositoryError::invalid_condition(
                format!("Parameter ':{}' is already bound to a different value", name),
            )),
            Some(_) => Ok(()),
            None => {
                self.0.insert(name, value);
                Ok(())
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Where-building context of a single scope
///
/// One builder exists per nesting level; groups compile in a fresh builder
/// that shares the binding map of the whole compilation. Builder callbacks
/// receive this type directly.
pub struct WhereBuilder<'a> {
    alias: &'a str,
    predicate: Predicate,
    bindings: &'a mut Bindings,
}

impl<'a> WhereBuilder<'a> {
    pub(crate) fn new(alias: &'a str, bindings: &'a mut Bindings) -> Self {
        Self {
            alias,
            predicate: Predicate::default(),
            bindings,
        }
    }

    /// Default table alias of the query being built
    pub fn alias(&self) -> &str {
        self.alias
    }

    /// Predicate accumulated so far in this scope
    pub fn predicate(&self) -> &Predicate {
        &self.predicate
    }

    /// Set the scope predicate from raw SQL with named parameters
    pub fn where_<I, K>(&mut self, sql: &str, params: I) -> RepositoryResult<()>
    where
        I: IntoIterator<Item = (K, FilterValue)>,
        K: Into<String>,
    {
        self.raw(WhereType::Where, sql, params)
    }

    /// Conjoin raw SQL with named parameters
    pub fn and_where<I, K>(&mut self, sql: &str, params: I) -> RepositoryResult<()>
    where
        I: IntoIterator<Item = (K, FilterValue)>,
        K: Into<String>,
    {
        self.raw(WhereType::And, sql, params)
    }

    /// Disjoin raw SQL with named parameters
    pub fn or_where<I, K>(&mut self, sql: &str, params: I) -> RepositoryResult<()>
    where
        I: IntoIterator<Item = (K, FilterValue)>,
        K: Into<String>,
    {
        self.raw(WhereType::Or, sql, params)
    }

    fn raw<I, K>(&mut self, where_type: WhereType, sql: &str, params: I) -> RepositoryResult<()>
    where
        I: IntoIterator<Item = (K, FilterValue)>,
        K: Into<String>,
    {
        for (name, value) in params {
            self.bindings.bind(name, value)?;
        }
        let predicate = Predicate::parse(sql).parenthesized();
        for name in predicate.param_names() {
            if self.bindings.get(name).is_none() {
                return Err(RepositoryError::invalid_condition(format!(
                    "Parameter ':{}' is referenced but not bound",
                    name
                )));
            }
        }
        self.attach(where_type, predicate)
    }

    /// Attach a compiled fragment according to its where type
    pub(crate) fn attach(&mut self, where_type: WhereType, fragment: Predicate) -> RepositoryResult<()> {
        if fragment.is_empty() {
            return Err(RepositoryError::missing_condition(format!(
                "{} condition compiled to an empty predicate",
                where_type
            )));
        }

        if self.predicate.is_empty() {
            self.predicate = fragment;
            return Ok(());
        }

        match where_type {
            WhereType::Where => {
                tracing::debug!(
                    replaced = %self.predicate,
                    "WHERE condition replaces the existing predicate"
                );
                self.predicate = fragment;
            }
            WhereType::And => {
                self.predicate.push_sql(" AND ");
                self.predicate.append(fragment);
            }
            WhereType::Or => {
                self.predicate.push_sql(" OR ");
                self.predicate.append(fragment);
            }
        }
        Ok(())
    }

    fn finish(self) -> Predicate {
        self.predicate
    }
}

/// Compile conditions against `alias` into a predicate and its bindings
pub fn compile(
    conditions: &[ConditionNode],
    alias: &str,
) -> RepositoryResult<(Predicate, Bindings)> {
    let mut bindings = Bindings::default();
    let predicate = compile_into(conditions, alias, &mut bindings)?;
    Ok((predicate, bindings))
}

/// Compile conditions into an existing binding map
pub(crate) fn compile_into(
    conditions: &[ConditionNode],
    alias: &str,
    bindings: &mut Bindings,
) -> RepositoryResult<Predicate> {
    let mut scope = WhereBuilder::new(alias, bindings);

    for (index, node) in conditions.iter().enumerate() {
        match node {
            ConditionNode::Builder(callback) => callback.call(&mut scope)?,
            ConditionNode::Group {
                where_type,
                conditions,
            } => {
                let inner = compile_into(conditions, alias, scope.bindings)?;
                if inner.is_empty() {
                    return Err(RepositoryError::missing_condition(format!(
                        "{} group at position {} has no effective conditions",
                        where_type, index
                    )));
                }
                scope.attach(*where_type, inner.parenthesized())?;
            }
            ConditionNode::Leaf(leaf) => {
                if let Some(fragment) = lower_leaf(leaf, index, alias, scope.bindings)? {
                    scope.attach(leaf.where_type, fragment)?;
                }
            }
        }
    }

    Ok(scope.finish())
}

fn lower_leaf(
    leaf: &Condition,
    index: usize,
    alias: &str,
    bindings: &mut Bindings,
) -> RepositoryResult<Option<Predicate>> {
    let (Some(target), Some(value)) = (leaf.target(), leaf.value.clone()) else {
        return Ok(None);
    };

    let column = target.qualify(alias);
    let base = target.param_name();
    let mut fragment = Predicate::default();

    match leaf.operator {
        Operator::In | Operator::NotIn => {
            let items = match value {
                FilterValue::List(items) => items,
                scalar => vec![scalar],
            };
            if items.is_empty() {
                return Err(RepositoryError::invalid_condition(format!(
                    "{} on '{}' needs at least one value",
                    leaf.operator, target
                )));
            }
            let name = bindings.bind_unique(&base, FilterValue::List(items));
            fragment.push_sql(&format!("{} {} (", column, leaf.operator.as_sql()));
            fragment.push_param_list(name);
            fragment.push_sql(")");
        }
        Operator::Between => {
            let bounds = match value {
                FilterValue::List(items) => <[FilterValue; 2]>::try_from(items).ok(),
                _ => None,
            };
            let Some([from, to]) = bounds else {
                return Err(RepositoryError::invalid_condition(format!(
                    "BETWEEN on '{}' needs exactly two values",
                    target
                )));
            };
            let from_name = bindings.bind_unique(&format!("{}_{}_from", base, index), from);
            let to_name = bindings.bind_unique(&format!("{}_{}_to", base, index), to);
            fragment.push_sql(&format!("{} BETWEEN ", column));
            fragment.push_param(from_name);
            fragment.push_sql(" AND ");
            fragment.push_param(to_name);
        }
        operator => {
            if value.as_list().is_some() {
                return Err(RepositoryError::invalid_condition(format!(
                    "{} on '{}' does not accept a list value",
                    operator, target
                )));
            }
            let name = bindings.bind_unique(&base, operator.apply(value));
            fragment.push_sql(&format!("{} {} ", column, operator.as_sql()));
            fragment.push_param(name);
        }
    }

    Ok(Some(fragment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::condition::ColumnRef;
    use crate::repository::error::RepositoryErrorKind;

    fn compiled(conditions: &[ConditionNode]) -> (String, Bindings) {
        let (predicate, bindings) = compile(conditions, "users").unwrap();
        (predicate.to_string(), bindings)
    }

    #[test]
    fn test_single_equal_leaf() {
        let (sql, bindings) = compiled(&[ConditionNode::where_("email", Operator::Equal, "a@b.c")]);
        assert_eq!(sql, r#""users"."email" = :email"#);
        assert_eq!(bindings.get("email"), Some(&FilterValue::from("a@b.c")));
    }

    #[test]
    fn test_null_leaf_is_skipped() {
        let base = vec![
            ConditionNode::and("status", Operator::Equal, "active"),
            ConditionNode::and("age", Operator::GreaterThan, 18),
        ];
        let (sql_before, bindings_before) = compiled(&base);

        let mut with_null = base.clone();
        with_null.insert(
            1,
            ConditionNode::optional(WhereType::And, "name", Operator::Contains, None::<String>),
        );
        let (sql_after, bindings_after) = compiled(&with_null);

        assert_eq!(sql_before, sql_after);
        assert_eq!(bindings_before.len(), bindings_after.len());
    }

    #[test]
    fn test_leaf_without_column_is_skipped() {
        let (predicate, bindings) =
            compile(&[ConditionNode::where_("", Operator::Equal, 1)], "users").unwrap();
        assert!(predicate.is_empty());
        assert!(bindings.is_empty());

        let (sql, bindings) = compiled(&[
            ConditionNode::where_("status", Operator::Equal, "active"),
            ConditionNode::and("", Operator::Equal, 1),
            ConditionNode::Leaf(Condition {
                where_type: WhereType::Or,
                column: None,
                operator: Operator::Equal,
                value: Some(FilterValue::Integer(2)),
            }),
        ]);
        assert_eq!(sql, r#""users"."status" = :status"#);
        assert_eq!(bindings.len(), 1);
    }

    #[test]
    fn test_only_skipped_leaves_compile_to_empty() {
        let (predicate, bindings) = compile(
            &[ConditionNode::optional(
                WhereType::Where,
                "name",
                Operator::Equal,
                None::<String>,
            )],
            "users",
        )
        .unwrap();
        assert!(predicate.is_empty());
        assert!(bindings.is_empty());
    }

    #[test]
    fn test_between_param_names_use_index() {
        let (sql, bindings) = compiled(&[
            ConditionNode::where_("status", Operator::Equal, "active"),
            ConditionNode::and("age", Operator::Between, vec![18, 30]),
        ]);
        assert!(sql.ends_with(r#""users"."age" BETWEEN :age_1_from AND :age_1_to"#));
        assert_eq!(bindings.get("age_1_from"), Some(&FilterValue::Integer(18)));
        assert_eq!(bindings.get("age_1_to"), Some(&FilterValue::Integer(30)));
    }

    #[test]
    fn test_sibling_betweens_are_distinct() {
        let (predicate, bindings) = compile(
            &[
                ConditionNode::and("age", Operator::Between, vec![1, 5]),
                ConditionNode::and("age", Operator::Between, vec![10, 15]),
            ],
            "users",
        )
        .unwrap();
        let names = predicate.param_names();
        assert_eq!(names, vec!["age_0_from", "age_0_to", "age_1_from", "age_1_to"]);
        assert_eq!(bindings.len(), 4);
    }

    #[test]
    fn test_between_requires_two_values() {
        let err = compile(
            &[ConditionNode::where_("age", Operator::Between, vec![1, 2, 3])],
            "users",
        )
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidCondition);
    }

    #[test]
    fn test_in_binds_single_array_parameter() {
        let (sql, bindings) = compiled(&[ConditionNode::where_("id", Operator::In, vec![1, 2, 3])]);
        assert_eq!(sql, r#""users"."id" IN (:...id)"#);
        assert_eq!(bindings.len(), 1);
        assert_eq!(
            bindings.get("id"),
            Some(&FilterValue::List(vec![
                FilterValue::Integer(1),
                FilterValue::Integer(2),
                FilterValue::Integer(3),
            ]))
        );
    }

    #[test]
    fn test_not_in_token() {
        let (sql, _) = compiled(&[ConditionNode::where_("id", Operator::NotIn, vec![4])]);
        assert_eq!(sql, r#""users"."id" NOT IN (:...id)"#);
    }

    #[test]
    fn test_empty_in_list_is_rejected() {
        let err = compile(
            &[ConditionNode::where_("id", Operator::In, Vec::<i64>::new())],
            "users",
        )
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidCondition);
    }

    #[test]
    fn test_pattern_operators_bind_wrapped_values() {
        let (sql, bindings) = compiled(&[
            ConditionNode::where_("name", Operator::Contains, "abc"),
            ConditionNode::and("code", Operator::StartWith, "abc"),
        ]);
        assert_eq!(
            sql,
            r#""users"."name" LIKE :name AND "users"."code" LIKE :code"#
        );
        assert_eq!(bindings.get("name"), Some(&FilterValue::from("%abc%")));
        assert_eq!(bindings.get("code"), Some(&FilterValue::from("abc%")));
    }

    #[test]
    fn test_relation_column_binds_final_segment() {
        let (sql, bindings) = compiled(&[ConditionNode::where_(
            "profile.city",
            Operator::Equal,
            "Oslo",
        )]);
        assert_eq!(sql, r#""profile"."city" = :city"#);
        assert!(bindings.get("city").is_some());
    }

    #[test]
    fn test_same_column_equal_leaves_do_not_collide() {
        let (sql, bindings) = compiled(&[
            ConditionNode::where_("status", Operator::Equal, "active"),
            ConditionNode::or("status", Operator::Equal, "pending"),
        ]);
        assert_eq!(
            sql,
            r#""users"."status" = :status OR "users"."status" = :status_1"#
        );
        assert_eq!(bindings.get("status"), Some(&FilterValue::from("active")));
        assert_eq!(bindings.get("status_1"), Some(&FilterValue::from("pending")));
    }

    #[test]
    fn test_group_is_parenthesized() {
        let (sql, _) = compiled(&[
            ConditionNode::where_("status", Operator::Equal, "active"),
            ConditionNode::group(
                WhereType::And,
                vec![
                    ConditionNode::where_("role", Operator::Equal, "admin"),
                    ConditionNode::or("role", Operator::Equal, "owner"),
                ],
            ),
        ]);
        assert_eq!(
            sql,
            r#""users"."status" = :status AND ("users"."role" = :role OR "users"."role" = :role_1)"#
        );
    }

    #[test]
    fn test_nested_between_does_not_collide_with_outer() {
        let (_, bindings) = compiled(&[
            ConditionNode::where_("age", Operator::Between, vec![1, 2]),
            ConditionNode::group(
                WhereType::Or,
                vec![ConditionNode::where_("age", Operator::Between, vec![3, 4])],
            ),
        ]);
        assert_eq!(bindings.len(), 4);
        assert_eq!(bindings.get("age_0_from"), Some(&FilterValue::Integer(1)));
        assert_eq!(bindings.get("age_0_from_1"), Some(&FilterValue::Integer(3)));
    }

    #[test]
    fn test_empty_group_fails_with_missing_condition() {
        let err = compile(&[ConditionNode::group(WhereType::And, vec![])], "users").unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::MissingCondition);
    }

    #[test]
    fn test_group_of_skipped_leaves_fails_with_missing_condition() {
        let err = compile(
            &[ConditionNode::group(
                WhereType::And,
                vec![ConditionNode::optional(
                    WhereType::Where,
                    "name",
                    Operator::Equal,
                    None::<String>,
                )],
            )],
            "users",
        )
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::MissingCondition);
    }

    #[test]
    fn test_where_replaces_existing_predicate() {
        let (sql, _) = compiled(&[
            ConditionNode::where_("a", Operator::Equal, 1),
            ConditionNode::where_("b", Operator::Equal, 2),
        ]);
        assert_eq!(sql, r#""users"."b" = :b"#);
    }

    #[test]
    fn test_and_on_empty_scope_sets_predicate() {
        let (sql, _) = compiled(&[ConditionNode::and("a", Operator::Equal, 1)]);
        assert_eq!(sql, r#""users"."a" = :a"#);
    }

    #[test]
    fn test_builder_callback_writes_into_scope() {
        let (sql, bindings) = compiled(&[
            ConditionNode::where_("status", Operator::Equal, "active"),
            ConditionNode::builder(|qb| {
                let alias = qb.alias().to_string();
                qb.and_where(
                    &format!("lower({}.email) = lower(:email)", alias),
                    [("email", FilterValue::from("A@B.C"))],
                )
            }),
        ]);
        assert_eq!(
            sql,
            r#""users"."status" = :status AND (lower(users.email) = lower(:email))"#
        );
        assert_eq!(bindings.get("email"), Some(&FilterValue::from("A@B.C")));
    }

    #[test]
    fn test_builder_unbound_parameter_is_rejected() {
        let err = compile(
            &[ConditionNode::builder(|qb| {
                qb.where_("a = :missing", Vec::<(String, FilterValue)>::new())
            })],
            "users",
        )
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidCondition);
    }

    #[test]
    fn test_builder_rebinding_conflict_is_rejected() {
        let err = compile(
            &[
                ConditionNode::where_("status", Operator::Equal, "active"),
                ConditionNode::builder(|qb| {
                    qb.and_where("x = :status", [("status", FilterValue::from("other"))])
                }),
            ],
            "users",
        )
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidCondition);
    }

    #[test]
    fn test_list_value_with_scalar_operator_is_rejected() {
        let err = compile(
            &[ConditionNode::where_("id", Operator::Equal, vec![1, 2])],
            "users",
        )
        .unwrap_err();
        assert_eq!(err.kind, RepositoryErrorKind::InvalidCondition);
    }

    #[test]
    fn test_unqualified_field_with_dot_is_not_split() {
        let (sql, bindings) = compiled(&[ConditionNode::where_(
            ColumnRef::field("settings.theme"),
            Operator::Equal,
            "dark",
        )]);
        assert_eq!(sql, r#""users"."settings.theme" = :settings_theme"#);
        assert!(bindings.get("settings_theme").is_some());
    }

    #[test]
    fn test_parse_handles_casts_literals_and_spread() {
        let predicate = Predicate::parse("a::int = :a AND b IN (:...ids) AND c = 'x:y'");
        assert_eq!(predicate.param_names(), vec!["a", "ids"]);
        assert_eq!(
            predicate.to_string(),
            "a::int = :a AND b IN (:...ids) AND c = 'x:y'"
        );
    }
}
