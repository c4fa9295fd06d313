//! Repository error types
//!
//! Every failure raised by the condition compiler or by a repository operation
//! is a [`RepositoryError`]: a category ([`RepositoryErrorKind`]), the
//! operation that was running ([`RepositoryOperation`]) and optional entity
//! context.
//!
//! # Example
//!
//! ```rust
//! use acton_repository::repository::{RepositoryError, RepositoryErrorKind};
//!
//! let error = RepositoryError::not_found("access_tokens").with_entity("access_tokens", "42");
//! assert!(matches!(error.kind, RepositoryErrorKind::NotFound));
//! assert!(error.entity_id.is_some());
//! ```

use std::fmt;

/// Operation being performed when the repository error occurred
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryOperation {
    /// Lowering conditions and relations into SQL
    Compile,
    /// Paginated list query
    FindMany,
    /// Single-row fetch
    GetOne,
    /// Re-fetching a known entity with relations attached
    GetRelations,
    /// Counting rows matching conditions
    Count,
    /// Inserting a new row
    Create,
    /// Merge-then-save of an existing row
    Update,
    /// Fetch-then-delete of an existing row
    Remove,
    /// Opening a transaction
    Begin,
    /// Row-returning statement run outside a repository operation
    Query,
    /// Row-affecting statement run outside a repository operation
    Execute,
}

impl fmt::Display for RepositoryOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::FindMany => write!(f, "find_many"),
            Self::GetOne => write!(f, "get_one"),
            Self::GetRelations => write!(f, "get_relations"),
            Self::Count => write!(f, "count"),
            Self::Create => write!(f, "create_one"),
            Self::Update => write!(f, "update_one"),
            Self::Remove => write!(f, "remove_one"),
            Self::Begin => write!(f, "begin"),
            Self::Query => write!(f, "query"),
            Self::Execute => write!(f, "execute"),
        }
    }
}

/// Category of repository error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RepositoryErrorKind {
    /// No row matched the conditions
    NotFound,
    /// A condition or group compiled to an empty predicate
    MissingCondition,
    /// A where-type name that is not `WHERE`, `WHERE_AND` or `WHERE_OR`
    UnsupportedWhereType,
    /// An operator name outside the supported set
    UnsupportedOperator,
    /// A structurally invalid condition (bad BETWEEN arity, empty IN list, ...)
    InvalidCondition,
    /// A relation that the entity does not declare
    UnknownRelation,
    /// Failed to reach the database
    ConnectionFailed,
    /// Operation timed out
    Timeout,
    /// Underlying database error
    DatabaseError,
    /// A value could not be encoded or decoded
    SerializationError,
    /// Other unclassified error
    Other,
}

impl fmt::Display for RepositoryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::MissingCondition => write!(f, "missing_condition"),
            Self::UnsupportedWhereType => write!(f, "unsupported_where_type"),
            Self::UnsupportedOperator => write!(f, "unsupported_operator"),
            Self::InvalidCondition => write!(f, "invalid_condition"),
            Self::UnknownRelation => write!(f, "unknown_relation"),
            Self::ConnectionFailed => write!(f, "connection_failed"),
            Self::Timeout => write!(f, "timeout"),
            Self::DatabaseError => write!(f, "database_error"),
            Self::SerializationError => write!(f, "serialization_error"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Structured repository error with operation context
///
/// # Example
///
/// ```rust
/// use acton_repository::repository::{RepositoryError, RepositoryOperation};
///
/// let error = RepositoryError::missing_condition("group compiled to nothing");
/// assert_eq!(error.operation, RepositoryOperation::Compile);
/// assert!(!error.is_retriable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryError {
    /// The operation being performed when the error occurred
    pub operation: RepositoryOperation,
    /// The category of error
    pub kind: RepositoryErrorKind,
    /// Human-readable error message
    pub message: String,
    /// The entity (table) involved
    pub entity_type: Option<String>,
    /// The primary key of the entity involved
    pub entity_id: Option<String>,
}

impl RepositoryError {
    /// Create a new repository error
    pub fn new(
        operation: RepositoryOperation,
        kind: RepositoryErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            operation,
            kind,
            message: message.into(),
            entity_type: None,
            entity_id: None,
        }
    }

    /// No row matched; `entity_type` names the table that was queried
    pub fn not_found(entity_type: impl Into<String>) -> Self {
        Self {
            operation: RepositoryOperation::GetOne,
            kind: RepositoryErrorKind::NotFound,
            message: "Entity not found".to_string(),
            entity_type: Some(entity_type.into()),
            entity_id: None,
        }
    }

    /// A group or attachment produced an empty predicate
    pub fn missing_condition(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Compile,
            RepositoryErrorKind::MissingCondition,
            message,
        )
    }

    /// Unknown where-type name
    pub fn unsupported_where_type(name: impl fmt::Display) -> Self {
        Self::new(
            RepositoryOperation::Compile,
            RepositoryErrorKind::UnsupportedWhereType,
            format!("Unsupported where type '{}'", name),
        )
    }

    /// Unknown operator name
    pub fn unsupported_operator(name: impl fmt::Display) -> Self {
        Self::new(
            RepositoryOperation::Compile,
            RepositoryErrorKind::UnsupportedOperator,
            format!("Unsupported operator '{}'", name),
        )
    }

    /// Structurally invalid condition
    pub fn invalid_condition(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::Compile,
            RepositoryErrorKind::InvalidCondition,
            message,
        )
    }

    /// Relation not declared by the owning entity
    pub fn unknown_relation(relation: impl fmt::Display) -> Self {
        Self::new(
            RepositoryOperation::Compile,
            RepositoryErrorKind::UnknownRelation,
            format!("Unknown relation '{}'", relation),
        )
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::new(
            RepositoryOperation::FindMany,
            RepositoryErrorKind::ConnectionFailed,
            message,
        )
    }

    /// Create a timeout error
    pub fn timeout(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::Timeout, message)
    }

    /// Create a database error
    pub fn database_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::DatabaseError, message)
    }

    /// Create a serialization error
    pub fn serialization_error(operation: RepositoryOperation, message: impl Into<String>) -> Self {
        Self::new(operation, RepositoryErrorKind::SerializationError, message)
    }

    /// Add entity context to an existing error
    #[must_use]
    pub fn with_entity(
        mut self,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
    ) -> Self {
        self.entity_type = Some(entity_type.into());
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Set the operation that caused the error
    #[must_use]
    pub fn with_operation(mut self, operation: RepositoryOperation) -> Self {
        self.operation = operation;
        self
    }

    /// Check if this error is retriable (transient errors that may succeed on retry)
    ///
    /// Nothing in this crate retries on its own; the classification is for
    /// callers that layer their own policy on top.
    pub fn is_retriable(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::ConnectionFailed | RepositoryErrorKind::Timeout
        )
    }

    /// Programmer errors raised while compiling a query
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self.kind,
            RepositoryErrorKind::MissingCondition
                | RepositoryErrorKind::UnsupportedWhereType
                | RepositoryErrorKind::UnsupportedOperator
                | RepositoryErrorKind::InvalidCondition
                | RepositoryErrorKind::UnknownRelation
        )
    }
}

impl fmt::Display for RepositoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Repository {} error during {}: {}",
            self.kind, self.operation, self.message
        )?;
        match (&self.entity_type, &self.entity_id) {
            (Some(entity_type), Some(entity_id)) => write!(f, " [{}: {}]", entity_type, entity_id)?,
            (Some(entity_type), None) => write!(f, " [{}]", entity_type)?,
            _ => {}
        }
        Ok(())
    }
}

impl std::error::Error for RepositoryError {}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::Error as E;
        // Callers re-tag with `with_operation`.
        let operation = RepositoryOperation::Query;
        match err {
            E::RowNotFound => Self::new(operation, RepositoryErrorKind::NotFound, "Row not found"),
            E::PoolTimedOut => Self::timeout(operation, "Connection pool timed out"),
            E::PoolClosed => Self::connection_failed("Connection pool is closed"),
            E::Io(e) => Self::connection_failed(e.to_string()),
            E::Tls(e) => Self::connection_failed(format!("TLS error: {}", e)),
            E::ColumnDecode { index, source } => Self::serialization_error(
                operation,
                format!("Failed to decode column {}: {}", index, source),
            ),
            E::Decode(e) => Self::serialization_error(operation, e.to_string()),
            E::Encode(e) => Self::serialization_error(operation, e.to_string()),
            E::Database(e) => {
                let message = match e.code() {
                    Some(code) => format!("{} (code {})", e.message(), code),
                    None => e.message().to_string(),
                };
                Self::database_error(operation, message)
            }
            other => Self::database_error(operation, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_operation_display() {
        assert_eq!(format!("{}", RepositoryOperation::Compile), "compile");
        assert_eq!(format!("{}", RepositoryOperation::FindMany), "find_many");
        assert_eq!(format!("{}", RepositoryOperation::GetOne), "get_one");
        assert_eq!(
            format!("{}", RepositoryOperation::GetRelations),
            "get_relations"
        );
        assert_eq!(format!("{}", RepositoryOperation::Count), "count");
        assert_eq!(format!("{}", RepositoryOperation::Create), "create_one");
        assert_eq!(format!("{}", RepositoryOperation::Update), "update_one");
        assert_eq!(format!("{}", RepositoryOperation::Remove), "remove_one");
        assert_eq!(format!("{}", RepositoryOperation::Begin), "begin");
        assert_eq!(format!("{}", RepositoryOperation::Query), "query");
        assert_eq!(format!("{}", RepositoryOperation::Execute), "execute");
    }

    #[test]
    fn test_repository_error_kind_display() {
        assert_eq!(format!("{}", RepositoryErrorKind::NotFound), "not_found");
        assert_eq!(
            format!("{}", RepositoryErrorKind::MissingCondition),
            "missing_condition"
        );
        assert_eq!(
            format!("{}", RepositoryErrorKind::UnsupportedWhereType),
            "unsupported_where_type"
        );
        assert_eq!(
            format!("{}", RepositoryErrorKind::UnknownRelation),
            "unknown_relation"
        );
    }

    #[test]
    fn test_not_found_carries_entity_type() {
        let error = RepositoryError::not_found("storage_files");
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.entity_type.as_deref(), Some("storage_files"));
        assert!(error.entity_id.is_none());
    }

    #[test]
    fn test_compile_errors_are_flagged() {
        assert!(RepositoryError::missing_condition("empty").is_compile_error());
        assert!(RepositoryError::unsupported_where_type("WHERE_XOR").is_compile_error());
        assert!(RepositoryError::unsupported_operator("ILIKE").is_compile_error());
        assert!(RepositoryError::unknown_relation("user.posts").is_compile_error());
        assert!(!RepositoryError::not_found("users").is_compile_error());
    }

    #[test]
    fn test_is_retriable() {
        assert!(RepositoryError::connection_failed("refused").is_retriable());
        assert!(RepositoryError::timeout(RepositoryOperation::FindMany, "slow").is_retriable());
        assert!(!RepositoryError::not_found("users").is_retriable());
        assert!(
            !RepositoryError::database_error(RepositoryOperation::Create, "duplicate key")
                .is_retriable()
        );
    }

    #[test]
    fn test_with_operation() {
        let error = RepositoryError::not_found("users").with_operation(RepositoryOperation::Remove);
        assert_eq!(error.operation, RepositoryOperation::Remove);
    }

    #[test]
    fn test_display_with_entity() {
        let error = RepositoryError::not_found("users").with_entity("users", "7");
        let display = error.to_string();
        assert!(display.contains("not_found"));
        assert!(display.contains("get_one"));
        assert!(display.contains("[users: 7]"));
    }

    #[test]
    fn test_display_with_entity_type_only() {
        let display = RepositoryError::not_found("users").to_string();
        assert!(display.ends_with("[users]"));
    }

    #[test]
    fn test_unsupported_where_type_message() {
        let error = RepositoryError::unsupported_where_type("WHERE_NOT");
        assert!(error.message.contains("WHERE_NOT"));
    }

    #[test]
    fn test_from_sqlx_row_not_found() {
        let error = RepositoryError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.kind, RepositoryErrorKind::NotFound);
        assert_eq!(error.operation, RepositoryOperation::Query);
    }

    #[test]
    fn test_from_sqlx_pool_timeout_is_retriable() {
        let error = RepositoryError::from(sqlx::Error::PoolTimedOut);
        assert_eq!(error.kind, RepositoryErrorKind::Timeout);
        assert!(error.is_retriable());
    }

    #[test]
    fn test_error_is_error_trait() {
        let error: Box<dyn std::error::Error> = Box::new(RepositoryError::not_found("users"));
        assert!(error.to_string().contains("not_found"));
    }
}
