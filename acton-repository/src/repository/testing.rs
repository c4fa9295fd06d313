//! In-memory executor and entities for repository tests

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use super::condition::FilterValue;
use super::relation::RelationDef;
use super::statement::Statement;
use super::traits::{Entity, QueryExecutor, RepositoryResult};

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Account {
    pub id: i64,
    pub email: String,
}

pub(crate) fn account(id: i64, email: &str) -> Account {
    Account {
        id,
        email: email.to_string(),
    }
}

impl Entity for Account {
    const TABLE: &'static str = "accounts";

    fn primary_key_values(&self) -> Vec<FilterValue> {
        vec![self.id.into()]
    }

    fn relations() -> &'static [RelationDef] {
        const RELATIONS: &[RelationDef] = &[
            RelationDef::one("accounts", "profile", "profiles", "id", "account_id"),
            RelationDef::many("accounts", "posts", "posts", "id", "author_id"),
        ];
        RELATIONS
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Membership {
    pub team_id: i64,
    pub user_id: i64,
}

impl Entity for Membership {
    const TABLE: &'static str = "memberships";
    const PRIMARY_KEY: &'static [&'static str] = &["team_id", "user_id"];

    fn primary_key_values(&self) -> Vec<FilterValue> {
        vec![self.team_id.into(), self.user_id.into()]
    }
}

struct Recorded<E> {
    rows: VecDeque<Vec<E>>,
    counts: VecDeque<u64>,
    affected: VecDeque<u64>,
    statements: Vec<Statement>,
}

/// Replays canned results in order and records every statement
pub(crate) struct RecordingExecutor<E> {
    inner: Arc<Mutex<Recorded<E>>>,
}

impl<E> Clone for RecordingExecutor<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E> RecordingExecutor<E> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Recorded {
                rows: VecDeque::new(),
                counts: VecDeque::new(),
                affected: VecDeque::new(),
                statements: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Recorded<E>> {
        self.inner.lock().unwrap()
    }

    pub fn push_rows(&self, rows: Vec<E>) {
        self.lock().rows.push_back(rows);
    }

    pub fn push_count(&self, count: u64) {
        self.lock().counts.push_back(count);
    }

    pub fn push_affected(&self, affected: u64) {
        self.lock().affected.push_back(affected);
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    pub fn begin(&self) -> FakeTransaction {
        FakeTransaction::default()
    }

    fn record(&self, statement: &Statement, tx: Option<&mut FakeTransaction>) {
        if let Some(tx) = tx {
            tx.statements.push(statement.sql().to_string());
        }
        self.lock().statements.push(statement.clone());
    }
}

/// Records the SQL run inside it
#[derive(Debug, Default)]
pub(crate) struct FakeTransaction {
    statements: Vec<String>,
}

impl FakeTransaction {
    pub fn statements(&self) -> Vec<String> {
        self.statements.clone()
    }
}

impl<E: Send + 'static> QueryExecutor<E> for RecordingExecutor<E> {
    type Transaction = FakeTransaction;

    async fn fetch_all(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> RepositoryResult<Vec<E>> {
        self.record(statement, tx);
        Ok(self.lock().rows.pop_front().unwrap_or_default())
    }

    async fn fetch_count(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> RepositoryResult<u64> {
        self.record(statement, tx);
        Ok(self.lock().counts.pop_front().unwrap_or_default())
    }

    async fn execute(
        &self,
        statement: &Statement,
        tx: Option<&mut Self::Transaction>,
    ) -> RepositoryResult<u64> {
        self.record(statement, tx);
        Ok(self.lock().affected.pop_front().unwrap_or_default())
    }
}
