//! OAuth access tokens issued to resource owners

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

use super::StorageFile;
use crate::repository::{
    BaseRepository, Changeset, ConditionNode, Entity, FilterValue, GetOneParams, Operator,
    PgExecutor, QueryExecutor, RelationDef, RelationSpec, RepositoryResult,
};

/// Row of `access_tokens`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessToken {
    pub id: i32,
    /// Unique bearer token
    pub token: String,
    pub refresh_token: String,
    pub resource_owner_id: i32,
    pub resource_owner_type: String,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
    /// Files uploaded by the resource owner, present when the
    /// `uploaded_files` relation is joined
    #[sqlx(default)]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_files: Option<Json<Vec<StorageFile>>>,
}

impl Entity for AccessToken {
    const TABLE: &'static str = "access_tokens";

    fn primary_key_values(&self) -> Vec<FilterValue> {
        vec![self.id.into()]
    }

    fn relations() -> &'static [RelationDef] {
        const RELATIONS: &[RelationDef] = &[RelationDef::many(
            "access_tokens",
            "uploaded_files",
            "storage_files",
            "resource_owner_id",
            "uploader_id",
        )];
        RELATIONS
    }
}

/// Fields supplied when issuing a token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccessToken {
    pub token: String,
    pub refresh_token: String,
    pub resource_owner_id: i32,
    pub resource_owner_type: String,
}

impl From<NewAccessToken> for Changeset {
    fn from(token: NewAccessToken) -> Self {
        Changeset::new()
            .set("token", token.token)
            .set("refresh_token", token.refresh_token)
            .set("resource_owner_id", token.resource_owner_id)
            .set("resource_owner_type", token.resource_owner_type)
    }
}

pub type AccessTokenRepository<X = PgExecutor> = BaseRepository<AccessToken, X>;

impl<X: QueryExecutor<AccessToken>> BaseRepository<AccessToken, X> {
    pub async fn find_by_token(
        &self,
        token: &str,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<AccessToken> {
        let params = GetOneParams::new(vec![ConditionNode::where_("token", Operator::Equal, token)]);
        self.get_one(&params, tx).await
    }

    /// Token with the owner's uploaded files attached
    pub async fn find_by_token_with_uploads(
        &self,
        token: &str,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<AccessToken> {
        let params = GetOneParams::new(vec![ConditionNode::where_("token", Operator::Equal, token)])
            .with_relations(vec![RelationSpec::left("uploaded_files", "uploaded_files")]);
        self.get_one(&params, tx).await
    }

    pub async fn find_by_refresh_token(
        &self,
        refresh_token: &str,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<AccessToken> {
        let params = GetOneParams::new(vec![ConditionNode::where_(
            "refresh_token",
            Operator::Equal,
            refresh_token,
        )]);
        self.get_one(&params, tx).await
    }

    /// Number of tokens held by one resource owner
    pub async fn count_for_owner(
        &self,
        resource_owner_id: i32,
        resource_owner_type: &str,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<u64> {
        self.count(
            &[
                ConditionNode::where_("resource_owner_id", Operator::Equal, resource_owner_id),
                ConditionNode::and("resource_owner_type", Operator::Equal, resource_owner_type),
            ],
            tx,
        )
        .await
    }
}
