//! Metadata of uploaded files

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::repository::{
    BaseRepository, Changeset, ConditionNode, Entity, FilterValue, FindManyParams, FindManyResult,
    GetOneParams, Operator, OrderSpec, Pagination, PgExecutor, QueryExecutor, RepositoryResult,
};

/// Row of `storage_files`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StorageFile {
    pub id: i32,
    /// Path on the storage disk
    pub file_path: String,
    pub origin_name: String,
    pub mime_type: String,
    /// MD5 of the file contents
    pub checksum: String,
    /// Size in bytes
    pub size: i32,
    pub disk: String,
    pub uploader_id: Option<i32>,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl Entity for StorageFile {
    const TABLE: &'static str = "storage_files";

    fn primary_key_values(&self) -> Vec<FilterValue> {
        vec![self.id.into()]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStorageFile {
    pub file_path: String,
    pub origin_name: String,
    pub mime_type: String,
    pub checksum: String,
    pub size: i32,
    pub disk: String,
    #[serde(default)]
    pub uploader_id: Option<i32>,
}

impl From<NewStorageFile> for Changeset {
    fn from(file: NewStorageFile) -> Self {
        let mut changes = Changeset::new()
            .set("file_path", file.file_path)
            .set("origin_name", file.origin_name)
            .set("mime_type", file.mime_type)
            .set("checksum", file.checksum)
            .set("size", file.size)
            .set("disk", file.disk);
        changes.insert_opt("uploader_id", file.uploader_id);
        changes
    }
}

pub type StorageFileRepository<X = PgExecutor> = BaseRepository<StorageFile, X>;

impl<X: QueryExecutor<StorageFile>> BaseRepository<StorageFile, X> {
    /// File with the given content checksum, used to reject duplicate uploads
    pub async fn find_by_checksum(
        &self,
        checksum: &str,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<StorageFile> {
        let params =
            GetOneParams::new(vec![ConditionNode::where_("checksum", Operator::Equal, checksum)]);
        self.get_one(&params, tx).await
    }

    pub async fn find_by_file_path(
        &self,
        file_path: &str,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<StorageFile> {
        let params =
            GetOneParams::new(vec![ConditionNode::where_("file_path", Operator::Equal, file_path)]);
        self.get_one(&params, tx).await
    }

    /// Newest-first page of one uploader's files
    pub async fn list_for_uploader(
        &self,
        uploader_id: i32,
        pagination: Pagination,
        tx: Option<&mut X::Transaction>,
    ) -> RepositoryResult<FindManyResult<StorageFile>> {
        let params = FindManyParams {
            conditions: vec![ConditionNode::where_("uploader_id", Operator::Equal, uploader_id)],
            pagination,
            orders: vec![OrderSpec::desc("created_at"), OrderSpec::desc("id")],
            ..Default::default()
        };
        self.find_many(&params, tx).await
    }
}
