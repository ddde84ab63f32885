use std::path::Path;

use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, QuerySelect};
use tracing::debug;

use crate::database::entities::{uploads, Uploads};
use crate::database::table_codec;
use crate::errors::{UploadError, UploadResult};
use crate::services::upload_record::UploadRecord;
use crate::table::SceneTable;

pub const DEFAULT_LIST_OFFSET: u64 = 0;
pub const DEFAULT_LIST_LIMIT: u64 = 100;

/// Storage layer for upload records.
///
/// Records are only ever created and read. Every database failure surfaces as
/// [`UploadError::Database`].
#[derive(Clone)]
pub struct UploadService {
    db: DatabaseConnection,
}

impl UploadService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new record with a fresh id and the current timestamp.
    ///
    /// A single-row insert, so readers never observe a partial record.
    pub async fn create_upload(
        &self,
        filename: &str,
        result_path: &Path,
        data: &SceneTable,
    ) -> UploadResult<UploadRecord> {
        let data_json = table_codec::encode(data)?;
        let upload = uploads::ActiveModel::new(
            filename.to_string(),
            result_path.to_string_lossy().into_owned(),
            data_json,
        );

        let model = upload.insert(&self.db).await?;
        debug!("Created upload record {} for '{}'", model.id, model.filename);

        Ok(model.into())
    }

    pub async fn get_upload(&self, id: i32) -> UploadResult<Option<UploadRecord>> {
        let model = Uploads::find_by_id(id).one(&self.db).await?;
        Ok(model.map(UploadRecord::from))
    }

    /// Like [`get_upload`](Self::get_upload) but absence is an error.
    pub async fn require_upload(&self, id: i32) -> UploadResult<UploadRecord> {
        self.get_upload(id)
            .await?
            .ok_or_else(|| UploadError::NotFound(id.to_string()))
    }

    /// Most recent first; id breaks ties between equal timestamps.
    pub async fn list_uploads(&self, offset: u64, limit: u64) -> UploadResult<Vec<UploadRecord>> {
        let models = Uploads::find()
            .order_by_desc(uploads::Column::CreatedAt)
            .order_by_desc(uploads::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(&self.db)
            .await?;

        Ok(models.into_iter().map(UploadRecord::from).collect())
    }

    #[cfg(test)]
    pub async fn count_uploads(&self) -> UploadResult<u64> {
        use sea_orm::PaginatorTrait;
        Ok(Uploads::find().count(&self.db).await?)
    }
}
