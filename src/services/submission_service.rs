use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::errors::{UploadError, UploadResult};
use crate::processing::ScriptProcessor;
use crate::services::archive_intake::{ArchiveIntake, Workspace};
use crate::services::upload_record::{UploadDetail, UploadRecord, UploadSummary};
use crate::services::upload_service::UploadService;
use crate::table::SceneTable;

pub const RESULT_EXTENSION: &str = "xlsx";

/// Spreadsheet bytes ready to be sent as an attachment.
#[derive(Debug)]
pub struct ResultDownload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Runs uploads through intake, processing and storage, and serves the read
/// side over the stored records.
#[derive(Clone)]
pub struct SubmissionService {
    intake: ArchiveIntake,
    processor: Arc<dyn ScriptProcessor>,
    uploads: UploadService,
    result_root: PathBuf,
    processing_timeout: Duration,
}

impl SubmissionService {
    pub fn new(
        intake: ArchiveIntake,
        processor: Arc<dyn ScriptProcessor>,
        uploads: UploadService,
        result_root: impl Into<PathBuf>,
        processing_timeout: Duration,
    ) -> Self {
        Self {
            intake,
            processor,
            uploads,
            result_root: result_root.into(),
            processing_timeout,
        }
    }

    #[cfg(test)]
    pub fn uploads(&self) -> &UploadService {
        &self.uploads
    }

    pub fn result_path_for(&self, workspace_id: &str) -> PathBuf {
        self.result_root
            .join(format!("{}.{}", workspace_id, RESULT_EXTENSION))
    }

    /// Accept an archive, process it and persist the outcome.
    ///
    /// A record is written only when intake and processing both succeed.
    pub async fn submit(&self, filename: &str, bytes: Vec<u8>) -> UploadResult<UploadRecord> {
        let size = bytes.len();
        let workspace = self.intake.accept_upload(filename, bytes).await?;
        info!(
            "Accepted '{}' ({} bytes) as workspace {}",
            filename, size, workspace.id
        );

        tokio::fs::create_dir_all(&self.result_root).await?;
        let output_path = self.result_path_for(&workspace.id);
        let table = self.run_processor(&workspace, &output_path).await?;
        info!(
            "Processed workspace {} into {} rows",
            workspace.id,
            table.len()
        );

        let record = self
            .uploads
            .create_upload(filename, &output_path, &table)
            .await?;
        info!("Stored upload {} for workspace {}", record.id, workspace.id);

        Ok(record)
    }

    async fn run_processor(&self, workspace: &Workspace, output_path: &Path) -> UploadResult<SceneTable> {
        let processor = Arc::clone(&self.processor);
        let extracted_dir = workspace.extracted_dir.clone();
        let output = output_path.to_path_buf();
        let task =
            tokio::task::spawn_blocking(move || processor.process(&extracted_dir, &output));

        // On timeout the blocking task keeps running detached; nothing is persisted.
        let table = match tokio::time::timeout(self.processing_timeout, task).await {
            Err(_) => {
                error!(
                    "Processing of workspace {} exceeded {:?}",
                    workspace.id, self.processing_timeout
                );
                return Err(UploadError::ProcessingTimeout(self.processing_timeout));
            }
            Ok(Err(join_err)) => {
                return Err(UploadError::Processing(format!(
                    "processing task failed: {}",
                    join_err
                )));
            }
            Ok(Ok(Err(e))) => return Err(UploadError::Processing(format!("{:#}", e))),
            Ok(Ok(Ok(table))) => table,
        };

        if !tokio::fs::try_exists(output_path).await.unwrap_or(false) {
            return Err(UploadError::Processing(format!(
                "processor returned without writing {}",
                output_path.display()
            )));
        }

        Ok(table)
    }

    pub async fn history(&self, offset: u64, limit: u64) -> UploadResult<Vec<UploadSummary>> {
        let records = self.uploads.list_uploads(offset, limit).await?;
        Ok(records.iter().map(UploadRecord::to_summary).collect())
    }

    pub async fn detail(&self, id: i32) -> UploadResult<UploadDetail> {
        Ok(self.uploads.require_upload(id).await?.into_detail())
    }

    /// Unknown id is not found; a record whose file is gone is a server error.
    pub async fn download(&self, id: i32) -> UploadResult<ResultDownload> {
        let record = self.uploads.require_upload(id).await?;

        let bytes = match tokio::fs::read(&record.result_path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(UploadError::ResultFileMissing(record.result_path.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ResultDownload {
            file_name: record.result_file_name(),
            bytes,
        })
    }
}
