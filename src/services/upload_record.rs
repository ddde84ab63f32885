use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::database::entities::uploads;
use crate::database::table_codec;
use crate::table::SceneTable;

/// A processed script submission, as read back from storage.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadRecord {
    pub id: i32,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub result_path: PathBuf,
    pub data: SceneTable,
}

/// `GET /history` entry
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadSummary {
    pub id: i32,
    pub filename: String,
    pub created_at: DateTime<Utc>,
}

/// `GET /result/{id}` body
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadDetail {
    pub id: i32,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub data: SceneTable,
    pub download_url: String,
}

/// `POST /upload` body
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadReceipt {
    pub id: i32,
    pub data: SceneTable,
}

impl From<uploads::Model> for UploadRecord {
    fn from(model: uploads::Model) -> Self {
        Self {
            id: model.id,
            filename: model.filename,
            created_at: model.created_at,
            result_path: PathBuf::from(model.result_path),
            data: table_codec::decode(&model.data_json),
        }
    }
}

impl UploadRecord {
    /// Computed on read, never stored.
    pub fn download_url(&self) -> String {
        format!("/download/{}", self.id)
    }

    /// Attachment name for downloads: the basename of the result file.
    pub fn result_file_name(&self) -> String {
        self.result_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("upload-{}.xlsx", self.id))
    }

    pub fn to_summary(&self) -> UploadSummary {
        UploadSummary {
            id: self.id,
            filename: self.filename.clone(),
            created_at: self.created_at,
        }
    }

    pub fn into_detail(self) -> UploadDetail {
        let download_url = self.download_url();
        UploadDetail {
            id: self.id,
            filename: self.filename,
            created_at: self.created_at,
            data: self.data,
            download_url,
        }
    }

    pub fn into_receipt(self) -> UploadReceipt {
        UploadReceipt {
            id: self.id,
            data: self.data,
        }
    }
}
