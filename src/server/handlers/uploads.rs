use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use crate::errors::{UploadError, UploadResult};
use crate::server::app::AppState;
use crate::services::archive_intake::DEFAULT_ARCHIVE_NAME;
use crate::services::{UploadDetail, UploadReceipt, UploadSummary};

pub const FILE_FIELD: &str = "file";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

pub async fn upload_script(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> UploadResult<Json<UploadReceipt>> {
    let mut multipart = multipart.map_err(|e| UploadError::InvalidRequest(e.body_text()))?;
    let (filename, bytes) = read_file_field(&mut multipart, state.config.max_upload_bytes).await?;
    let record = state.submissions.submit(&filename, bytes).await?;

    Ok(Json(record.into_receipt()))
}

/// First part named `file`; an unnamed file part gets the default name.
async fn read_file_field(
    multipart: &mut Multipart,
    limit: usize,
) -> UploadResult<(String, Vec<u8>)> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, limit))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_ARCHIVE_NAME)
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| multipart_error(e, limit))?;

        return Ok((filename, bytes.to_vec()));
    }

    Err(UploadError::MissingFile)
}

fn multipart_error(err: MultipartError, limit: usize) -> UploadError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        UploadError::PayloadTooLarge(limit)
    } else {
        UploadError::InvalidRequest(err.body_text())
    }
}

/// Issued ids are `i32`; any other integer can never name a record.
fn parse_upload_id(raw: &str) -> UploadResult<i32> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(UploadError::InvalidRequest(format!(
            "Invalid upload id '{}'",
            raw
        )));
    }
    raw.parse::<i32>()
        .map_err(|_| UploadError::NotFound(raw.to_string()))
}

fn upload_id(path: Result<Path<String>, PathRejection>) -> UploadResult<i32> {
    let Path(raw) = path.map_err(|e| UploadError::InvalidRequest(e.body_text()))?;
    parse_upload_id(&raw)
}

pub async fn list_history(
    State(state): State<AppState>,
    query: Result<Query<HistoryParams>, QueryRejection>,
) -> UploadResult<Json<Vec<UploadSummary>>> {
    let Query(params) = query.map_err(|e| UploadError::InvalidRequest(e.body_text()))?;
    let offset = state.config.history_offset(params.offset);
    let limit = state.config.history_limit(params.limit);
    let summaries = state.submissions.history(offset, limit).await?;

    Ok(Json(summaries))
}

pub async fn get_result(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> UploadResult<Json<UploadDetail>> {
    let id = upload_id(path)?;
    Ok(Json(state.submissions.detail(id).await?))
}

pub async fn download_result(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> UploadResult<impl IntoResponse> {
    let id = upload_id(path)?;
    let download = state.submissions.download(id).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE));
    let disposition = format!("attachment; filename=\"{}\"", download.file_name);
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| UploadError::Io(std::io::Error::other(e)))?,
    );

    Ok((headers, download.bytes))
}
