//! API integration tests
//!
//! End-to-end upload, history, result and download flows over HTTP

use std::io::{Cursor, Write};
use std::path::Path;

use anyhow::Result;
use axum::http::StatusCode;
use axum::body::Bytes;
use axum_test::TestServer;
use scenetable::config::ServiceConfig;
use scenetable::database::connection::setup_database;
use scenetable::server::app::create_app;
use sea_orm::Database;
use serde_json::Value;
use tempfile::{NamedTempFile, TempDir};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

const SCENE_COLUMNS: [&str; 7] = [
    "scene_number",
    "location",
    "time_of_day",
    "main_characters",
    "extras",
    "props",
    "special_effects",
];

/// Keeps the temporary database and storage roots alive for one test
struct TestContext {
    server: TestServer,
    root: TempDir,
    _db_file: NamedTempFile,
}

impl TestContext {
    fn uploads_dir(&self) -> std::path::PathBuf {
        self.root.path().join("uploads")
    }

    fn results_dir(&self) -> std::path::PathBuf {
        self.root.path().join("results")
    }
}

async fn setup_test_server_with(configure: impl FnOnce(&mut ServiceConfig, &Path)) -> Result<TestContext> {
    let db_file = NamedTempFile::new()?;
    let db_url = format!("sqlite://{}?mode=rwc", db_file.path().display());
    let db = Database::connect(&db_url).await?;
    setup_database(&db).await?;

    let root = tempfile::tempdir()?;
    let mut config = ServiceConfig {
        upload_root: root.path().join("uploads"),
        result_root: root.path().join("results"),
        frontend_dist: root.path().join("frontend-dist"),
        ..Default::default()
    };
    configure(&mut config, root.path());
    config.ensure_storage_roots()?;

    let app = create_app(db, &config, None).await?;
    let server = TestServer::new(app)?;

    Ok(TestContext {
        server,
        root,
        _db_file: db_file,
    })
}

async fn setup_test_server() -> Result<TestContext> {
    setup_test_server_with(|_, _| {}).await
}

fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(name.to_string(), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

fn two_entry_zip() -> Vec<u8> {
    build_zip(&[
        ("script/01.txt", "INT. OFFICE - DAY"),
        ("script/02.txt", "EXT. STREET - NIGHT"),
    ])
}

/// Single-part multipart body with the given field name
fn multipart_body(field: &str, filename: &str, bytes: &[u8]) -> (String, Bytes) {
    let boundary = "scenetable-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    (
        format!("multipart/form-data; boundary={boundary}"),
        Bytes::from(body),
    )
}

async fn upload(ctx: &TestContext, filename: &str, bytes: &[u8]) -> axum_test::TestResponse {
    let (content_type, body) = multipart_body("file", filename, bytes);
    ctx.server
        .post("/upload")
        .content_type(&content_type)
        .bytes(body)
        .await
}

async fn history_len(ctx: &TestContext) -> usize {
    let history: Vec<Value> = ctx.server.get("/history").await.json();
    history.len()
}

fn dir_entries(path: &Path) -> usize {
    std::fs::read_dir(path).map(|entries| entries.count()).unwrap_or(0)
}

#[tokio::test]
async fn test_health_endpoint() -> Result<()> {
    let ctx = setup_test_server().await?;

    let response = ctx.server.get("/health").await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let body: Value = response.json();
    assert_eq!(body["service"], "scenetable");
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());

    Ok(())
}

#[tokio::test]
async fn test_upload_result_download_flow() -> Result<()> {
    let ctx = setup_test_server().await?;

    let response = upload(&ctx, "script.zip", &two_entry_zip()).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let receipt: Value = response.json();
    let id = receipt["id"].as_i64().unwrap();
    let data = receipt["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    let columns: Vec<&str> = data[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    for column in SCENE_COLUMNS {
        assert!(columns.contains(&column), "missing column {}", column);
    }

    // Result detail mirrors the upload response
    let response = ctx.server.get(&format!("/result/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let detail: Value = response.json();
    assert_eq!(detail["id"], id);
    assert_eq!(detail["filename"], "script.zip");
    assert_eq!(detail["data"], receipt["data"]);
    assert_eq!(detail["download_url"], format!("/download/{}", id));
    assert!(detail["created_at"].is_string());

    // Download serves the stored spreadsheet
    let response = ctx.server.get(&format!("/download/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let disposition = response
        .header("content-disposition")
        .to_str()?
        .to_string();
    let results: Vec<_> = std::fs::read_dir(ctx.results_dir())?
        .map(|entry| entry.map(|e| e.file_name().to_string_lossy().into_owned()))
        .collect::<Result<_, _>>()?;
    assert_eq!(results.len(), 1);
    assert_eq!(disposition, format!("attachment; filename=\"{}\"", results[0]));
    assert!(results[0].ends_with(".xlsx"));

    let bytes = response.as_bytes();
    assert_eq!(
        bytes.as_ref(),
        std::fs::read(ctx.results_dir().join(&results[0]))?.as_slice()
    );
    assert!(bytes.starts_with(b"PK"));

    Ok(())
}

#[tokio::test]
async fn test_new_upload_heads_history() -> Result<()> {
    let ctx = setup_test_server().await?;

    let first: Value = upload(&ctx, "first.zip", &two_entry_zip()).await.json();
    let second: Value = upload(&ctx, "Second.ZIP", &two_entry_zip()).await.json();

    let history: Vec<Value> = ctx.server.get("/history").await.json();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["id"], second["id"]);
    assert_eq!(history[0]["filename"], "Second.ZIP");
    assert_eq!(history[1]["id"], first["id"]);
    assert!(history[0].get("data").is_none());

    let page: Vec<Value> = ctx
        .server
        .get("/history")
        .add_query_param("offset", 1)
        .add_query_param("limit", 1)
        .await
        .json();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["id"], first["id"]);

    Ok(())
}

#[tokio::test]
async fn test_unsupported_extension_is_rejected() -> Result<()> {
    let ctx = setup_test_server().await?;
    let before = history_len(&ctx).await;

    let response = upload(&ctx, "script.rar", b"Rar!\x1a\x07\x00").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNSUPPORTED_FILE_TYPE");
    assert_eq!(history_len(&ctx).await, before);
    assert_eq!(dir_entries(&ctx.uploads_dir()), 0);

    Ok(())
}

#[tokio::test]
async fn test_corrupt_archive_is_rejected_and_cleaned_up() -> Result<()> {
    let ctx = setup_test_server().await?;

    let response = upload(&ctx, "script.zip", b"this is not a zip archive").await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_ARCHIVE");
    assert_ne!(body["detail"], "Internal server error");
    assert_eq!(history_len(&ctx).await, 0);
    assert_eq!(dir_entries(&ctx.uploads_dir()), 0);
    assert_eq!(dir_entries(&ctx.results_dir()), 0);

    Ok(())
}

#[tokio::test]
async fn test_traversal_archive_is_rejected() -> Result<()> {
    let ctx = setup_test_server().await?;
    let bytes = build_zip(&[("../../../escape.txt", "nope")]);

    let response = upload(&ctx, "evil.zip", &bytes).await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(dir_entries(&ctx.uploads_dir()), 0);
    assert!(!ctx.root.path().join("escape.txt").exists());

    Ok(())
}

#[tokio::test]
async fn test_empty_archive_is_processed() -> Result<()> {
    let ctx = setup_test_server().await?;

    let response = upload(&ctx, "empty.zip", &build_zip(&[])).await;

    assert_eq!(response.status_code(), StatusCode::OK);
    let receipt: Value = response.json();
    assert_eq!(receipt["data"].as_array().unwrap().len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_missing_file_field() -> Result<()> {
    let ctx = setup_test_server().await?;
    let (content_type, body) = multipart_body("attachment", "script.zip", &two_entry_zip());

    let response = ctx
        .server
        .post("/upload")
        .content_type(&content_type)
        .bytes(body)
        .await;

    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "MISSING_FILE");

    Ok(())
}

#[tokio::test]
async fn test_unknown_ids_are_not_found() -> Result<()> {
    let ctx = setup_test_server().await?;

    let response = ctx.server.get("/result/999999").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["code"], "NOT_FOUND");

    let response = ctx.server.get("/download/999999").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_ids_outside_issued_range_are_not_found() -> Result<()> {
    let ctx = setup_test_server().await?;

    for path in [
        "/result/99999999999",
        "/download/99999999999",
        "/result/-99999999999999999999999",
    ] {
        let response = ctx.server.get(path).await;
        assert_eq!(response.status_code(), StatusCode::NOT_FOUND, "{}", path);
        let body: Value = response.json();
        assert_eq!(body["code"], "NOT_FOUND");
    }

    Ok(())
}

#[tokio::test]
async fn test_malformed_requests_use_error_body() -> Result<()> {
    let ctx = setup_test_server().await?;

    let response = ctx.server.get("/result/abc").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_REQUEST");

    let response = ctx.server.get("/history").add_query_param("offset", "-1").await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_REQUEST");

    let response = ctx
        .server
        .post("/upload")
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{}"))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_REQUEST");

    Ok(())
}

#[tokio::test]
async fn test_history_offset_past_sqlite_range() -> Result<()> {
    let ctx = setup_test_server().await?;
    upload(&ctx, "script.zip", &two_entry_zip()).await;

    for offset in ["9223372036854775807", "9223372036854775808", "18446744073709551615"] {
        let response = ctx.server.get("/history").add_query_param("offset", offset).await;
        assert_eq!(response.status_code(), StatusCode::OK, "offset {}", offset);
        let page: Vec<Value> = response.json();
        assert!(page.is_empty());
    }

    Ok(())
}

#[tokio::test]
async fn test_oversized_upload_is_payload_too_large() -> Result<()> {
    let ctx = setup_test_server_with(|config, _| config.max_upload_bytes = 1024).await?;

    let response = upload(&ctx, "script.zip", &vec![b'x'; 8 * 1024]).await;

    assert_eq!(response.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert_eq!(history_len(&ctx).await, 0);
    assert_eq!(dir_entries(&ctx.uploads_dir()), 0);

    Ok(())
}

#[tokio::test]
async fn test_download_with_missing_file_is_server_error() -> Result<()> {
    let ctx = setup_test_server().await?;
    let receipt: Value = upload(&ctx, "script.zip", &two_entry_zip()).await.json();
    let id = receipt["id"].as_i64().unwrap();

    for entry in std::fs::read_dir(ctx.results_dir())? {
        std::fs::remove_file(entry?.path())?;
    }

    let response = ctx.server.get(&format!("/download/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["detail"], "Internal server error");

    // the record itself is still readable
    let response = ctx.server.get(&format!("/result/{}", id)).await;
    assert_eq!(response.status_code(), StatusCode::OK);

    Ok(())
}

#[tokio::test]
async fn test_without_frontend_only_api_answers() -> Result<()> {
    let ctx = setup_test_server().await?;

    assert_eq!(ctx.server.get("/").await.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(
        ctx.server.get("/some/page").await.status_code(),
        StatusCode::NOT_FOUND
    );

    Ok(())
}

#[tokio::test]
async fn test_frontend_bundle_is_served() -> Result<()> {
    let ctx = setup_test_server_with(|config, root| {
        let dist = root.join("dist");
        std::fs::create_dir_all(dist.join("assets")).unwrap();
        std::fs::write(dist.join("index.html"), "<html>scene table</html>").unwrap();
        std::fs::write(dist.join("assets/app.js"), "console.log('app')").unwrap();
        config.frontend_dist = dist;
    })
    .await?;

    let response = ctx.server.get("/").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("scene table"));

    let response = ctx.server.get("/assets/app.js").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert!(response.text().contains("console.log"));

    // client-side routes fall back to the index page
    let response = ctx.server.get("/history/view").await;
    assert!(response.text().contains("scene table"));

    // API routes still win
    assert_eq!(ctx.server.get("/history").await.status_code(), StatusCode::OK);

    Ok(())
}
