use std::fs;
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};
use uuid::Uuid;
use zip::ZipArchive;

use crate::errors::{UploadError, UploadResult};

pub const ARCHIVE_EXTENSION: &str = ".zip";
pub const DEFAULT_ARCHIVE_NAME: &str = "uploaded.zip";
const EXTRACTED_DIR: &str = "extracted";

/// The per-upload directory tree holding the raw archive and its contents.
#[derive(Clone, Debug)]
pub struct Workspace {
    /// 128-bit random token rendered as 32 hex chars
    pub id: String,
    pub root: PathBuf,
    pub archive_path: PathBuf,
    pub extracted_dir: PathBuf,
    pub entry_count: usize,
}

/// Validates, stores and extracts uploaded script archives.
#[derive(Clone, Debug)]
pub struct ArchiveIntake {
    upload_root: PathBuf,
}

impl ArchiveIntake {
    pub fn new(upload_root: impl Into<PathBuf>) -> Self {
        Self {
            upload_root: upload_root.into(),
        }
    }

    /// Extension check only; touches nothing on disk.
    pub fn validate_filename(filename: &str) -> UploadResult<()> {
        if filename.to_lowercase().ends_with(ARCHIVE_EXTENSION) {
            Ok(())
        } else {
            Err(UploadError::UnsupportedFileType(filename.to_string()))
        }
    }

    pub fn new_workspace_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    /// Validate the name, then store and extract on the blocking pool.
    pub async fn accept_upload(&self, filename: &str, bytes: Vec<u8>) -> UploadResult<Workspace> {
        Self::validate_filename(filename)?;

        let intake = self.clone();
        let filename = filename.to_string();
        tokio::task::spawn_blocking(move || intake.accept(&filename, &bytes))
            .await
            .map_err(|e| UploadError::Io(std::io::Error::other(e)))?
    }

    /// Blocking version of [`accept_upload`](Self::accept_upload).
    ///
    /// On any failure after the workspace is created the whole tree is
    /// removed again.
    pub fn accept(&self, filename: &str, bytes: &[u8]) -> UploadResult<Workspace> {
        Self::validate_filename(filename)?;

        let id = Self::new_workspace_id();
        let root = self.upload_root.join(&id);
        fs::create_dir_all(&root)?;

        match Self::populate(&id, &root, filename, bytes) {
            Ok(workspace) => {
                info!(
                    "Extracted {} entries from '{}' into workspace {}",
                    workspace.entry_count, filename, id
                );
                Ok(workspace)
            }
            Err(e) => {
                warn!("Rejecting upload '{}': {}", filename, e);
                if let Err(cleanup_err) = fs::remove_dir_all(&root) {
                    warn!(
                        "Failed to remove workspace {}: {}",
                        root.display(),
                        cleanup_err
                    );
                }
                Err(e)
            }
        }
    }

    fn populate(id: &str, root: &Path, filename: &str, bytes: &[u8]) -> UploadResult<Workspace> {
        let archive_path = root.join(stored_archive_name(filename));
        fs::write(&archive_path, bytes)?;

        let extracted_dir = root.join(EXTRACTED_DIR);
        let entry_count = extract_archive(&archive_path, &extracted_dir)?;

        Ok(Workspace {
            id: id.to_string(),
            root: root.to_path_buf(),
            archive_path,
            extracted_dir,
            entry_count,
        })
    }
}

/// Only the final component of the client-supplied name is used on disk.
fn stored_archive_name(filename: &str) -> String {
    Path::new(filename)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| DEFAULT_ARCHIVE_NAME.to_string())
}

/// Relative path an entry may be written to, or `None` if it would escape.
fn safe_entry_path(name: &str, enclosed: Option<&Path>) -> Option<PathBuf> {
    let enclosed = enclosed?;
    if enclosed.is_absolute() {
        return None;
    }

    let mut relative = PathBuf::new();
    for component in enclosed.components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                debug!("Archive entry '{}' leaves the extraction root", name);
                return None;
            }
        }
    }
    Some(relative)
}

/// Extract every entry of `archive_path` under `target_dir`.
///
/// Returns the number of files written. Unreadable archives and entries that
/// would land outside `target_dir` are [`UploadError::InvalidArchive`].
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> UploadResult<usize> {
    let file = fs::File::open(archive_path)?;
    let mut archive =
        ZipArchive::new(file).map_err(|e| UploadError::InvalidArchive(e.to_string()))?;

    fs::create_dir_all(target_dir)?;

    let mut written = 0;
    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| UploadError::InvalidArchive(e.to_string()))?;
        let name = entry.name().to_string();
        let enclosed = entry.enclosed_name();

        let relative = safe_entry_path(&name, enclosed.as_deref()).ok_or_else(|| {
            UploadError::InvalidArchive(format!("entry '{}' escapes the archive root", name))
        })?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let out_path = target_dir.join(&relative);
        if entry.is_dir() {
            fs::create_dir_all(&out_path)?;
            continue;
        }
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut contents = Vec::new();
        entry
            .read_to_end(&mut contents)
            .map_err(|e| UploadError::InvalidArchive(format!("entry '{}': {}", name, e)))?;
        fs::write(&out_path, &contents)?;
        written += 1;
    }

    Ok(written)
}
