pub mod archive_intake;
pub mod submission_service;
pub mod upload_record;
pub mod upload_service;

pub use archive_intake::{ArchiveIntake, Workspace};
pub use submission_service::{ResultDownload, SubmissionService};
pub use upload_record::{UploadDetail, UploadReceipt, UploadRecord, UploadSummary};
pub use upload_service::UploadService;
