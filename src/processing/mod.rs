//! The processing collaborator: turns an extracted script directory into a
//! scene table and a spreadsheet file.
//!
//! The upload workflow treats implementations as a black box. They run on the
//! blocking thread pool and may take as long as they need up to the
//! configured processing timeout.

pub mod sample;
pub mod spreadsheet;

use std::path::Path;

use anyhow::Result;

use crate::table::SceneTable;

pub use sample::SampleSceneProcessor;
pub use spreadsheet::write_table_xlsx;

pub trait ScriptProcessor: Send + Sync {
    /// Analyse `extracted_dir` and return the scene table.
    ///
    /// Must also write the same table as a spreadsheet at `output_path`
    /// before returning successfully.
    fn process(&self, extracted_dir: &Path, output_path: &Path) -> Result<SceneTable>;
}
