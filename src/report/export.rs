//! Saving and printing compiled reports.

use crate::error::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the report for `podcast_id`.
pub fn report_file_name(prefix: &str, podcast_id: &str) -> String {
    let id: String = podcast_id
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}.html", prefix, id)
}

/// A compiled report ready to be exported.
///
/// Both export modes write these exact bytes.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledReport {
    pub file_name: String,
    pub html: String,
}

impl CompiledReport {
    pub fn new(file_name: String, html: String) -> Self {
        Self { file_name, html }
    }

    /// Write the report into `dir`, creating it if needed.
    pub fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.html)?;
        info!("Report saved to {}", path.display());
        Ok(path)
    }

    /// Write the report to a temporary file for printing.
    ///
    /// The file is kept so the viewer can still read it after we return.
    pub fn write_print_copy(&self) -> Result<PathBuf> {
        let stem = self.file_name.trim_end_matches(".html");
        let mut file = tempfile::Builder::new()
            .prefix(&format!("{}-", stem))
            .suffix(".html")
            .tempfile()?;
        file.write_all(self.html.as_bytes())?;
        file.flush()?;

        let (_, path) = file.keep().map_err(|e| e.error)?;
        Ok(path)
    }

    /// Open the print copy in the system viewer, where it can be printed or
    /// saved as PDF.
    pub fn open_for_print(&self) -> Result<PathBuf> {
        let path = self.write_print_copy()?;
        open::that(&path)?;
        info!("Report opened for printing: {}", path.display());
        Ok(path)
    }
}
