//! Stored reports on disk.

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Errors from the report store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid report name: {0}")]
    InvalidName(String),

    #[error("report not found: {0}")]
    NotFound(String),

    #[error("report store I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A stored report as listed by [`ReportStore::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredReport {
    pub filename: String,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Utc>>,
}

/// Directory of Markdown reports, addressed by filename.
#[derive(Debug, Clone)]
pub struct ReportStore {
    dir: PathBuf,
}

impl ReportStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `clickup_report_{space_id}_{YYYYmmdd_HHMMSS}.md`
    pub fn filename_for(space_id: &str, at: DateTime<Local>) -> String {
        format!(
            "clickup_report_{}_{}.md",
            space_id,
            at.format("%Y%m%d_%H%M%S")
        )
    }

    /// Write a report for `space_id` and return its filename.
    ///
    /// The directory is created on demand. A report saved within the same
    /// second as an earlier one for the same space replaces it.
    pub fn save(
        &self,
        space_id: &str,
        content: &str,
        at: DateTime<Local>,
    ) -> Result<String, StoreError> {
        let filename = Self::filename_for(space_id, at);
        let path = self.resolve(&filename)?;

        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;
        std::fs::write(&path, content).map_err(|source| StoreError::Io {
            path: path.clone(),
            source,
        })?;

        info!("Report saved to {}", path.display());
        Ok(filename)
    }

    /// Stored reports, newest first. A missing directory is an empty store.
    pub fn list(&self) -> Result<Vec<StoredReport>, StoreError> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut reports = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| StoreError::Io {
                path: self.dir.clone(),
                source,
            })?;
            let filename = entry.file_name().to_string_lossy().into_owned();
            if !filename.ends_with(".md") {
                continue;
            }

            let metadata = entry.metadata().map_err(|source| StoreError::Io {
                path: entry.path(),
                source,
            })?;
            if !metadata.is_file() {
                continue;
            }

            reports.push(StoredReport {
                filename,
                size_bytes: metadata.len(),
                modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            });
        }

        reports.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| b.filename.cmp(&a.filename))
        });
        debug!("Found {} stored reports", reports.len());
        Ok(reports)
    }

    /// Read a stored report by filename.
    pub fn load(&self, filename: &str) -> Result<String, StoreError> {
        let path = self.resolve(filename)?;
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(filename.to_string()))
            }
            Err(source) => Err(StoreError::Io { path, source }),
        }
    }

    fn resolve(&self, filename: &str) -> Result<PathBuf, StoreError> {
        validate_filename(filename)?;
        Ok(self.dir.join(filename))
    }
}

/// Only bare `.md` names inside the store directory are addressable.
fn validate_filename(filename: &str) -> Result<(), StoreError> {
    let invalid = filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
        || filename.contains('\0')
        || !filename.ends_with(".md");

    if invalid {
        return Err(StoreError::InvalidName(filename.to_string()));
    }
    Ok(())
}
