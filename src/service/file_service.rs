//! Status-directory file store.
//!
//! Every lifecycle state owns one directory under the storage root, plus
//! a `Thumbnails` directory for preview renders. A job's model file (and
//! its metadata sidecar, when present) always lives in the directory of
//! the job's current status; moving between directories is the risky
//! half of every transition and runs before the database commit.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::module::print_job::schema::JobStatus;

pub const THUMBNAILS_DIR: &str = "Thumbnails";
pub const SIDECAR_SUFFIX: &str = ".metadata.json";

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("file not found: '{path}'")]
    NotFound { path: PathBuf },

    #[error("failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to move file from '{from}' to '{to}': {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result of a status-directory move. The sidecar is `None` when the job
/// has no sidecar or its move was skipped after a warning.
#[derive(Debug)]
pub struct MovedPaths {
    pub primary: PathBuf,
    pub sidecar: Option<PathBuf>,
}

pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn status_dir(&self, status: JobStatus) -> PathBuf {
        self.root.join(status.dir_name())
    }

    /// Creates the full directory layout: one directory per status plus
    /// the thumbnails directory. Idempotent.
    pub fn ensure_layout(&self) -> Result<(), StorageError> {
        for status in JobStatus::ALL {
            ensure_directory(&self.status_dir(status))?;
        }
        ensure_directory(&self.root.join(THUMBNAILS_DIR))?;
        Ok(())
    }

    /// Writes the uploaded bytes under `standardized_name` into the
    /// directory for `status` and returns the full path.
    pub fn save_upload(
        &self,
        status: JobStatus,
        standardized_name: &str,
        bytes: &[u8],
    ) -> Result<PathBuf, StorageError> {
        let dir = self.status_dir(status);
        ensure_directory(&dir)?;
        let path = dir.join(standardized_name);
        std::fs::write(&path, bytes).map_err(|e| StorageError::WriteFile {
            path: path.clone(),
            source: e,
        })?;
        Ok(path)
    }

    /// Writes a pretty-printed JSON sidecar next to `primary`. Sidecar
    /// persistence is best effort: on failure the job proceeds without a
    /// metadata path and the failure is logged.
    pub fn write_metadata_sidecar(
        &self,
        primary: &Path,
        metadata: &serde_json::Value,
    ) -> Option<PathBuf> {
        let path = sidecar_path(primary)?;
        let body = match serde_json::to_vec_pretty(metadata) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "metadata sidecar serialize failed");
                return None;
            }
        };
        match std::fs::write(&path, body) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "metadata sidecar write failed");
                None
            }
        }
    }

    /// Moves a job's primary file (and sidecar, when present) into the
    /// directory for `to`. The primary move is mandatory and errors out;
    /// a sidecar failure degrades to a warning and a `None` sidecar path.
    pub fn move_to_status_dir(
        &self,
        job_id: &str,
        primary: &Path,
        sidecar: Option<&Path>,
        to: JobStatus,
    ) -> Result<MovedPaths, StorageError> {
        if !primary.exists() {
            return Err(StorageError::NotFound {
                path: primary.to_path_buf(),
            });
        }
        let file_name = primary.file_name().ok_or_else(|| StorageError::NotFound {
            path: primary.to_path_buf(),
        })?;

        let dir = self.status_dir(to);
        ensure_directory(&dir)?;
        let new_primary = dir.join(file_name);
        move_file(primary, &new_primary)?;

        let new_sidecar = match sidecar {
            Some(old) if old.exists() => {
                let target = old.file_name().map(|n| dir.join(n));
                match target {
                    Some(target) => match move_file(old, &target) {
                        Ok(()) => Some(target),
                        Err(e) => {
                            warn!(
                                job_id,
                                error = %e,
                                "sidecar move failed; job continues without metadata path"
                            );
                            None
                        }
                    },
                    None => None,
                }
            }
            Some(old) => {
                warn!(job_id, path = %old.display(), "sidecar missing at move time");
                None
            }
            None => None,
        };

        Ok(MovedPaths {
            primary: new_primary,
            sidecar: new_sidecar,
        })
    }
}

/// Sidecar path for a primary file: same directory, same stem, with the
/// `.metadata.json` suffix.
pub fn sidecar_path(primary: &Path) -> Option<PathBuf> {
    let stem = primary.file_stem()?.to_str()?;
    Some(primary.with_file_name(format!("{stem}{SIDECAR_SUFFIX}")))
}

fn ensure_directory(path: &Path) -> Result<(), StorageError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| StorageError::CreateDirectory {
            path: path.to_path_buf(),
            source: e,
        })?;
    }
    Ok(())
}

/// Moves a file with `rename` first (atomic on one filesystem), falling
/// back to copy + delete for cross-device moves.
fn move_file(src: &Path, dst: &Path) -> Result<(), StorageError> {
    if std::fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    std::fs::copy(src, dst).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    std::fs::remove_file(src).map_err(|e| StorageError::MoveFile {
        from: src.to_path_buf(),
        to: dst.to_path_buf(),
        source: e,
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn ensure_layout_creates_all_status_dirs() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        store.ensure_layout().unwrap();

        for dir in [
            "Uploaded",
            "Pending",
            "ReadyToPrint",
            "Printing",
            "Completed",
            "PaidPickedUp",
            "Rejected",
            "Thumbnails",
        ] {
            assert!(temp.path().join(dir).is_dir(), "missing {dir}");
        }
    }

    #[test]
    fn save_upload_writes_into_status_dir() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());

        let path = store
            .save_upload(JobStatus::Uploaded, "JaneDoe_Filament_Blue_a1.stl", b"solid")
            .unwrap();

        assert_eq!(path, temp.path().join("Uploaded/JaneDoe_Filament_Blue_a1.stl"));
        assert_eq!(std::fs::read(&path).unwrap(), b"solid");
    }

    #[test]
    fn sidecar_written_next_to_primary() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let primary = store
            .save_upload(JobStatus::Uploaded, "JaneDoe_Filament_Blue_a1.stl", b"solid")
            .unwrap();

        let sidecar = store
            .write_metadata_sidecar(&primary, &json!({"student_name": "Jane Doe"}))
            .expect("sidecar path");

        assert_eq!(
            sidecar,
            temp.path().join("Uploaded/JaneDoe_Filament_Blue_a1.metadata.json")
        );
        let body = std::fs::read_to_string(&sidecar).unwrap();
        assert!(body.contains("Jane Doe"));
    }

    #[test]
    fn move_relocates_primary_and_sidecar() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let primary = store
            .save_upload(JobStatus::Uploaded, "JaneDoe_Filament_Blue_a1.stl", b"solid")
            .unwrap();
        let sidecar = store
            .write_metadata_sidecar(&primary, &json!({"color": "blue"}))
            .unwrap();

        let moved = store
            .move_to_status_dir("job-1", &primary, Some(&sidecar), JobStatus::Pending)
            .unwrap();

        assert!(!primary.exists());
        assert!(!sidecar.exists());
        assert!(moved.primary.exists());
        assert_eq!(
            moved.primary,
            temp.path().join("Pending/JaneDoe_Filament_Blue_a1.stl")
        );
        let moved_sidecar = moved.sidecar.expect("sidecar moved");
        assert!(moved_sidecar.exists());
        assert!(moved_sidecar.starts_with(temp.path().join("Pending")));
    }

    #[test]
    fn move_of_missing_primary_is_not_found() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());

        let missing = temp.path().join("Uploaded/ghost.stl");
        let err = store
            .move_to_status_dir("job-2", &missing, None, JobStatus::Pending)
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn missing_sidecar_degrades_to_none() {
        let temp = TempDir::new().unwrap();
        let store = FileStore::new(temp.path());
        let primary = store
            .save_upload(JobStatus::Uploaded, "AnnLee_Resin_Clear_b2.stl", b"solid")
            .unwrap();
        let ghost_sidecar = temp.path().join("Uploaded/AnnLee_Resin_Clear_b2.metadata.json");

        let moved = store
            .move_to_status_dir("job-3", &primary, Some(&ghost_sidecar), JobStatus::Pending)
            .unwrap();

        assert!(moved.primary.exists());
        assert!(moved.sidecar.is_none());
    }
}
