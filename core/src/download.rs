//! Saving binary responses (templates, exports, documents) to disk.
//!
//! Bytes are written to a transient file inside the download directory and
//! renamed onto the target name once complete, so a partially written file
//! never carries the final name. The transient is removed on any failure.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{ApiError, Result};

/// A binary payload saved to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct Downloads {
    dir: PathBuf,
}

impl Downloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save `bytes` under `file_name` in the download directory. Only the
    /// final component of `file_name` is used.
    pub fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<Download> {
        let name = Path::new(file_name)
            .file_name()
            .filter(|n| !n.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("download"));
        let target = self.dir.join(name);

        let io_err = |source| ApiError::Download {
            path: target.clone(),
            source,
        };
        let mut transient = NamedTempFile::new_in(&self.dir).map_err(io_err)?;
        transient.write_all(&bytes).map_err(io_err)?;
        transient.persist(&target).map_err(|e| io_err(e.error))?;

        debug!(path = %target.display(), size = bytes.len(), "saved download");
        Ok(Download { path: target, bytes })
    }
}

/// File name from a `Content-Disposition` header, if it carries one.
pub fn content_disposition_filename(header: &str) -> Option<String> {
    header.split(';').map(str::trim).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }
        let value = value.trim().trim_matches('"');
        (!value.is_empty()).then(|| value.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_writes_target_and_leaves_no_transient() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = Downloads::new(dir.path());
        let saved = downloads.save("employee_template.csv", b"nrc,name\n".to_vec()).unwrap();

        assert_eq!(saved.path, dir.path().join("employee_template.csv"));
        assert_eq!(std::fs::read(&saved.path).unwrap(), b"nrc,name\n");
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn save_strips_directories_from_name() {
        let dir = tempfile::tempdir().unwrap();
        let saved = Downloads::new(dir.path()).save("../../etc/passwd", b"x".to_vec()).unwrap();
        assert_eq!(saved.path, dir.path().join("passwd"));
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let downloads = Downloads::new(dir.path().join("missing"));
        let err = downloads.save("a.pdf", b"x".to_vec()).unwrap_err();
        assert!(matches!(err, ApiError::Download { .. }));
    }

    #[test]
    fn filename_from_content_disposition() {
        assert_eq!(
            content_disposition_filename(r#"attachment; filename="contract.pdf""#).as_deref(),
            Some("contract.pdf")
        );
        assert_eq!(content_disposition_filename("inline").as_deref(), None);
        assert_eq!(content_disposition_filename(r#"attachment; filename="""#).as_deref(), None);
    }
}
