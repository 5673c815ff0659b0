//! finsight-export: CSV and PDF renderings of an analysis record

pub mod csv_export;
pub mod pdf_export;

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

pub use csv_export::{csv_file_name, render_csv};
pub use pdf_export::{pdf_file_name, render_pdf};

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("pdf error: {0}")]
    Pdf(String),
}

/// File-name stem derived from the statement's `fileName`. Path separators
/// become `_` and leading dots are dropped, so the result always names a
/// plain file inside the export directory.
pub(crate) fn safe_stem(file_name: &str) -> String {
    let replaced: String = file_name
        .chars()
        .map(|c| match c {
            '/' | '\\' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = replaced.trim_start_matches('.');
    if stem.is_empty() {
        "statement".to_string()
    } else {
        stem.to_string()
    }
}

/// A rendered export, ready to be saved under `file_name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ExportArtifact {
    /// Write into `dir`, returning the full path. `file_name` must be a single
    /// plain path component.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        let mut parts = Path::new(&self.file_name).components();
        if !matches!((parts.next(), parts.next()), (Some(Component::Normal(_)), None)) {
            return Err(ExportError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("export file name is not a plain file name: {}", self.file_name),
            )));
        }
        std::fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "export written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_to_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        let artifact = ExportArtifact {
            file_name: "finsight-data-x.csv".to_string(),
            bytes: b"\"a\"\n".to_vec(),
        };
        let path = artifact.write_to(&out).unwrap();
        assert_eq!(path, out.join("finsight-data-x.csv"));
        assert_eq!(std::fs::read(&path).unwrap(), b"\"a\"\n");
    }

    #[test]
    fn test_safe_stem_flattens_paths() {
        assert_eq!(safe_stem("march.pdf"), "march.pdf");
        assert_eq!(safe_stem("uploads/march.pdf"), "uploads_march.pdf");
        assert_eq!(safe_stem("uploads/../march.pdf"), "uploads_.._march.pdf");
        assert_eq!(safe_stem("..\\..\\march.csv"), "_.._march.csv");
        assert_eq!(safe_stem("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(safe_stem(".."), "statement");
        assert_eq!(safe_stem(""), "statement");
    }

    #[test]
    fn test_write_to_rejects_nested_names() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("exports");
        for name in ["../escape.csv", "nested/report.pdf", ".."] {
            let artifact = ExportArtifact {
                file_name: name.to_string(),
                bytes: Vec::new(),
            };
            let err = artifact.write_to(&out).unwrap_err();
            assert!(matches!(err, ExportError::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
        }
        assert!(!dir.path().join("escape.csv").exists());
    }
}
