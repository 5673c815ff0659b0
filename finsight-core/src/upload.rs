//! Upload validation: gate a selected statement file before it can be analyzed.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// 10 MiB
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Accepted statement extensions (lowercase, without the dot)
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["pdf", "csv", "xlsx", "xls"];

/// A validated file selection, held for display until reset or replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadCandidate {
    pub name: String,
    pub extension: String,
    pub size_bytes: u64,
}

impl UploadCandidate {
    /// Size in MiB rounded to 2 decimals.
    pub fn size_mib(&self) -> f64 {
        let mib = self.size_bytes as f64 / (1024.0 * 1024.0);
        (mib * 100.0).round() / 100.0
    }
}

/// Lowercased text after the last `.`; `None` when there is no extension.
pub fn extension_of(name: &str) -> Option<String> {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.trim().to_ascii_lowercase())
        .filter(|ext| !ext.is_empty())
}

/// Validate a file's name and size.
///
/// Type is checked before size, so an oversized `.exe` reports `InvalidType`.
pub fn validate(name: &str, size_bytes: u64) -> Result<UploadCandidate, ValidationError> {
    let extension = extension_of(name);
    let extension = match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => ext,
        other => return Err(ValidationError::InvalidType { extension: other }),
    };

    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(ValidationError::TooLarge { size_bytes });
    }

    Ok(UploadCandidate {
        name: name.to_string(),
        extension,
        size_bytes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("statement.pdf")]
    #[case("STATEMENT.PDF")]
    #[case("export.csv")]
    #[case("march.2024.xlsx")]
    #[case("old.XLS")]
    fn test_accepts_allowed_extensions(#[case] name: &str) {
        let c = validate(name, 1024).unwrap();
        assert_eq!(c.name, name);
        assert!(ALLOWED_EXTENSIONS.contains(&c.extension.as_str()));
    }

    #[rstest]
    #[case("notes.txt", Some("txt"))]
    #[case("archive.pdf.zip", Some("zip"))]
    #[case("pdf", None)]
    #[case("trailing.", None)]
    fn test_rejects_other_types(#[case] name: &str, #[case] ext: Option<&str>) {
        let err = validate(name, 10).unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidType {
                extension: ext.map(str::to_string)
            }
        );
    }

    #[test]
    fn test_size_boundary() {
        assert!(validate("a.pdf", 10_485_760).is_ok());
        assert_eq!(
            validate("a.pdf", 10_485_761).unwrap_err(),
            ValidationError::TooLarge { size_bytes: 10_485_761 }
        );
    }

    #[test]
    fn test_type_checked_before_size() {
        let err = validate("big.exe", MAX_UPLOAD_BYTES * 2).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidType { .. }));
    }

    #[test]
    fn test_size_mib_rounding() {
        let c = validate("a.csv", 1_572_864).unwrap(); // 1.5 MiB
        assert_eq!(c.size_mib(), 1.5);
        let c = validate("a.csv", 1_000_000).unwrap();
        assert_eq!(c.size_mib(), 0.95);
    }
}
