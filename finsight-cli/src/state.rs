use anyhow::{Context, Result};
use finsight_core::AnalysisRecord;
use std::fs;
use std::path::{Path, PathBuf};

pub fn finsight_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".finsight"))
}

pub fn ensure_finsight_home() -> Result<PathBuf> {
    let dir = finsight_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// A saved analysis in the camelCase record shape (see sample_analysis.json).
pub fn read_analysis_file(path: &Path) -> Result<AnalysisRecord> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse analysis from {}", path.display()))
}
