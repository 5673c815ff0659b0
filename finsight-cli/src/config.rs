use anyhow::{Context, Result};
use finsight_core::ProcessingConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::ensure_finsight_home;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSection,
    pub processing: ProcessingSection,
    pub export: ExportSection,
    pub delete: DeleteSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    /// Everything before `/v1`
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusSourceKind {
    /// Elapsed-time simulation, no backend needed
    #[default]
    Simulated,
    /// Poll the backend's status endpoint
    Remote,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingSection {
    pub upload_step_delay_ms: u64,
    pub upload_step_percent: u8,
    pub poll_interval_ms: u64,
    pub max_duration_ms: u64,
    /// Polling gives up after `max_duration_ms` times this
    pub deadline_factor: u32,
    pub status_source: StatusSourceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub out_dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteSection {
    /// Pause between the success notification and returning to the upload view
    pub redirect_delay_ms: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for ProcessingSection {
    fn default() -> Self {
        let d = ProcessingConfig::default();
        Self {
            upload_step_delay_ms: d.upload_step_delay.as_millis() as u64,
            upload_step_percent: d.upload_step_percent,
            poll_interval_ms: d.poll_interval.as_millis() as u64,
            max_duration_ms: d.max_duration.as_millis() as u64,
            deadline_factor: d.deadline_factor,
            status_source: StatusSourceKind::Simulated,
        }
    }
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            out_dir: PathBuf::from("."),
        }
    }
}

impl Default for DeleteSection {
    fn default() -> Self {
        Self {
            redirect_delay_ms: 1000,
        }
    }
}

impl ApiSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ProcessingSection {
    pub fn to_processing_config(&self) -> ProcessingConfig {
        ProcessingConfig {
            upload_step_delay: Duration::from_millis(self.upload_step_delay_ms),
            upload_step_percent: self.upload_step_percent,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            max_duration: Duration::from_millis(self.max_duration_ms),
            deadline_factor: self.deadline_factor,
            ..ProcessingConfig::default()
        }
    }
}

impl DeleteSection {
    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_finsight_home()?.join("config.toml"))
}

pub fn load_config() -> Result<Config> {
    load_config_from(&config_path()?)
}

/// Missing file means defaults; missing keys fall back per section.
pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    toml::from_str(&s).with_context(|| format!("parse {}", p.display()))
}

pub fn save_config_to(p: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

/// Write the defaults unless a config already exists; true if written.
pub fn init_config_at(p: &Path) -> Result<bool> {
    if p.exists() {
        return Ok(false);
    }
    save_config_to(p, &Config::default())?;
    Ok(true)
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if init_config_at(&p)? {
        println!("Wrote {}", p.display());
    } else {
        println!("Config already exists: {}", p.display());
    }
    Ok(())
}
