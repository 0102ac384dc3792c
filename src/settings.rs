use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsl::vm::Limits;
use crate::error::AppError;

const SETTINGS_VERSION: u32 = 1;

/// Simulation settings, stored as JSON.
///
/// Every field falls back to its default when missing, so older or
/// hand-trimmed files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    pub version: u32,
    /// Worker threads ticking bots. Defaults to the available parallelism.
    pub workers: usize,
    /// Machine runs per bot per world tick.
    pub cycles_per_tick: u32,
    /// Instruction budget per section. None = unlimited.
    pub max_steps_per_phase: Option<usize>,
    pub default_scenario: String,
    /// Fixed physics step in seconds.
    pub dt: f64,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            workers: default_workers(),
            cycles_per_tick: 1,
            max_steps_per_phase: None,
            default_scenario: "all".to_string(),
            dt: 1.0 / 60.0,
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

impl SimSettings {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.workers == 0 {
            return Err(AppError::invalid_settings("workers must be at least 1"));
        }
        if self.cycles_per_tick == 0 {
            return Err(AppError::invalid_settings("cycles_per_tick must be at least 1"));
        }
        if !(self.dt.is_finite() && self.dt > 0.0) {
            return Err(AppError::invalid_settings(format!("dt must be a positive number, got {}", self.dt)));
        }
        Ok(())
    }

    pub fn limits(&self) -> Limits {
        Limits {
            max_steps_per_phase: self.max_steps_per_phase,
        }
    }
}

/// Load and validate settings. Returns `Ok(None)` if the file does not exist.
pub fn load_settings(path: &Path) -> Result<Option<SimSettings>, AppError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path).map_err(|e| AppError::io(path, e))?;
    let settings: SimSettings = serde_json::from_str(&data).map_err(|e| AppError::json(path, e))?;
    settings.validate()?;
    debug!(path = %path.display(), workers = settings.workers, "settings loaded");
    Ok(Some(settings))
}

/// Save settings, creating the parent directory if needed.
pub fn save_settings(path: &Path, settings: &SimSettings) -> Result<(), AppError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| AppError::io(dir, e))?;
    }
    let json = serde_json::to_string_pretty(settings).map_err(|e| AppError::json(path, e))?;
    atomic_write(path, json.as_bytes()).map_err(|e| AppError::io(path, e))
}

/// Write to a sibling temp file, fsync, then rename over the target. The
/// previous file is kept as `<name>.bak` when possible.
fn atomic_write(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let file_name = path.file_name().unwrap_or_default();

    let mut tmp_name = OsString::from(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let mut bak_name = OsString::from(file_name);
    bak_name.push(".bak");
    let bak_path = path.with_file_name(&bak_name);

    let mut file = fs::File::create(&tmp_path)?;
    file.write_all(data)?;
    file.sync_all()?;
    drop(file);

    // Best-effort backup
    if path.exists() {
        let _ = fs::rename(path, &bak_path);
    }

    fs::rename(&tmp_path, path)
}
