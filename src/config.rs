// Loaded on startup, written back on quit. Only UI settings live here;
// drawings and generated beats are never saved.
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::shared::{MAX_THICKNESS, MIN_THICKNESS};

pub const BEATLINE_DIR: &str = ".beatline";
const CONFIG_FILE: &str = "config.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub line_thickness: u32,
    pub master_gain: f32,
    pub frame_interval_ms: u64, // animation cadence, ~60fps by default
    pub seed: Option<u64>, // fixed seed makes beats reproducible
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            line_thickness: 2,
            master_gain: 0.8,
            frame_interval_ms: 16,
            seed: None,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    // out-of-range values from a hand-edited file get pulled back in
    fn sanitized(mut self) -> Self {
        self.line_thickness = self.line_thickness.clamp(MIN_THICKNESS, MAX_THICKNESS);
        self.master_gain = if self.master_gain.is_finite() {
            self.master_gain.clamp(0.0, 1.0)
        } else {
            Config::default().master_gain
        };
        self.frame_interval_ms = self.frame_interval_ms.clamp(1, 1000);
        self
    }
}

// <project_dir>/.beatline/config.json
fn config_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(BEATLINE_DIR).join(CONFIG_FILE)
}

// A missing file is a first run, not an error. A file that's there but
// doesn't parse is reported so the caller can log it once logging is up.
pub fn load_config(project_dir: &Path) -> anyhow::Result<Config> {
    let path = config_file_path(project_dir);
    let Ok(data) = std::fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    let config: Config = serde_json::from_str(&data)
        .with_context(|| format!("unreadable config at {}", path.display()))?;
    Ok(config.sanitized())
}

// Save the config to disk, making the files if they don't exist already
pub fn save_config(project_dir: &Path, config: &Config) -> anyhow::Result<()> {
    let path = config_file_path(project_dir);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?; // create .beatline/ if needed
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(&path, json)?;
    Ok(())
}
