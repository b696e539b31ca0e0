// The terminal belongs to the UI, so log lines go to a file next to the
// config instead of stderr.
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::BEATLINE_DIR;

const LOG_FILE: &str = "beatline.log";

pub fn log_file_path(project_dir: &Path) -> PathBuf {
    project_dir.join(BEATLINE_DIR).join(LOG_FILE)
}

// RUST_LOG wins over the configured filter; a bad filter string falls back
// to "info"
fn filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_log(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Returns false when the log file can't be opened; the app runs without
/// logging in that case.
pub fn init(project_dir: &Path, fallback_filter: &str) -> bool {
    let Ok(file) = open_log(&log_file_path(project_dir)) else {
        return false;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter(fallback_filter))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_lives_beside_the_config() {
        let path = log_file_path(Path::new("/tmp/project"));
        assert_eq!(path, Path::new("/tmp/project/.beatline/beatline.log"));
    }

    #[test]
    fn opening_creates_the_directory() {
        let dir = std::env::temp_dir().join(format!("beatline-log-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        assert!(open_log(&log_file_path(&dir)).is_ok());
        assert!(log_file_path(&dir).exists());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unopenable_log_reports_false() {
        // a plain file where the .beatline directory should be
        let dir = std::env::temp_dir().join(format!("beatline-nolog-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(BEATLINE_DIR), "").unwrap();
        assert!(!init(&dir, "info"));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
