//! File system paths for the demo.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory under the home directory holding config and logs.
const BASE_DIR_NAME: &str = ".anon-link";
/// JSONL log file name inside the logs directory.
const LOG_FILE_NAME: &str = "anon-link.jsonl";

/// Manages file system paths.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory (~/.anon-link)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.anon-link`.
    pub fn new() -> CoreResult<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| CoreError::Path("Could not determine home directory".to_string()))?;

        Ok(Self {
            base_dir: home.join(BASE_DIR_NAME),
        })
    }

    /// Create a new Paths instance with a custom base directory.
    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Get the config file path (~/.anon-link/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the logs directory (~/.anon-link/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the JSONL log file path (~/.anon-link/logs/anon-link.jsonl).
    pub fn log_file(&self) -> PathBuf {
        self.logs_dir().join(LOG_FILE_NAME)
    }

    /// Ensure all required directories exist.
    pub fn ensure_dirs(&self) -> CoreResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        std::fs::create_dir_all(self.logs_dir())?;
        Ok(())
    }
}
