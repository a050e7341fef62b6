//! File system paths for the console.

use crate::{CoreError, CoreResult};
use std::path::PathBuf;

/// Directory name created under the user's home directory.
const BASE_DIR_NAME: &str = ".qa-console";
/// Durable session key-value file.
const SESSION_FILE_NAME: &str = "session.json";
/// Central JSONL log file.
const LOG_FILE_NAME: &str = "console.jsonl";

/// Manages file system paths for the console.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Base directory for console files (~/.qa-console)
    base_dir: PathBuf,
}

impl Paths {
    /// Create a new Paths instance rooted at `~/.qa-console`.
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

    /// Get the base directory (~/.qa-console).
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Get the config file path (~/.qa-console/config.json).
    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    /// Get the session storage file path (~/.qa-console/session.json).
    ///
    /// Holds the access token, refresh handle and any other session-scoped
    /// keys. Removed wholesale on logout.
    pub fn session_file(&self) -> PathBuf {
        self.base_dir.join(SESSION_FILE_NAME)
    }

    /// Get the logs directory (~/.qa-console/logs).
    pub fn logs_dir(&self) -> PathBuf {
        self.base_dir.join("logs")
    }

    /// Get the console log file path (~/.qa-console/logs/console.jsonl).
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_with_base_dir() {
        let base = PathBuf::from("/tmp/test-qa-console");
        let paths = Paths::with_base_dir(base.clone());

        assert_eq!(paths.base_dir(), &base);
        assert_eq!(paths.config_file(), base.join("config.json"));
        assert_eq!(paths.session_file(), base.join("session.json"));
        assert_eq!(paths.logs_dir(), base.join("logs"));
        assert_eq!(paths.log_file(), base.join("logs/console.jsonl"));
    }

    #[test]
    fn test_paths_default() {
        let paths = Paths::new().unwrap();
        let home = dirs::home_dir().unwrap();

        assert_eq!(paths.base_dir(), &home.join(".qa-console"));
    }

    #[test]
    fn test_ensure_dirs_creates_directories() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("qa-console");
        let paths = Paths::with_base_dir(base.clone());

        assert!(!base.exists());
        assert!(!paths.logs_dir().exists());

        paths.ensure_dirs().unwrap();

        assert!(base.is_dir());
        assert!(paths.logs_dir().is_dir());
    }

    #[test]
    fn test_ensure_dirs_idempotent() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        paths.ensure_dirs().unwrap();
        paths.ensure_dirs().unwrap();

        assert!(paths.base_dir().exists());
        assert!(paths.logs_dir().exists());
    }

    #[test]
    fn test_log_file_inside_logs_dir() {
        let dir = tempdir().unwrap();
        let paths = Paths::with_base_dir(dir.path().to_path_buf());

        assert!(paths.log_file().starts_with(paths.logs_dir()));
    }
}
