//! Test environment abstraction for isolated testing.
//!
//! Provides `TestEnvironment` to manage:
//! - An isolated presets directory
//! - A scratch directory for state files and masks
//!
//! # Usage
//!
//! ```ignore
//! use trellis_config::testing::TestEnvironment;
//!
//! #[test]
//! fn test_something() {
//!     let env = TestEnvironment::new().unwrap();
//!     env.create_preset("fast", r#"{"learning_rate": 0.1}"#).unwrap();
//! }
//! ```

use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

/// Atomic counter for unique test IDs
static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Isolated test environment with unique paths
pub struct TestEnvironment {
    /// Temporary directory (dropped on cleanup)
    _temp_dir: TempDir,
    /// Isolated presets directory
    pub presets_dir: PathBuf,
    /// Scratch directory for state files and rasters
    pub scratch_dir: PathBuf,
    /// Unique test ID
    pub test_id: u32,
}

impl TestEnvironment {
    /// Create a new isolated test environment
    pub fn new() -> anyhow::Result<Self> {
        let test_id = TEST_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_dir = TempDir::new()?;
        let root = temp_dir.path();

        let presets_dir = root.join("presets");
        let scratch_dir = root.join("scratch");
        std::fs::create_dir_all(&presets_dir)?;
        std::fs::create_dir_all(&scratch_dir)?;

        Ok(Self {
            _temp_dir: temp_dir,
            presets_dir,
            scratch_dir,
            test_id,
        })
    }

    /// Write a `<name>.json` preset with the given content
    pub fn create_preset(&self, name: &str, json: &str) -> anyhow::Result<PathBuf> {
        let path = self.presets_dir.join(format!("{}.json", name));
        std::fs::write(&path, json)?;
        Ok(path)
    }

    /// Create a scratch file with content
    pub fn create_file(&self, relative_path: &str, content: &[u8]) -> anyhow::Result<PathBuf> {
        let path = self.scratch_dir.join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Unique scratch path for this test (not created)
    pub fn scratch_path(&self, name: &str) -> PathBuf {
        self.scratch_dir.join(format!("{}-{}", self.test_id, name))
    }

    /// A config pointing at this environment's presets directory
    pub fn config(&self) -> crate::Config {
        let mut cfg = crate::Config::default();
        cfg.presets.dir = self.presets_dir.clone();
        cfg
    }
}

impl Default for TestEnvironment {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_creates_directories() {
        let env = TestEnvironment::new().unwrap();
        assert!(env.presets_dir.exists());
        assert!(env.scratch_dir.exists());
    }

    #[test]
    fn test_environment_has_unique_ids() {
        let env1 = TestEnvironment::new().unwrap();
        let env2 = TestEnvironment::new().unwrap();
        assert_ne!(env1.test_id, env2.test_id);
        assert_ne!(env1.scratch_path("a"), env2.scratch_path("a"));
    }

    #[test]
    fn test_create_preset() {
        let env = TestEnvironment::new().unwrap();
        let path = env.create_preset("fast", "{}").unwrap();
        assert!(path.ends_with("fast.json"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
    }

    #[test]
    fn test_config_points_at_presets() {
        let env = TestEnvironment::new().unwrap();
        assert_eq!(env.config().presets.dir, env.presets_dir);
    }
}
