//! Isolated configuration directories.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use unholy_config::{ConfigPaths, ConfigResolver};

/// Core Unholyfile used by tests: predictable image and volume, one script.
pub const TEST_CORE: &str = "\
---
[dev]
image = \"example.test/devenv:latest\"
volume = \"workspace\"

[compose]
file = \"docker-compose.yml\"
---
#!/bin/sh
echo core
";

/// A temporary configuration directory.
///
/// # Example
///
/// ```rust,no_run
/// use unholy_test_utils::TestConfigDir;
///
/// let dir = TestConfigDir::new();
/// dir.write_project("demo", "---\nrepository = \"https://example.test/demo.git\"\n---\n");
/// let resolver = dir.resolver();
/// ```
pub struct TestConfigDir {
    temp_dir: TempDir,
}

impl Default for TestConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestConfigDir {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths::new(self.root())
    }

    /// A resolver over this directory using [`TEST_CORE`].
    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(self.paths()).with_core(TEST_CORE)
    }

    pub fn write_user(&self, text: &str) -> PathBuf {
        let path = self.paths().user_config();
        fs::write(&path, text).unwrap();
        path
    }

    pub fn write_project(&self, name: &str, text: &str) -> PathBuf {
        let path = self.paths().project_config(name);
        fs::write(&path, text).unwrap();
        path
    }

    pub fn read_project(&self, name: &str) -> String {
        fs::read_to_string(self.paths().project_config(name))
            .unwrap_or_else(|e| panic!("read_project: failed to read '{name}': {e}"))
    }
}
