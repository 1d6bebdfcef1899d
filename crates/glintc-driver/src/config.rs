//! TOML configuration for the `glintc` binary.
//!
//! Mirrors the pack's CLI config pattern: an optional file, discovered in
//! the current directory or the platform config directory, deserialized
//! with `serde`/`toml`, with every field defaulted so a missing file is not
//! an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use glintc_util::error::GlintError;

pub const CONFIG_FILE_NAME: &str = "glintc.toml";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Overrides the VM's `STACK_SIZE`.
    #[serde(default = "default_stack_size")]
    pub stack_size: usize,

    /// When set, argv element 0 is the user's first argument but the argv
    /// offset is 3 instead of 2 (script path occupies the skipped slot).
    #[serde(default)]
    pub file_first_argv: bool,

    /// `auto` / `always` / `never` - diagnostic coloring. The driver does
    /// not yet colorize output, but the knob is specified so a future
    /// diagnostic renderer has somewhere to read it from.
    #[serde(default = "default_color")]
    pub color: String,
}

fn default_stack_size() -> usize {
    256
}

fn default_color() -> String {
    "auto".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            stack_size: default_stack_size(),
            file_first_argv: false,
            color: default_color(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, GlintError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from_path(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, GlintError> {
        let content = std::fs::read_to_string(path).map_err(|source| GlintError::Io {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| GlintError::Config(format!("{}: {e}", path.display())))
    }

    fn find_config_file() -> Option<PathBuf> {
        let cwd = PathBuf::from(CONFIG_FILE_NAME);
        if cwd.exists() {
            return Some(cwd);
        }
        dirs::config_dir()
            .map(|dir| dir.join("glintc").join(CONFIG_FILE_NAME))
            .filter(|p| p.exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_documented_values() {
        let c = Config::default();
        assert_eq!(c.stack_size, 256);
        assert!(!c.file_first_argv);
        assert_eq!(c.color, "auto");
    }

    #[test]
    fn loads_overrides_from_an_explicit_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glintc.toml");
        std::fs::write(&path, "stack_size = 512\nfile_first_argv = true\n").unwrap();
        let c = Config::load_from_path(&path).unwrap();
        assert_eq!(c.stack_size, 512);
        assert!(c.file_first_argv);
        assert_eq!(c.color, "auto");
    }

    #[test]
    fn missing_explicit_path_is_an_error() {
        let path = Path::new("/nonexistent/glintc-test-config.toml");
        assert!(Config::load_from_path(path).is_err());
    }
}
