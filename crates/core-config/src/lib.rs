//! Configuration loading and parsing.
//!
//! `scrawl.toml` is discovered in the working directory first (dev mode),
//! then under the platform config dir (`<config>/scrawl/scrawl.toml`).
//! Unknown fields are ignored so the file can grow without breaking older
//! builds; a file that fails to parse falls back to defaults with a log
//! line rather than aborting startup.

use anyhow::Result;
use serde::Deserialize;
use std::{fs, path::PathBuf};
use tracing::{info, warn};

#[derive(Debug, Deserialize, Clone)]
pub struct DisplayConfig {
    #[serde(default = "DisplayConfig::default_line_numbers")]
    pub line_numbers: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            line_numbers: Self::default_line_numbers(),
        }
    }
}

impl DisplayConfig {
    const fn default_line_numbers() -> bool {
        true
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct EditingConfig {
    #[serde(default = "EditingConfig::default_tab_width")]
    pub tab_width: usize,
    #[serde(default = "EditingConfig::default_use_spaces")]
    pub use_spaces: bool,
    #[serde(default = "EditingConfig::default_undo_history")]
    pub undo_history: usize,
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            tab_width: Self::default_tab_width(),
            use_spaces: Self::default_use_spaces(),
            undo_history: Self::default_undo_history(),
        }
    }
}

impl EditingConfig {
    const fn default_tab_width() -> usize {
        4
    }
    const fn default_use_spaces() -> bool {
        true
    }
    const fn default_undo_history() -> usize {
        1000
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub editing: EditingConfig,
}

#[derive(Debug, Default, Clone)]
pub struct Config {
    pub file: ConfigFile,
    /// Path the config was actually read from, when one existed.
    pub source: Option<PathBuf>,
}

/// Preferred config path: a local `scrawl.toml` wins over the platform
/// config directory.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("scrawl.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("scrawl").join("scrawl.toml");
    }
    PathBuf::from("scrawl.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(Config::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(mut file) => {
            if file.editing.tab_width == 0 {
                warn!(target: "config", "tab_width 0 replaced with default");
                file.editing.tab_width = EditingConfig::default_tab_width();
            }
            if file.editing.undo_history == 0 {
                warn!(target: "config", "undo_history 0 replaced with default");
                file.editing.undo_history = EditingConfig::default_undo_history();
            }
            info!(target: "config", path = %path.display(), "config_loaded");
            Ok(Config {
                file,
                source: Some(path),
            })
        }
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed");
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let cfg = load_from(Some(PathBuf::from("__no_such_config__.toml"))).unwrap();
        assert!(cfg.file.display.line_numbers);
        assert_eq!(cfg.file.editing.tab_width, 4);
        assert!(cfg.file.editing.use_spaces);
        assert_eq!(cfg.file.editing.undo_history, 1000);
        assert!(cfg.source.is_none());
    }

    #[test]
    fn parses_all_sections() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[display]\nline_numbers = false\n[editing]\ntab_width = 8\nuse_spaces = false\nundo_history = 50\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(!cfg.file.display.line_numbers);
        assert_eq!(cfg.file.editing.tab_width, 8);
        assert!(!cfg.file.editing.use_spaces);
        assert_eq!(cfg.file.editing.undo_history, 50);
        assert!(cfg.source.is_some());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[editing]\ntab_width = 2\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.editing.tab_width, 2);
        assert!(cfg.file.display.line_numbers);
    }

    #[test]
    fn unknown_fields_are_tolerated() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[display]\nline_numbers = true\nfuture_knob = 3\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.file.display.line_numbers);
    }

    #[test]
    fn zero_tab_width_is_replaced() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "[editing]\ntab_width = 0\n").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.editing.tab_width, 4);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "not [valid toml").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(cfg.file.editing.tab_width, 4);
        assert!(cfg.source.is_none());
    }
}
