//! Reader configuration, persisted as TOML.
//!
//! Every field has a serde default, so a partial (or absent) file is valid.

use std::path::Path;
use std::time::Duration;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::library::segment::ChapterSegmenter;

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read config: {path}")]
    #[diagnostic(
        code(sidelines::config::read),
        help("Ensure the config file is readable.")
    )]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {path}: {message}")]
    #[diagnostic(
        code(sidelines::config::parse),
        help("Check the TOML syntax. Unknown keys are ignored; remove the file to use defaults.")
    )]
    Parse { path: String, message: String },

    #[error("failed to write config: {path}")]
    #[diagnostic(
        code(sidelines::config::write),
        help("Ensure you have write permissions to the config directory.")
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderConfig {
    /// Characters shown on the narrow surface.
    #[serde(default = "default_window_width")]
    pub window_width: usize,
    /// Fine step size in characters.
    #[serde(default = "default_fine_step")]
    pub fine_step: usize,
    /// Page jump size in characters.
    #[serde(default = "default_page_step")]
    pub page_step: usize,
    /// Trailing delay before reading state is written.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Shorter content lines are dropped during segmentation.
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Longer lines are never chapter titles.
    #[serde(default = "default_max_title_chars")]
    pub max_title_chars: usize,
}

fn default_window_width() -> usize {
    50
}
fn default_fine_step() -> usize {
    5
}
fn default_page_step() -> usize {
    50
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_min_content_chars() -> usize {
    2
}
fn default_max_title_chars() -> usize {
    80
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            window_width: default_window_width(),
            fine_step: default_fine_step(),
            page_step: default_page_step(),
            debounce_ms: default_debounce_ms(),
            min_content_chars: default_min_content_chars(),
            max_title_chars: default_max_title_chars(),
        }
    }
}

impl ReaderConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn segmenter(&self) -> ChapterSegmenter {
        ChapterSegmenter::new(self.min_content_chars, self.max_title_chars)
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Load from `path`, or defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Render as pretty TOML.
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<memory>".into(),
            message: e.to_string(),
        })
    }

    /// Save to a TOML file.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::Write {
                path: parent.display().to_string(),
                source: e,
            })?;
        }
        std::fs::write(path, content).map_err(|e| ConfigError::Write {
            path: path.display().to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_defaults() {
        let config: ReaderConfig = toml::from_str("window_width = 30\n").unwrap();
        assert_eq!(config.window_width, 30);
        assert_eq!(config.page_step, 50);
        assert_eq!(config.debounce(), Duration::from_millis(500));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ReaderConfig::load_or_default(&dir.path().join("none.toml")).unwrap();
        assert_eq!(config, ReaderConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "window_width = \"wide\"").unwrap();
        assert!(matches!(
            ReaderConfig::load_or_default(&path),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn rendered_toml_parses_back() {
        let config = ReaderConfig {
            window_width: 72,
            ..Default::default()
        };
        let text = config.to_toml().unwrap();
        assert!(text.contains("window_width = 72"));
        assert_eq!(toml::from_str::<ReaderConfig>(&text).unwrap(), config);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let config = ReaderConfig {
            fine_step: 3,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ReaderConfig::load(&path).unwrap(), config);
    }
}
