//! Configuration file discovery and settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base name of configuration files (`stac.toml`, `stac.yaml`, `stac.json`).
pub const CONFIG_NAME: &str = "stac";

const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {format} config {path}: {message}")]
    Parse {
        path: PathBuf,
        format: &'static str,
        message: String,
    },
}

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Author recorded on annotations added by `nonling`.
    pub nonling_author: String,
    /// Author recorded on units created by `split-edu`.
    pub split_author: String,
    /// Annotator directory dialogue-act output is saved under.
    pub dialogue_act_annotator: String,
    /// Default output directory; a fresh temp dir when unset.
    pub output_dir: Option<PathBuf>,
    /// Default dialogue-act model file.
    pub model: Option<PathBuf>,
    /// Default lexicon resources directory.
    pub resources: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            nonling_author: "stac".to_string(),
            split_author: "stacutil".to_string(),
            dialogue_act_annotator: "simple-da".to_string(),
            output_dir: None,
            model: None,
            resources: None,
        }
    }
}

/// Configuration file contents. Every field is optional and overrides the
/// matching [`Settings`] default.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonling_author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub split_author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dialogue_act_annotator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<String>,

    /// File this config was loaded from.
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a specific file path.
    /// The format follows the file extension; anything unknown is read as JSON.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let parse_error = |format: &'static str, message: String| ConfigError::Parse {
            path: path.to_path_buf(),
            format,
            message,
        };

        let mut config: Config = match ext {
            "toml" => toml::from_str(&contents).map_err(|e| parse_error("TOML", e.to_string()))?,
            "yaml" | "yml" => {
                serde_yaml::from_str(&contents).map_err(|e| parse_error("YAML", e.to_string()))?
            }
            _ => serde_json::from_str(&contents).map_err(|e| parse_error("JSON", e.to_string()))?,
        };

        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Look for a config file in `dir`.
    pub fn find_in(dir: &Path) -> Option<PathBuf> {
        CONFIG_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", CONFIG_NAME, ext)))
            .find(|p| p.is_file())
    }

    /// Get the base directory for resolving relative paths.
    pub fn base_dir(&self) -> Option<PathBuf> {
        self.source_path
            .as_ref()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Resolve a path that may be relative to the config file.
    /// - Absolute paths are returned as-is
    /// - Paths starting with ~ are expanded
    /// - Relative paths are resolved relative to `base_dir`
    pub fn resolve_path(&self, path_str: &str, base_dir: &Path) -> PathBuf {
        let expanded = shellexpand::tilde(path_str);
        let path = Path::new(expanded.as_ref());

        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base_dir.join(path)
        }
    }

    /// Apply configuration to settings.
    pub fn apply_to_settings(&self, settings: &mut Settings, base_dir: &Path) {
        if let Some(ref author) = self.nonling_author {
            settings.nonling_author = author.clone();
        }
        if let Some(ref author) = self.split_author {
            settings.split_author = author.clone();
        }
        if let Some(ref annotator) = self.dialogue_act_annotator {
            settings.dialogue_act_annotator = annotator.clone();
        }
        if let Some(ref dir) = self.output_dir {
            settings.output_dir = Some(self.resolve_path(dir, base_dir));
        }
        if let Some(ref model) = self.model {
            settings.model = Some(self.resolve_path(model, base_dir));
        }
        if let Some(ref resources) = self.resources {
            settings.resources = Some(self.resolve_path(resources, base_dir));
        }
    }
}

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (--config flag).
    pub config_path: Option<PathBuf>,
    /// Resolve relative paths from CWD instead of the config file location.
    pub use_cwd: bool,
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Find the config file: the explicit path, then the current directory,
/// then the user config directory.
fn discover(options: &LoadOptions) -> Option<PathBuf> {
    if let Some(ref path) = options.config_path {
        return Some(path.clone());
    }
    Config::find_in(&current_dir()).or_else(|| {
        dirs::config_dir().and_then(|dir| Config::find_in(&dir.join(CONFIG_NAME)))
    })
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| PathBuf::from(shellexpand::tilde(&s).as_ref()))
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
pub fn load_settings_with_options(options: LoadOptions) -> Result<(Settings, Config), ConfigError> {
    let config = match discover(&options) {
        Some(path) => {
            tracing::debug!("Loading config from {}", path.display());
            Config::load_from_path(&path)?
        }
        None => Config::default(),
    };

    let mut settings = Settings::default();
    let base_dir = if options.use_cwd {
        current_dir()
    } else {
        config.base_dir().unwrap_or_else(current_dir)
    };
    config.apply_to_settings(&mut settings, &base_dir);

    // Environment variables take precedence over the config file
    if let Some(dir) = env_path("STAC_OUTPUT_DIR") {
        tracing::debug!("Using STAC_OUTPUT_DIR from environment: {}", dir.display());
        settings.output_dir = Some(dir);
    }
    if let Some(model) = env_path("STAC_MODEL") {
        tracing::debug!("Using STAC_MODEL from environment: {}", model.display());
        settings.model = Some(model);
    }
    if let Some(resources) = env_path("STAC_RESOURCES") {
        tracing::debug!("Using STAC_RESOURCES from environment: {}", resources.display());
        settings.resources = Some(resources);
    }

    Ok((settings, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_toml_and_resolve_relative_paths() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stac.toml");
        fs::write(
            &path,
            "split_author = \"me\"\nmodel = \"models/da.json\"\noutput_dir = \"/tmp/out\"\n",
        )
        .unwrap();

        let config = Config::load_from_path(&path).unwrap();
        let mut settings = Settings::default();
        config.apply_to_settings(&mut settings, &config.base_dir().unwrap());

        assert_eq!(settings.split_author, "me");
        assert_eq!(settings.nonling_author, "stac");
        assert_eq!(settings.model, Some(dir.path().join("models/da.json")));
        assert_eq!(settings.output_dir, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_load_yaml_and_json() {
        let dir = TempDir::new().unwrap();
        let yaml = dir.path().join("stac.yaml");
        fs::write(&yaml, "dialogue_act_annotator: da-test\n").unwrap();
        assert_eq!(
            Config::load_from_path(&yaml).unwrap().dialogue_act_annotator,
            Some("da-test".to_string())
        );

        let json = dir.path().join("stac.json");
        fs::write(&json, r#"{"nonling_author": "bot"}"#).unwrap();
        assert_eq!(
            Config::load_from_path(&json).unwrap().nonling_author,
            Some("bot".to_string())
        );
    }

    #[test]
    fn test_parse_error_names_format() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stac.toml");
        fs::write(&path, "split_author = ").unwrap();
        let err = Config::load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { format: "TOML", .. }));
    }

    #[test]
    fn test_find_in_prefers_toml() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Config::find_in(dir.path()), None);
        fs::write(dir.path().join("stac.json"), "{}").unwrap();
        fs::write(dir.path().join("stac.toml"), "").unwrap();
        assert_eq!(Config::find_in(dir.path()), Some(dir.path().join("stac.toml")));
    }

    #[test]
    fn test_resolve_path() {
        let config = Config::default();
        assert_eq!(
            config.resolve_path("/abs/corpus", Path::new("/base")),
            PathBuf::from("/abs/corpus")
        );
        assert_eq!(
            config.resolve_path("rel", Path::new("/base")),
            PathBuf::from("/base/rel")
        );
    }
}
