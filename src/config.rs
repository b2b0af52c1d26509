//! Configuration persistence for arbre settings.
//!
//! Settings are stored in `~/.config/arbre/config.toml`.

use crate::git::Bucket;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How trees are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Indented tree, one entry per line
    Tree,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub format: OutputFormat,
    pub show_status: bool,
    pub status_markers: bool,
    pub indent_width: usize,
    /// Folders deeper than this are listed collapsed
    pub max_depth: Option<usize>,
    /// Bucket for paths that match no status set
    pub fallback_bucket: Bucket,
    pub default_rev: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            format: OutputFormat::Tree,
            show_status: true,
            status_markers: true,
            indent_width: 2,
            max_depth: None,
            fallback_bucket: Bucket::Staged,
            default_rev: "HEAD".to_string(),
        }
    }
}

/// Returns the path to the config file: `~/.config/arbre/config.toml`
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("arbre").join("config.toml"))
}

/// Load configuration from disk. Returns default if file is missing or invalid.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => parse(&contents).unwrap_or_else(|err| {
            log::warn!("ignoring invalid config {}: {}", path.display(), err);
            Config::default()
        }),
        Err(_) => Config::default(),
    }
}

pub fn parse(contents: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(contents)
}

/// Save configuration to disk. Creates the config directory if needed.
pub fn save(config: &Config) -> std::io::Result<()> {
    let Some(path) = config_path() else {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine config directory",
        ));
    };

    // Create directory if it doesn't exist
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let contents = toml::to_string_pretty(config)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    std::fs::write(&path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.format, OutputFormat::Tree);
        assert_eq!(config.fallback_bucket, Bucket::Staged);
        assert_eq!(config.indent_width, 2);
        assert_eq!(config.default_rev, "HEAD");
        assert!(config.show_status);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config {
            format: OutputFormat::Json,
            show_status: false,
            status_markers: false,
            indent_width: 4,
            max_depth: Some(3),
            fallback_bucket: Bucket::Default,
            default_rev: "main".to_string(),
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed = parse(&toml_str).unwrap();

        assert_eq!(config, parsed);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        // Partial config with only some fields
        let partial = r#"
            format = "json"
            fallback_bucket = "modified"
        "#;

        let config = parse(partial).unwrap();
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.fallback_bucket, Bucket::Modified);
        // Other fields should be defaults
        assert_eq!(config.indent_width, 2);
        assert_eq!(config.max_depth, None);
        assert!(config.status_markers);
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        assert!(parse("this is not valid toml {{{{").is_err());
        assert!(parse("format = \"yaml\"").is_err());
    }
}
