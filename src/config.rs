use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_BACKUP_SUFFIX, DEFAULT_EXTENSIONS};
use crate::error::{ConvertError, Result};

/// Optional TOML configuration; every key has a default
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// File extensions (without the dot) selected in the source directory
    pub extensions: Vec<String>,
    /// Suffix for the preserved original when converting in place
    pub backup_suffix: String,
    /// Extra managed type names, added before scanning
    pub managed_types: Vec<String>,
    /// Line-oriented managed type list, relative to the config file
    pub managed_types_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            backup_suffix: DEFAULT_BACKUP_SUFFIX.to_string(),
            managed_types: Vec::new(),
            managed_types_file: None,
        }
    }
}

impl Config {
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_content = fs::read_to_string(config_path).map_err(|e| {
            ConvertError::Config(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&config_content)?;
        if let (Some(file), Some(dir)) = (&config.managed_types_file, config_path.parent()) {
            if file.is_relative() {
                config.managed_types_file = Some(dir.join(file));
            }
        }
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.extensions.is_empty() {
            return Err(ConvertError::Config(
                "at least one file extension is required".to_string(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|e| e.is_empty() || e.contains('.')) {
            return Err(ConvertError::Config(format!(
                "invalid extension '{}': give it without the leading dot",
                ext
            )));
        }
        if self.backup_suffix.trim().is_empty() {
            return Err(ConvertError::Config(
                "backup_suffix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_keys_missing() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config.extensions, vec!["h", "cpp", "C"]);
        assert_eq!(config.backup_suffix, ".bak");
        assert!(config.managed_types.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::from_toml_str(
            r#"
            extensions = ["hpp", "cxx"]
            backup_suffix = ".orig"
            managed_types = ["Widget"]
            managed_types_file = "types.txt"
            "#,
        )
        .unwrap();
        assert_eq!(config.extensions, vec!["hpp", "cxx"]);
        assert_eq!(config.backup_suffix, ".orig");
        assert_eq!(config.managed_types, vec!["Widget"]);
        assert_eq!(config.managed_types_file, Some(PathBuf::from("types.txt")));
    }

    #[test]
    fn test_rejects_dotted_extension() {
        let err = Config::from_toml_str(r#"extensions = [".h"]"#).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_load_resolves_types_file_next_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcpp.toml");
        fs::write(&path, "managed_types_file = \"types.txt\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.managed_types_file, Some(dir.path().join("types.txt")));
    }

    #[test]
    fn test_load_missing_file_is_config_error() {
        let err = Config::load(Path::new("/nonexistent/mcpp.toml")).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }
}
