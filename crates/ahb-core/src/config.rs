//! Run configuration

use crate::align::KeyMatching;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

fn default_true() -> bool {
    true
}

/// Input and output locations plus comparison options for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Root holding the `FV<YY><MM>` version directories
    pub input_dir: PathBuf,
    /// Root receiving `<subsequent>_<previous>/<message format>/<checkId>.*`
    pub output_dir: PathBuf,
    /// How key values are compared
    #[serde(default)]
    pub key_matching: KeyMatching,
    #[serde(default = "default_true")]
    pub write_csv: bool,
    #[serde(default = "default_true")]
    pub write_xlsx: bool,
}

impl Config {
    /// Create a config with default options
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            key_matching: KeyMatching::default(),
            write_csv: true,
            write_xlsx: true,
        }
    }

    /// Load a config file from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Save the config file to JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.write_csv && !self.write_xlsx {
            return Err(Error::Config(
                "at least one of write_csv and write_xlsx must be enabled".to_string(),
            ));
        }
        if self.input_dir.as_os_str().is_empty() || self.output_dir.as_os_str().is_empty() {
            return Err(Error::Config(
                "input_dir and output_dir must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_from_minimal_json() {
        let config: Config =
            serde_json::from_str(r#"{"input_dir": "data/ahb", "output_dir": "data/output"}"#)
                .unwrap();
        assert_eq!(config, Config::new("data/ahb", "data/output"));
        assert_eq!(config.key_matching, KeyMatching::Exact);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_key_matching_names() {
        let config: Config = serde_json::from_str(
            r#"{"input_dir": "a", "output_dir": "b", "key_matching": "ignore_whitespace"}"#,
        )
        .unwrap();
        assert_eq!(config.key_matching, KeyMatching::IgnoreWhitespace);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ahb-diff.json");

        let mut config = Config::new("in", "out");
        config.write_xlsx = false;
        config.save(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_validate_rejects_no_outputs() {
        let mut config = Config::new("in", "out");
        config.write_csv = false;
        config.write_xlsx = false;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_empty_paths() {
        assert!(Config::new("", "out").validate().is_err());
    }
}
