//! Advisor Configuration
//!
//! Defaults, optionally overridden by a JSON file and then by environment
//! variables:
//! - `CROP_DATASET` - reference CSV path
//! - `KNN_K` - neighbours per prediction
//! - `TOP_N` - crops listed by ranking summaries

use crate::classifier::DEFAULT_K;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATASET_PATH: &str = "data/crop_recommendation.csv";
pub const DEFAULT_TOP_N: usize = 10;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AdvisorConfig {
    pub dataset_path: PathBuf,
    pub k: usize,
    pub top_n: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            k: DEFAULT_K,
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl AdvisorConfig {
    /// Load configuration from a JSON file; absent keys keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: AdvisorConfig = serde_json::from_str(&contents)
            .with_context(|| "Failed to parse config JSON")?;

        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by environment variables
    pub fn from_env() -> Result<Self> {
        Self::default().with_env()
    }

    /// Apply environment overrides on top of `self`
    pub fn with_env(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CROP_DATASET") {
            self.dataset_path = PathBuf::from(path);
        }
        if let Some(k) = lookup("KNN_K") {
            self.k = k
                .parse()
                .with_context(|| format!("KNN_K must be a positive integer, got '{}'", k))?;
        }
        if let Some(n) = lookup("TOP_N") {
            self.top_n = n
                .parse()
                .with_context(|| format!("TOP_N must be a positive integer, got '{}'", n))?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            anyhow::bail!("k must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AdvisorConfig::default();
        assert_eq!(config.k, 5);
        assert_eq!(config.top_n, 10);
        assert_eq!(config.dataset_path, PathBuf::from("data/crop_recommendation.csv"));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: AdvisorConfig = serde_json::from_str(r#"{ "k": 3 }"#).unwrap();
        assert_eq!(config.k, 3);
        assert_eq!(config.top_n, DEFAULT_TOP_N);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [("KNN_K", "7"), ("CROP_DATASET", "/tmp/crops.csv")]
            .into_iter()
            .collect();

        let config = AdvisorConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.k, 7);
        assert_eq!(config.dataset_path, PathBuf::from("/tmp/crops.csv"));
    }

    fn write_config(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("crop_advisor_{}_{}.json", name, std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_from_file() {
        let path = write_config("valid", r#"{ "dataset_path": "/srv/crops.csv", "k": 3 }"#);
        let config = AdvisorConfig::load(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.dataset_path, PathBuf::from("/srv/crops.csv"));
        assert_eq!(config.k, 3);
        assert_eq!(config.top_n, DEFAULT_TOP_N);
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = std::env::temp_dir().join("crop_advisor_no_such_config.json");
        let err = AdvisorConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_load_malformed_json_fails() {
        let path = write_config("malformed", r#"{ "k": "#);
        let result = AdvisorConfig::load(&path);
        fs::remove_file(&path).unwrap();

        let err = result.unwrap_err();
        assert!(err.to_string().contains("Failed to parse config JSON"));
    }

    #[test]
    fn test_load_rejects_zero_k() {
        let path = write_config("zero_k", r#"{ "k": 0 }"#);
        let result = AdvisorConfig::load(&path);
        fs::remove_file(&path).unwrap();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_k_rejected() {
        let bad = AdvisorConfig::default().with_overrides(|key| {
            (key == "KNN_K").then(|| "zero".to_string())
        });
        assert!(bad.is_err());

        let zero = AdvisorConfig::default().with_overrides(|key| {
            (key == "KNN_K").then(|| "0".to_string())
        });
        assert!(zero.is_err());
    }
}
