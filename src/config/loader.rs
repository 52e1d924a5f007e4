//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use crate::error::{PayrollError, PayrollResult};

use super::types::{PayrollConfig, PayrollPolicy, RateConfig};

/// Loads and provides access to payroll configuration.
///
/// # Directory Structure
///
/// ```text
/// config/payroll/
/// ├── rates.yaml   # Deduction and bonus rates (required)
/// └── policy.yaml  # Working days, worker pool, void policy (optional)
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/payroll").unwrap();
/// println!("Income tax rate: {}", loader.rates().income_tax_rate);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// Returns an error if `rates.yaml` is missing, if any file contains
    /// invalid YAML, or if a rate lies outside `0..=1`. A missing
    /// `policy.yaml` falls back to [`PayrollPolicy::default`].
    pub fn load<P: AsRef<Path>>(path: P) -> PayrollResult<Self> {
        let path = path.as_ref();

        let rates_path = path.join("rates.yaml");
        let rates = Self::load_yaml::<RateConfig>(&rates_path)?;
        if let Some((name, value)) = rates.out_of_range() {
            return Err(PayrollError::ConfigParseError {
                path: rates_path.display().to_string(),
                message: format!("{} must be between 0 and 1, got {}", name, value),
            });
        }

        let policy_path = path.join("policy.yaml");
        let policy = if policy_path.exists() {
            Self::load_yaml::<PayrollPolicy>(&policy_path)?
        } else {
            PayrollPolicy::default()
        };

        Ok(Self {
            config: PayrollConfig::new(rates, policy),
        })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: PayrollConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> PayrollResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| PayrollError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| PayrollError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying payroll configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Returns the deduction and bonus rates.
    pub fn rates(&self) -> &RateConfig {
        self.config.rates()
    }

    /// Returns the batch and lifecycle policy.
    pub fn policy(&self) -> &PayrollPolicy {
        self.config.policy()
    }

    /// Consumes the loader, returning the configuration.
    pub fn into_config(self) -> PayrollConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::path::PathBuf;

    fn config_path() -> &'static str {
        "./config/payroll"
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "payroll-engine-{}-{}",
            name,
            uuid::Uuid::new_v4()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_load_valid_configuration() {
        let result = ConfigLoader::load(config_path());
        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());

        let loader = result.unwrap();
        assert_eq!(loader.rates(), &RateConfig::default());
        assert_eq!(loader.policy().standard_working_days, 22);
        assert_eq!(loader.policy().worker_concurrency, 8);
    }

    #[test]
    fn test_load_missing_directory_returns_error() {
        let result = ConfigLoader::load("/nonexistent/path");

        match result {
            Err(PayrollError::ConfigNotFound { path }) => {
                assert!(path.contains("rates.yaml"));
            }
            _ => panic!("Expected ConfigNotFound error"),
        }
    }

    #[test]
    fn test_missing_policy_uses_defaults() {
        let dir = scratch_dir("no-policy");
        fs::write(
            dir.join("rates.yaml"),
            "income_tax_rate: \"0.20\"\nhealth_insurance_rate: \"0.00\"\nsocial_security_rate: \"0.00\"\nperformance_bonus_rate: \"0.00\"\n",
        )
        .unwrap();

        let loader = ConfigLoader::load(&dir).unwrap();
        assert_eq!(loader.rates().income_tax_rate, Decimal::new(20, 2));
        assert_eq!(loader.policy(), &PayrollPolicy::default());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_rate_above_one_is_rejected() {
        let dir = scratch_dir("bad-rate");
        fs::write(
            dir.join("rates.yaml"),
            "income_tax_rate: \"1.50\"\nhealth_insurance_rate: \"0.05\"\nsocial_security_rate: \"0.08\"\nperformance_bonus_rate: \"0.10\"\n",
        )
        .unwrap();

        match ConfigLoader::load(&dir) {
            Err(PayrollError::ConfigParseError { message, .. }) => {
                assert!(message.contains("income_tax_rate"));
            }
            other => panic!("Expected ConfigParseError, got {:?}", other),
        }

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_invalid_yaml_is_a_parse_error() {
        let dir = scratch_dir("bad-yaml");
        fs::write(dir.join("rates.yaml"), "income_tax_rate: [unclosed").unwrap();

        assert!(matches!(
            ConfigLoader::load(&dir),
            Err(PayrollError::ConfigParseError { .. })
        ));

        fs::remove_dir_all(dir).ok();
    }
}
