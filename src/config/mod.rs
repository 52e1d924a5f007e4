//! Configuration loading and management for the payroll engine.
//!
//! This module loads deduction/bonus rates and operational policy from
//! YAML files so that jurisdictions and policies can vary without code
//! changes.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config/payroll").unwrap();
//! println!("Standard working days: {}", config.policy().standard_working_days);
//! ```

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{PayrollConfig, PayrollPolicy, RateConfig};
