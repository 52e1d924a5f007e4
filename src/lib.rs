//! Payroll Settlement Engine
//!
//! This crate calculates monthly salaries from compensation and attendance,
//! tracks each paycheck through its settlement lifecycle, and runs
//! period-wide payroll batches that can be interrupted and resumed.

#![warn(missing_docs)]

pub mod api;
pub mod calculation;
pub mod config;
pub mod error;
pub mod models;
pub mod settlement;
pub mod sources;
pub mod store;
