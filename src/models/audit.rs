//! Audit records attached to calculated paychecks.

use serde::{Deserialize, Serialize};

/// A single step in a paycheck's audit trace recording a calculation decision.
///
/// Each step captures the input, output, and reasoning for one rule
/// application, so a settled paycheck can be explained figure by figure.
///
/// # Example
///
/// ```
/// use payroll_engine::models::AuditStep;
///
/// let step = AuditStep {
///     step_number: 1,
///     rule_id: "worked_days".to_string(),
///     rule_name: "Worked Day Proration".to_string(),
///     input: serde_json::json!({ "present_days": 20, "half_days": 2 }),
///     output: serde_json::json!({ "actual_working_days": "21" }),
///     reasoning: "20 present + 0.5 x 2 half days = 21".to_string(),
/// };
/// assert_eq!(step.rule_id, "worked_days");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditStep {
    /// The sequential step number.
    pub step_number: u32,
    /// The unique identifier of the rule that was applied.
    pub rule_id: String,
    /// The human-readable name of the rule.
    pub rule_name: String,
    /// The input data for this step.
    pub input: serde_json::Value,
    /// The output data from this step.
    pub output: serde_json::Value,
    /// Human-readable explanation of the decision.
    pub reasoning: String,
}
