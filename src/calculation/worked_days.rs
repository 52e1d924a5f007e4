//! Worked-day resolution.
//!
//! Attendance is optional. When the attendance source has no record for the
//! period, the employee is assumed to have worked every contracted day.

use rust_decimal::Decimal;

use crate::models::{AttendanceInput, AuditStep};

/// The resolved worked days and the audit step recording how they were found.
#[derive(Debug, Clone)]
pub struct WorkedDaysResult {
    /// Days worked, with half days counting 0.5.
    pub actual_working_days: Decimal,
    /// True when no attendance record existed and full attendance was assumed.
    pub assumed_full_attendance: bool,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Resolves the worked days for a period.
///
/// # Arguments
///
/// * `attendance` - The attendance record, if the source had one
/// * `contracted_working_days` - Days used when no attendance exists
/// * `step_number` - The step number for audit trail sequencing
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::resolve_worked_days;
/// use payroll_engine::models::AttendanceInput;
/// use rust_decimal::Decimal;
///
/// let attendance = AttendanceInput { present_days: 20, half_days: 2, ..Default::default() };
/// let result = resolve_worked_days(Some(&attendance), 22, 1);
/// assert_eq!(result.actual_working_days, Decimal::from(21));
///
/// let fallback = resolve_worked_days(None, 22, 1);
/// assert_eq!(fallback.actual_working_days, Decimal::from(22));
/// ```
pub fn resolve_worked_days(
    attendance: Option<&AttendanceInput>,
    contracted_working_days: u32,
    step_number: u32,
) -> WorkedDaysResult {
    match attendance {
        Some(attendance) => {
            let actual_working_days = attendance.worked_days();
            let audit_step = AuditStep {
                step_number,
                rule_id: "worked_days".to_string(),
                rule_name: "Worked Day Proration".to_string(),
                input: serde_json::json!({
                    "present_days": attendance.present_days,
                    "half_days": attendance.half_days,
                    "absent_days": attendance.absent_days,
                    "late_days": attendance.late_days,
                    "leave_days": attendance.leave_days
                }),
                output: serde_json::json!({
                    "actual_working_days": actual_working_days.normalize().to_string(),
                    "assumed_full_attendance": false
                }),
                reasoning: format!(
                    "{} present + 0.5 x {} half days = {}",
                    attendance.present_days,
                    attendance.half_days,
                    actual_working_days.normalize()
                ),
            };

            WorkedDaysResult {
                actual_working_days,
                assumed_full_attendance: false,
                audit_step,
            }
        }
        None => {
            let actual_working_days = Decimal::from(contracted_working_days);
            let audit_step = AuditStep {
                step_number,
                rule_id: "worked_days".to_string(),
                rule_name: "Worked Day Proration".to_string(),
                input: serde_json::json!({
                    "attendance": null,
                    "contracted_working_days": contracted_working_days
                }),
                output: serde_json::json!({
                    "actual_working_days": actual_working_days.to_string(),
                    "assumed_full_attendance": true
                }),
                reasoning: format!(
                    "No attendance record - full attendance of {} contracted days assumed",
                    contracted_working_days
                ),
            };

            WorkedDaysResult {
                actual_working_days,
                assumed_full_attendance: true,
                audit_step,
            }
        }
    }
}
