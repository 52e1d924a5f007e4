//! In-memory implementation of every collaborator, loadable from YAML.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::{PayrollError, PayrollResult};
use crate::models::{AttendanceInput, CompensationInput, PayrollPeriod};

use super::{AttendanceSource, CompensationSource, EmployeeDirectory};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
struct EmployeeRecord {
    id: String,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default)]
    compensation: Option<CompensationInput>,
    /// Attendance keyed by period id.
    #[serde(default)]
    attendance: HashMap<String, AttendanceInput>,
}

impl EmployeeRecord {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            active: true,
            compensation: None,
            attendance: HashMap::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct DirectoryFile {
    #[serde(default)]
    employees: Vec<EmployeeRecord>,
}

#[derive(Debug, Default)]
struct DirectoryState {
    employees: BTreeMap<String, EmployeeRecord>,
    outages: HashSet<String>,
}

/// Employee directory, compensation profiles and attendance held in memory.
///
/// # Fixture Format
///
/// ```yaml
/// employees:
///   - id: emp_001
///     compensation:
///       base_salary: "3000.00"
///     attendance:
///       "2026-01": { present_days: 20, half_days: 2 }
///   - id: emp_002
///     active: false
/// ```
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
}

impl InMemoryDirectory {
    /// Creates an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a directory fixture from a YAML file.
    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> PayrollResult<Self> {
        let path_str = path.as_ref().display().to_string();

        let content = fs::read_to_string(path.as_ref()).map_err(|_| {
            PayrollError::ConfigNotFound {
                path: path_str.clone(),
            }
        })?;

        Self::from_yaml_str(&content).map_err(|e| match e {
            PayrollError::ConfigParseError { message, .. } => PayrollError::ConfigParseError {
                path: path_str,
                message,
            },
            other => other,
        })
    }

    /// Parses a directory fixture from YAML text.
    pub fn from_yaml_str(content: &str) -> PayrollResult<Self> {
        let file: DirectoryFile =
            serde_yaml::from_str(content).map_err(|e| PayrollError::ConfigParseError {
                path: "<inline>".to_string(),
                message: e.to_string(),
            })?;

        let mut state = DirectoryState::default();
        for record in file.employees {
            if state.employees.contains_key(&record.id) {
                return Err(PayrollError::ConfigParseError {
                    path: "<inline>".to_string(),
                    message: format!("duplicate employee id '{}'", record.id),
                });
            }
            state.employees.insert(record.id.clone(), record);
        }

        Ok(Self {
            state: RwLock::new(state),
        })
    }

    fn record_mut(&mut self, employee_id: &str) -> &mut EmployeeRecord {
        self.state
            .get_mut()
            .employees
            .entry(employee_id.to_string())
            .or_insert_with(|| EmployeeRecord::new(employee_id))
    }

    /// Adds an active employee with a compensation profile.
    pub fn with_employee(mut self, employee_id: &str, compensation: CompensationInput) -> Self {
        self.record_mut(employee_id).compensation = Some(compensation);
        self
    }

    /// Adds an active employee with no compensation profile.
    pub fn with_employee_without_profile(mut self, employee_id: &str) -> Self {
        self.record_mut(employee_id);
        self
    }

    /// Adds an inactive employee.
    pub fn with_inactive_employee(mut self, employee_id: &str, compensation: CompensationInput) -> Self {
        let record = self.record_mut(employee_id);
        record.active = false;
        record.compensation = Some(compensation);
        self
    }

    /// Records attendance for an employee and period.
    pub fn with_attendance(mut self, employee_id: &str, period_id: &str, attendance: AttendanceInput) -> Self {
        self.record_mut(employee_id)
            .attendance
            .insert(period_id.to_string(), attendance);
        self
    }

    /// Makes every lookup for the employee fail as if the upstream system were down.
    pub fn with_outage(mut self, employee_id: &str) -> Self {
        self.state.get_mut().outages.insert(employee_id.to_string());
        self
    }

    /// Replaces an employee's compensation profile.
    pub async fn set_compensation(&self, employee_id: &str, compensation: Option<CompensationInput>) {
        let mut state = self.state.write().await;
        state
            .employees
            .entry(employee_id.to_string())
            .or_insert_with(|| EmployeeRecord::new(employee_id))
            .compensation = compensation;
    }

    /// Replaces an employee's attendance for one period.
    pub async fn set_attendance(&self, employee_id: &str, period_id: &str, attendance: AttendanceInput) {
        let mut state = self.state.write().await;
        state
            .employees
            .entry(employee_id.to_string())
            .or_insert_with(|| EmployeeRecord::new(employee_id))
            .attendance
            .insert(period_id.to_string(), attendance);
    }

    fn check_outage(state: &DirectoryState, source_name: &str, employee_id: &str) -> PayrollResult<()> {
        if state.outages.contains(employee_id) {
            return Err(PayrollError::SourceUnavailable {
                source_name: source_name.to_string(),
                message: format!("lookup for employee {} failed", employee_id),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AttendanceSource for InMemoryDirectory {
    async fn get_attendance(
        &self,
        employee_id: &str,
        period: &PayrollPeriod,
    ) -> PayrollResult<Option<AttendanceInput>> {
        let state = self.state.read().await;
        Self::check_outage(&state, "attendance", employee_id)?;
        Ok(state
            .employees
            .get(employee_id)
            .and_then(|record| record.attendance.get(&period.id))
            .cloned())
    }
}

#[async_trait]
impl CompensationSource for InMemoryDirectory {
    async fn get_compensation(&self, employee_id: &str) -> PayrollResult<Option<CompensationInput>> {
        let state = self.state.read().await;
        Self::check_outage(&state, "compensation", employee_id)?;
        Ok(state
            .employees
            .get(employee_id)
            .and_then(|record| record.compensation.clone()))
    }
}

#[async_trait]
impl EmployeeDirectory for InMemoryDirectory {
    async fn list_active_employees(&self) -> PayrollResult<Vec<String>> {
        let state = self.state.read().await;
        Ok(state
            .employees
            .values()
            .filter(|record| record.active)
            .map(|record| record.id.clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PayFrequency;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn period() -> PayrollPeriod {
        PayrollPeriod {
            id: "2026-01".to_string(),
            name: "January 2026".to_string(),
            frequency: PayFrequency::Monthly,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            payment_date: NaiveDate::from_ymd_opt(2026, 2, 5).unwrap(),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_builder_lists_only_active_employees() {
        let directory = InMemoryDirectory::new()
            .with_employee("emp_002", CompensationInput::with_base_salary(dec("2000")))
            .with_employee("emp_001", CompensationInput::with_base_salary(dec("3000")))
            .with_inactive_employee("emp_003", CompensationInput::with_base_salary(dec("1000")));

        let employees = directory.list_active_employees().await.unwrap();
        assert_eq!(employees, vec!["emp_001".to_string(), "emp_002".to_string()]);
    }

    #[tokio::test]
    async fn test_missing_attendance_is_none() {
        let directory = InMemoryDirectory::new()
            .with_employee("emp_001", CompensationInput::with_base_salary(dec("3000")));

        let attendance = directory.get_attendance("emp_001", &period()).await.unwrap();
        assert!(attendance.is_none());
    }

    #[tokio::test]
    async fn test_outage_reports_source_unavailable() {
        let directory = InMemoryDirectory::new()
            .with_employee("emp_001", CompensationInput::with_base_salary(dec("3000")))
            .with_outage("emp_001");

        let result = directory.get_compensation("emp_001").await;
        match result {
            Err(PayrollError::SourceUnavailable { source_name, .. }) => {
                assert_eq!(source_name, "compensation")
            }
            other => panic!("Expected SourceUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_set_compensation_replaces_profile() {
        let directory = InMemoryDirectory::new().with_employee_without_profile("emp_001");
        assert!(directory.get_compensation("emp_001").await.unwrap().is_none());

        directory
            .set_compensation("emp_001", Some(CompensationInput::with_base_salary(dec("2500"))))
            .await;
        let profile = directory.get_compensation("emp_001").await.unwrap().unwrap();
        assert_eq!(profile.base_salary, Some(dec("2500")));
    }

    #[tokio::test]
    async fn test_parse_yaml_fixture() {
        let yaml = r#"
employees:
  - id: emp_001
    compensation:
      base_salary: "3000.00"
      allowances:
        pension: "50.00"
    attendance:
      "2026-01": { present_days: 20, half_days: 2 }
  - id: emp_002
    active: false
"#;
        let directory = InMemoryDirectory::from_yaml_str(yaml).unwrap();

        assert_eq!(
            directory.list_active_employees().await.unwrap(),
            vec!["emp_001".to_string()]
        );
        let attendance = directory
            .get_attendance("emp_001", &period())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(attendance.worked_days(), dec("21"));
        let profile = directory.get_compensation("emp_001").await.unwrap().unwrap();
        assert_eq!(profile.allowances.total(), Some(dec("50.00")));
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let yaml = "employees:\n  - id: emp_001\n  - id: emp_001\n";
        let result = InMemoryDirectory::from_yaml_str(yaml);
        assert!(matches!(result, Err(PayrollError::ConfigParseError { .. })));
    }

    #[test]
    fn test_missing_fixture_file() {
        let result = InMemoryDirectory::from_yaml_file("/nonexistent/directory.yaml");
        assert!(matches!(result, Err(PayrollError::ConfigNotFound { .. })));
    }

    #[test]
    fn test_bundled_fixture_loads() {
        let result = InMemoryDirectory::from_yaml_file("./config/directory.yaml");
        assert!(result.is_ok(), "Failed to load fixture: {:?}", result.err());
    }
}
