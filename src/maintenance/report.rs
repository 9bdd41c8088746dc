//! Operator-facing rendering of run summaries.
//!
//! Procedures return plain summary values; everything about how they are
//! shown lives here.

use super::batch::RecordFailure;
use super::budget::MigrationSummary;
use super::cleanup::CleanupSummary;
use crate::core::{Result, StoreError};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Group digits in threes: `900000000` -> `900,000,000`.
pub fn format_amount(amount: i64) -> String {
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if amount < 0 {
        grouped.push('-');
    }
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

/// Pretty-printed JSON form of a summary, for `--json`.
///
/// A dry run adds `"dry_run": true` and the number of writes that were held
/// back, so the output cannot be mistaken for a live run.
pub fn to_json<T: Serialize>(summary: &T, planned_writes: Option<usize>) -> Result<String> {
    let mut value = serde_json::to_value(summary).map_err(|e| StoreError::decode("summary", e))?;
    if let (Some(planned), Value::Object(fields)) = (planned_writes, &mut value) {
        fields.insert("dry_run".to_string(), Value::Bool(true));
        fields.insert("planned_writes".to_string(), Value::from(planned));
    }
    serde_json::to_string_pretty(&value).map_err(|e| StoreError::decode("summary", e))
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

fn removed(count: Option<usize>) -> String {
    match count {
        Some(count) => format!("{count} removed"),
        None => "count unavailable".to_string(),
    }
}

fn write_failures(f: &mut fmt::Formatter<'_>, failures: &[RecordFailure]) -> fmt::Result {
    for failure in failures {
        writeln!(f, "    - {}: {}", failure.manager_id, failure.error)?;
    }
    Ok(())
}

impl fmt::Display for CleanupSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleanup summary")?;
        writeln!(
            f,
            "  loans cleared:    {} ({})",
            yes_no(self.loans_cleared),
            removed(self.loans_removed)
        )?;
        writeln!(
            f,
            "  matches cleared:  {} ({})",
            yes_no(self.matches_cleared),
            removed(self.matches_removed)
        )?;
        writeln!(f, "  managers reset:   {}", self.managers_updated())?;
        writeln!(f, "  failures:         {}", self.failures.len())?;
        write_failures(f, &self.failures)
    }
}

impl fmt::Display for MigrationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Budget migration (floor {})",
            format_amount(self.target_budget)
        )?;

        for change in &self.updated {
            writeln!(
                f,
                "  updated  {}: {} -> {} (+{})",
                label(&change.manager_id, change.manager_name.as_deref()),
                format_amount(change.old_budget),
                format_amount(change.new_budget),
                format_amount(change.delta)
            )?;
        }
        for skipped in &self.skipped {
            writeln!(
                f,
                "  skipped  {}: {} (already at or above floor)",
                label(&skipped.manager_id, skipped.manager_name.as_deref()),
                format_amount(skipped.budget)
            )?;
        }
        for failure in &self.failures {
            writeln!(f, "  FAILED   {}: {}", failure.manager_id, failure.error)?;
        }

        writeln!(
            f,
            "Updated: {}  Skipped: {}  Failed: {}  Added: {}",
            self.updated_count(),
            self.skipped_count(),
            self.failures.len(),
            format_amount(self.total_added())
        )
    }
}

fn label(manager_id: &str, manager_name: Option<&str>) -> String {
    match manager_name {
        Some(name) => format!("{manager_id} ({name})"),
        None => manager_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::maintenance::budget::{BudgetChange, SkippedManager};

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(0), "0");
        assert_eq!(format_amount(999), "999");
        assert_eq!(format_amount(1000), "1,000");
        assert_eq!(format_amount(900_000_000), "900,000,000");
        assert_eq!(format_amount(-1_234_567), "-1,234,567");
        assert_eq!(format_amount(i64::MIN), "-9,223,372,036,854,775,808");
    }

    #[test]
    fn test_cleanup_report_lists_failures() {
        let summary = CleanupSummary {
            loans_removed: Some(3),
            matches_removed: None,
            loans_cleared: true,
            matches_cleared: true,
            managers_reset: vec!["a".into(), "c".into()],
            failures: vec![RecordFailure {
                manager_id: "b".into(),
                error: "Write to 'managers/b' failed: HTTP 503".into(),
            }],
        };

        let text = summary.to_string();
        assert!(text.contains("loans cleared:    yes (3 removed)"));
        assert!(text.contains("matches cleared:  yes (count unavailable)"));
        assert!(text.contains("managers reset:   2"));
        assert!(text.contains("- b: Write to 'managers/b' failed"));
    }

    #[test]
    fn test_migration_report() {
        let summary = MigrationSummary {
            target_budget: 900_000_000,
            updated: vec![BudgetChange {
                manager_id: "alice".into(),
                manager_name: Some("Alice".into()),
                old_budget: 500_000_000,
                new_budget: 900_000_000,
                delta: 400_000_000,
            }],
            skipped: vec![SkippedManager {
                manager_id: "bob".into(),
                manager_name: None,
                budget: 950_000_000,
            }],
            failures: Vec::new(),
        };

        let text = summary.to_string();
        assert!(text.contains("alice (Alice): 500,000,000 -> 900,000,000 (+400,000,000)"));
        assert!(text.contains("skipped  bob: 950,000,000"));
        assert!(text.contains("Updated: 1  Skipped: 1  Failed: 0  Added: 400,000,000"));
    }

    #[test]
    fn test_json_report() {
        let summary = CleanupSummary::default();
        let json = to_json(&summary, None).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["loans_removed"], Value::Null);
        assert!(value["failures"].as_array().unwrap().is_empty());
        assert!(value.get("planned_writes").is_none());
    }

    #[test]
    fn test_json_report_marks_dry_run() {
        let summary = MigrationSummary {
            target_budget: 10,
            ..Default::default()
        };
        let json = to_json(&summary, Some(4)).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["dry_run"], true);
        assert_eq!(value["planned_writes"], 4);
        assert_eq!(value["target_budget"], 10);
    }
}
