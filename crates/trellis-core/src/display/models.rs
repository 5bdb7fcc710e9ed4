//! Display implementations for domain models.
//!
//! Plans render as a plain-text report: a header underlined with `=`, a
//! progress line, per-status counts and the numbered steps with their status
//! markers and notes.

use std::fmt;

use crate::models::{Plan, PlanSummary, StepStatus};

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header = format!("Plan: {} (ID: {})", self.title(), self.plan_id());
        writeln!(f, "{header}")?;
        // The rule is one longer than the header line.
        writeln!(f, "{}", "=".repeat(header.chars().count() + 1))?;
        writeln!(f)?;

        let total = self.len();
        let completed = self.count(StepStatus::Completed);
        write!(f, "Progress: {completed}/{total} steps completed ")?;
        if total > 0 {
            let percentage = completed as f64 / total as f64 * 100.0;
            writeln!(f, "({percentage:.1}%)")?;
        } else {
            writeln!(f, "(0%)")?;
        }

        writeln!(
            f,
            "Status: {} completed, {} in progress, {} blocked, {} not started",
            completed,
            self.count(StepStatus::InProgress),
            self.count(StepStatus::Blocked),
            self.count(StepStatus::NotStarted)
        )?;
        writeln!(f)?;
        writeln!(f, "Steps:")?;

        for step in self.iter_steps() {
            writeln!(f, "{}. {} {}", step.index, step.status.with_icon(), step.text)?;
            if !step.notes.is_empty() {
                writeln!(f, "   Notes: {}", step.notes)?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_active { " (active)" } else { "" };
        writeln!(
            f,
            "• {}{}: {} - {}/{} steps completed",
            self.plan_id, marker, self.title, self.completed_steps, self.total_steps
        )
    }
}
