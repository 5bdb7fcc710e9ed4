//! Collection wrapper types for displaying groups of plans.

use std::{fmt, ops::Index};

use crate::models::PlanSummary;

/// Newtype wrapper for displaying the registry's plan list.
///
/// # Examples
///
/// ```rust
/// use trellis_core::{display::PlanSummaries, models::PlanSummary};
///
/// let summaries = PlanSummaries(vec![PlanSummary {
///     plan_id: "p1".to_string(),
///     title: "My Project".to_string(),
///     completed_steps: 2,
///     total_steps: 5,
///     is_active: true,
/// }]);
/// let output = summaries.to_string();
/// assert!(output.contains("• p1 (active): My Project - 2/5 steps completed"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummaries(pub Vec<PlanSummary>);

impl PlanSummaries {
    /// Check if the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of plan summaries in the collection.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Get an iterator over the plan summaries.
    pub fn iter(&self) -> std::slice::Iter<'_, PlanSummary> {
        self.0.iter()
    }
}

impl Index<usize> for PlanSummaries {
    type Output = PlanSummary;

    fn index(&self, index: usize) -> &Self::Output {
        &self.0[index]
    }
}

impl IntoIterator for PlanSummaries {
    type Item = PlanSummary;
    type IntoIter = std::vec::IntoIter<Self::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a PlanSummaries {
    type Item = &'a PlanSummary;
    type IntoIter = std::slice::Iter<'a, PlanSummary>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl fmt::Display for PlanSummaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return writeln!(
                f,
                "No plans available. Create a plan with the 'create' command."
            );
        }

        writeln!(f, "Available plans:")?;
        for plan in &self.0 {
            write!(f, "{plan}")?;
        }
        Ok(())
    }
}
