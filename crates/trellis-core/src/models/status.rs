//! Step status enumeration.

use std::str::FromStr;

#[cfg(feature = "schema")]
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Type-safe enumeration of step statuses.
///
/// No transition table is enforced here; any status may be set directly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "schema", derive(JsonSchema))]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Step has not been picked up yet
    #[default]
    NotStarted,

    /// Step is being worked on
    InProgress,

    /// Step has been completed
    Completed,

    /// Step needs external intervention before work can continue
    Blocked,
}

impl StepStatus {
    /// All statuses, in display order.
    pub const ALL: [StepStatus; 4] = [
        StepStatus::NotStarted,
        StepStatus::InProgress,
        StepStatus::Completed,
        StepStatus::Blocked,
    ];

    /// Wire and storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "not_started",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Blocked => "blocked",
        }
    }

    /// Whether the flow may still pick this step up.
    pub fn is_actionable(&self) -> bool {
        matches!(self, StepStatus::NotStarted | StepStatus::InProgress)
    }

    /// Status marker used in plan views.
    ///
    /// ```rust
    /// use trellis_core::models::StepStatus;
    ///
    /// assert_eq!(StepStatus::Completed.with_icon(), "[✓]");
    /// assert_eq!(StepStatus::InProgress.with_icon(), "[→]");
    /// assert_eq!(StepStatus::NotStarted.with_icon(), "[ ]");
    /// assert_eq!(StepStatus::Blocked.with_icon(), "[!]");
    /// ```
    pub fn with_icon(&self) -> &'static str {
        match self {
            StepStatus::NotStarted => "[ ]",
            StepStatus::InProgress => "[→]",
            StepStatus::Completed => "[✓]",
            StepStatus::Blocked => "[!]",
        }
    }
}

impl FromStr for StepStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StepStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "Invalid step_status: {s}. Valid statuses are: not_started, in_progress, completed, blocked"
                )
            })
    }
}
