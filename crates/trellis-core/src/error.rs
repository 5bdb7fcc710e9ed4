//! Error types for the plan engine.

use std::path::PathBuf;

use thiserror::Error;

/// Error type for all registry, store, sync and flow operations.
#[derive(Error, Debug)]
pub enum PlanError {
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// No plan id was given and no plan is active
    #[error("No active plan. Please specify a plan_id or set an active plan.")]
    NoActivePlan,
    /// A plan with this id already exists
    #[error("A plan with ID '{plan_id}' already exists. Use 'update' to modify existing plans.")]
    PlanExists { plan_id: String },
    /// Plan not found for the given id
    #[error("No plan found with ID: {plan_id}")]
    PlanNotFound { plan_id: String },
    /// SQLite connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Remote mirror errors
    #[error("Sync error: {message}")]
    Sync { message: String },
    /// A step names an agent that is not in the pool
    #[error("No agent named '{name}' is configured for this flow")]
    UnknownAgent { name: String },
    /// The flow was started without any agent
    #[error("The planning flow has no agents configured")]
    NoAgents,
    /// An agent returned an unrecoverable error for a step
    #[error("Agent '{agent}' failed on step {step_index} of plan '{plan_id}': {message}")]
    AgentFailed {
        plan_id: String,
        step_index: usize,
        agent: String,
        message: String,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> PlanError {
        PlanError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl PlanError {
    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Shorthand for a missing required parameter of a command.
    pub fn missing_param(field: &str, command: &str) -> Self {
        Self::invalid_input(field)
            .with_reason(format!("Parameter `{field}` is required for command: {command}"))
    }

    pub fn not_found(plan_id: impl Into<String>) -> Self {
        Self::PlanNotFound {
            plan_id: plan_id.into(),
        }
    }

    /// True for malformed or missing parameters.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::NoActivePlan | Self::PlanExists { .. }
        )
    }

    /// True when an unknown plan id was referenced.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PlanNotFound { .. })
    }

    /// True for storage backend failures.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Self::Database { .. } | Self::FileSystem { .. } | Self::Serialization { .. }
        )
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|source| PlanError::Database {
            message: message.to_string(),
            source,
        })
    }
}

/// Extension trait attaching a path to `std::io` failures.
pub trait FileSystemResultExt<T> {
    fn fs_context(self, path: &std::path::Path) -> Result<T>;
}

impl<T> FileSystemResultExt<T> for std::result::Result<T, std::io::Error> {
    fn fs_context(self, path: &std::path::Path) -> Result<T> {
        self.map_err(|source| PlanError::FileSystem {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Result type alias for plan operations
pub type Result<T> = std::result::Result<T, PlanError>;
