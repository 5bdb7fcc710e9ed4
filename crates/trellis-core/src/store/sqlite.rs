//! Embedded relational backend.

use std::path::{Path, PathBuf};

use log::{debug, warn};
use rusqlite::{params, Connection};

use super::{PlanStore, StoreKind};
use crate::{
    error::{DatabaseResultExt, PlanError, Result},
    models::{Plan, PlanMap, StepStatus},
};

const UPSERT_PLAN_SQL: &str = "INSERT INTO plans (plan_id, title, steps, step_statuses, step_notes) VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT(plan_id) DO UPDATE SET title = excluded.title, steps = excluded.steps, \
     step_statuses = excluded.step_statuses, step_notes = excluded.step_notes";
const SELECT_PLANS_SQL: &str =
    "SELECT plan_id, title, steps, step_statuses, step_notes FROM plans ORDER BY plan_id";
const DELETE_PLAN_SQL: &str = "DELETE FROM plans WHERE plan_id = ?1";

/// One row per plan; each mutation is its own committed statement.
pub struct SqliteStore {
    connection: Connection,
    path: PathBuf,
}

/// Raw row before the sequence columns are decoded.
///
/// Columns are nullable here since databases written by other tools may not
/// carry the `NOT NULL` constraints.
struct PlanRow {
    plan_id: Option<String>,
    title: Option<String>,
    steps: Option<String>,
    step_statuses: Option<String>,
    step_notes: Option<String>,
}

impl SqliteStore {
    /// Opens (or creates) the database file and initializes the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let connection =
            Connection::open(&path).db_context("Failed to open database connection")?;

        let store = Self { connection, path };
        store.initialize_schema()?;
        Ok(store)
    }

    /// In-memory database, mainly for tests.
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().db_context("Failed to open in-memory database")?;
        let store = Self {
            connection,
            path: PathBuf::from(":memory:"),
        };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<()> {
        let schema_sql = include_str!("../../assets/schema.sql");
        self.connection
            .execute_batch(schema_sql)
            .db_context("Failed to initialize database schema")
    }

    fn decode_row(row: PlanRow) -> Result<Plan> {
        let steps: Vec<String> = serde_json::from_str(&required(row.steps, "steps")?)?;
        let step_statuses: Vec<StepStatus> =
            serde_json::from_str(&required(row.step_statuses, "step_statuses")?)?;
        let step_notes: Vec<String> =
            serde_json::from_str(&required(row.step_notes, "step_notes")?)?;
        Plan::from_parts(
            required(row.plan_id, "plan_id")?,
            required(row.title, "title")?,
            steps,
            step_statuses,
            step_notes,
        )
    }
}

fn required(value: Option<String>, column: &str) -> Result<String> {
    value.ok_or_else(|| PlanError::invalid_input(column).with_reason("column is NULL"))
}

impl PlanStore for SqliteStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Sqlite
    }

    fn load_all(&mut self) -> Result<PlanMap> {
        let mut stmt = self
            .connection
            .prepare(SELECT_PLANS_SQL)
            .db_context("Failed to prepare query")?;

        let rows = stmt
            .query_map([], |row| {
                Ok(PlanRow {
                    plan_id: row.get(0)?,
                    title: row.get(1)?,
                    steps: row.get(2)?,
                    step_statuses: row.get(3)?,
                    step_notes: row.get(4)?,
                })
            })
            .db_context("Failed to query plans")?;

        let mut plans = PlanMap::new();
        for (position, row) in rows.enumerate() {
            let row = match row {
                Ok(row) => row,
                Err(e) => {
                    warn!("Skipping unreadable plan row #{position}: {e}");
                    continue;
                }
            };
            let label = row
                .plan_id
                .clone()
                .unwrap_or_else(|| format!("#{position}"));
            match Self::decode_row(row) {
                Ok(plan) => {
                    plans.insert(plan.plan_id().to_string(), plan);
                }
                Err(e) => warn!("Skipping unreadable plan row '{label}': {e}"),
            }
        }

        debug!("Loaded {} plans from {}", plans.len(), self.path.display());
        Ok(plans)
    }

    fn save(&mut self, plan: &Plan, _all: &PlanMap) -> Result<()> {
        let steps = serde_json::to_string(plan.steps())?;
        let statuses = serde_json::to_string(plan.step_statuses())?;
        let notes = serde_json::to_string(plan.step_notes())?;

        self.connection
            .execute(
                UPSERT_PLAN_SQL,
                params![plan.plan_id(), plan.title(), steps, statuses, notes],
            )
            .db_context("Failed to upsert plan")?;
        Ok(())
    }

    fn delete(&mut self, plan_id: &str, _all: &PlanMap) -> Result<()> {
        self.connection
            .execute(DELETE_PLAN_SQL, params![plan_id])
            .db_context("Failed to delete plan")?;
        Ok(())
    }
}
