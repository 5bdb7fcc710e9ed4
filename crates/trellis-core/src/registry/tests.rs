//! Tests for the registry module.

use super::*;
use crate::{
    error::{PlanError, Result},
    models::{PlanMap, StepStatus},
    store::MemoryStore,
};

fn steps(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn create_test_registry() -> PlanRegistry {
    PlanRegistry::from_store(Box::new(MemoryStore), ExternalSync::disabled())
}

/// Store that rejects every write.
struct BrokenStore;

impl PlanStore for BrokenStore {
    fn kind(&self) -> StoreKind {
        StoreKind::Json
    }

    fn load_all(&mut self) -> Result<PlanMap> {
        Err(PlanError::Configuration {
            message: "disk on fire".into(),
        })
    }

    fn save(&mut self, _plan: &Plan, _all: &PlanMap) -> Result<()> {
        Err(PlanError::FileSystem {
            path: "/nowhere/plans.json".into(),
            source: std::io::Error::other("read-only file system"),
        })
    }

    fn delete(&mut self, plan_id: &str, all: &PlanMap) -> Result<()> {
        let plan = Plan::new(plan_id, "x", vec!["x".into()])?;
        self.save(&plan, all)
    }
}

#[test]
fn test_create_then_get() {
    let mut registry = create_test_registry();

    let outcome = registry
        .create("p1", "t", steps(&["s1", "s2"]))
        .expect("Failed to create plan");
    assert!(outcome.is_durable());
    assert!(outcome.to_string().starts_with("Plan created successfully with ID: p1"));

    let plan = registry.get(Some("p1")).expect("Failed to get plan");
    assert_eq!(plan.title(), "t");
    assert_eq!(plan.steps(), &steps(&["s1", "s2"]));
    assert_eq!(
        plan.step_statuses(),
        &[StepStatus::NotStarted, StepStatus::NotStarted]
    );
    assert_eq!(plan.step_notes(), &[String::new(), String::new()]);

    // Creation makes the plan active.
    assert_eq!(registry.active_plan_id(), Some("p1"));
    assert_eq!(registry.get(None).unwrap().plan_id(), "p1");
}

#[test]
fn test_create_validation() {
    let mut registry = create_test_registry();

    assert!(registry.create("", "t", steps(&["s1"])).unwrap_err().is_validation());
    assert!(registry.create("p1", "", steps(&["s1"])).unwrap_err().is_validation());
    assert!(registry.create("p1", "t", vec![]).unwrap_err().is_validation());
    assert!(registry.is_empty());
    assert_eq!(registry.active_plan_id(), None);

    registry.create("p1", "t", steps(&["s1"])).unwrap();
    let err = registry.create("p1", "other", steps(&["s2"])).unwrap_err();
    assert!(matches!(err, PlanError::PlanExists { ref plan_id } if plan_id == "p1"));
    assert_eq!(registry.get(Some("p1")).unwrap().title(), "t");
}

#[test]
fn test_update_preserves_matching_prefix() {
    let mut registry = create_test_registry();
    registry.create("p1", "t", steps(&["a", "b", "c"])).unwrap();
    registry
        .mark_step(Some("p1"), 0, Some(StepStatus::Completed), Some("done"))
        .unwrap();
    registry
        .mark_step(Some("p1"), 2, Some(StepStatus::InProgress), None)
        .unwrap();

    let outcome = registry
        .update("p1", None, Some(steps(&["a", "x", "c", "d"])))
        .unwrap();
    assert_eq!(outcome.value.changes.len(), 1);

    let plan = registry.get(Some("p1")).unwrap();
    assert_eq!(
        plan.step_statuses(),
        &[
            StepStatus::Completed,
            StepStatus::NotStarted,
            StepStatus::InProgress,
            StepStatus::NotStarted
        ]
    );
    assert_eq!(plan.step_notes()[0], "done");
    assert_eq!(plan.step_notes()[3], "");
}

#[test]
fn test_update_reorder_resets_progress() {
    let mut registry = create_test_registry();
    registry.create("p1", "t", steps(&["a", "b"])).unwrap();
    registry
        .mark_step(Some("p1"), 0, Some(StepStatus::Completed), None)
        .unwrap();

    registry.update("p1", None, Some(steps(&["b", "a"]))).unwrap();
    let plan = registry.get(Some("p1")).unwrap();
    assert_eq!(
        plan.step_statuses(),
        &[StepStatus::NotStarted, StepStatus::NotStarted]
    );
}

#[test]
fn test_update_empty_values_are_ignored() {
    let mut registry = create_test_registry();
    registry.create("p1", "t", steps(&["a"])).unwrap();

    let outcome = registry.update("p1", Some(""), Some(vec![])).unwrap();
    assert!(outcome.value.changes.is_empty());
    let plan = registry.get(Some("p1")).unwrap();
    assert_eq!(plan.title(), "t");
    assert_eq!(plan.steps(), &steps(&["a"]));

    let outcome = registry.update("p1", Some("new"), None).unwrap();
    assert_eq!(outcome.value.changes, vec!["Updated title to 'new'".to_string()]);
    assert_eq!(registry.get(Some("p1")).unwrap().title(), "new");
}

#[test]
fn test_update_unknown_plan() {
    let mut registry = create_test_registry();
    assert!(registry.update("ghost", Some("t"), None).unwrap_err().is_not_found());
}

#[test]
fn test_list_is_stable_and_marks_active() {
    let mut registry = create_test_registry();
    assert!(registry
        .list()
        .to_string()
        .contains("No plans available."));

    registry.create("b", "Second", steps(&["x"])).unwrap();
    registry.create("a", "First", steps(&["x", "y"])).unwrap();
    registry
        .mark_step(Some("a"), 0, Some(StepStatus::Completed), None)
        .unwrap();

    let first = registry.list();
    let second = registry.list();
    assert_eq!(first, second);

    assert_eq!(first.len(), 2);
    assert_eq!(first[0].plan_id, "a");
    assert!(first[0].is_active);
    assert_eq!(first[0].completed_steps, 1);
    assert_eq!(first[0].total_steps, 2);
    assert_eq!(first[1].plan_id, "b");
    assert!(!first[1].is_active);
}

#[test]
fn test_get_without_active_plan() {
    let registry = create_test_registry();
    assert!(matches!(registry.get(None), Err(PlanError::NoActivePlan)));
    assert!(registry.get(Some("ghost")).unwrap_err().is_not_found());
}

#[test]
fn test_set_active_and_resume() {
    let mut registry = create_test_registry();
    registry.create("p1", "One", steps(&["s"])).unwrap();
    registry.create("p2", "Two", steps(&["s"])).unwrap();
    assert_eq!(registry.active_plan_id(), Some("p2"));

    let result = registry.set_active("p1").unwrap();
    assert!(result.to_string().starts_with("Plan 'p1' is now the active plan."));
    assert_eq!(registry.get(None).unwrap().title(), "One");

    registry.resume("p2").unwrap();
    assert_eq!(registry.active_plan_id(), Some("p2"));

    assert!(registry.set_active("ghost").unwrap_err().is_not_found());
    assert_eq!(registry.active_plan_id(), Some("p2"));
}

#[test]
fn test_mark_step_uses_active_plan() {
    let mut registry = create_test_registry();
    assert!(matches!(
        registry.mark_step(None, 0, Some(StepStatus::Completed), None),
        Err(PlanError::NoActivePlan)
    ));

    registry.create("p1", "t", steps(&["s1", "s2"])).unwrap();
    let outcome = registry
        .mark_step(None, 1, Some(StepStatus::Blocked), Some("waiting on review"))
        .unwrap();
    assert_eq!(outcome.value.step_index, 1);

    let plan = registry.get(Some("p1")).unwrap();
    assert_eq!(plan.step_statuses()[1], StepStatus::Blocked);
    assert_eq!(plan.step_notes()[1], "waiting on review");
}

#[test]
fn test_mark_step_notes_not_cleared_by_omission() {
    let mut registry = create_test_registry();
    registry.create("p1", "t", steps(&["s1"])).unwrap();
    registry.mark_step(None, 0, None, Some("first note")).unwrap();

    registry
        .mark_step(None, 0, Some(StepStatus::Completed), None)
        .unwrap();
    registry.mark_step(None, 0, None, Some("")).unwrap();

    let plan = registry.get(None).unwrap();
    assert_eq!(plan.step_notes()[0], "first note");
    assert_eq!(plan.step_statuses()[0], StepStatus::Completed);
}

#[test]
fn test_mark_step_any_transition_allowed() {
    let mut registry = create_test_registry();
    registry.create("p1", "t", steps(&["s1"])).unwrap();

    for status in [
        StepStatus::Completed,
        StepStatus::NotStarted,
        StepStatus::Blocked,
        StepStatus::InProgress,
    ] {
        registry.mark_step(None, 0, Some(status), None).unwrap();
        assert_eq!(registry.get(None).unwrap().step_statuses()[0], status);
    }
}

#[test]
fn test_mark_step_index_out_of_range() {
    let mut registry = create_test_registry();
    for len in 1..=4 {
        let id = format!("p{len}");
        let plan_steps: Vec<String> = (0..len).map(|i| format!("s{i}")).collect();
        registry.create(&id, "t", plan_steps).unwrap();

        for index in [len, len + 1, usize::MAX] {
            let err = registry
                .mark_step(Some(&id), index, Some(StepStatus::Completed), None)
                .unwrap_err();
            assert!(err.is_validation(), "index {index} of {len} steps");
        }
        assert!(!registry.get(Some(&id)).unwrap().is_complete());
    }
}

#[test]
fn test_delete_clears_active_plan() {
    let mut registry = create_test_registry();
    registry.create("p1", "t", steps(&["s1"])).unwrap();

    let outcome = registry.delete("p1").unwrap();
    assert_eq!(outcome.to_string(), "Plan 'p1' has been deleted.\n");

    assert!(registry.list().is_empty());
    assert!(matches!(registry.get(None), Err(PlanError::NoActivePlan)));
    assert!(registry.delete("p1").unwrap_err().is_not_found());
}

#[test]
fn test_delete_inactive_plan_keeps_pointer() {
    let mut registry = create_test_registry();
    registry.create("p1", "t", steps(&["s1"])).unwrap();
    registry.create("p2", "t", steps(&["s1"])).unwrap();

    registry.delete("p1").unwrap();
    assert_eq!(registry.active_plan_id(), Some("p2"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_store_failures_become_warnings() {
    let mut registry = PlanRegistry::from_store(Box::new(BrokenStore), ExternalSync::disabled());
    assert!(registry.is_empty());

    let outcome = registry.create("p1", "t", steps(&["s1"])).unwrap();
    let warning = outcome.warning.clone().expect("expected a warning");
    assert_eq!(warning.store, StoreKind::Json);
    assert_eq!(warning.plan_id, "p1");
    assert!(warning.message.contains("read-only file system"));
    assert!(outcome.to_string().contains("were applied but not saved to the json store"));

    // The in-memory change still happened.
    assert_eq!(registry.get(Some("p1")).unwrap().title(), "t");

    let marked = registry
        .mark_step(None, 0, Some(StepStatus::Completed), None)
        .unwrap();
    assert!(!marked.is_durable());
    assert!(registry.get(None).unwrap().is_complete());

    let deleted = registry.delete("p1").unwrap();
    assert!(!deleted.is_durable());
    assert!(registry.is_empty());
}

#[test]
fn test_execute_dispatches_commands() {
    let mut registry = create_test_registry();

    let output = registry
        .execute(PlanCommand::Create {
            plan_id: "p1".into(),
            title: "t".into(),
            steps: steps(&["s1"]),
        })
        .unwrap();
    assert!(matches!(output, CommandOutput::Created(_)));
    assert!(output.warning().is_none());

    let output = registry
        .execute(PlanCommand::MarkStep {
            plan_id: None,
            step_index: 0,
            step_status: Some(StepStatus::InProgress),
            step_notes: None,
        })
        .unwrap();
    assert!(output.to_string().starts_with("Step 0 updated in plan 'p1'."));

    let output = registry.execute(PlanCommand::Get { plan_id: None }).unwrap();
    assert!(output.to_string().contains("1 in progress"));

    let output = registry.execute(PlanCommand::List).unwrap();
    assert!(output.to_string().contains("• p1 (active): t - 0/1 steps completed"));

    let err = registry
        .execute(PlanCommand::Resume {
            plan_id: "ghost".into(),
        })
        .unwrap_err();
    assert!(err.is_not_found());

    let output = registry
        .execute(PlanCommand::Delete {
            plan_id: "p1".into(),
        })
        .unwrap();
    assert!(matches!(output, CommandOutput::Deleted(_)));
}

#[test]
fn test_command_serde_shape() {
    let command: PlanCommand =
        serde_json::from_str(r#"{"command": "update", "plan_id": "p1", "title": "n"}"#).unwrap();
    assert_eq!(
        command,
        PlanCommand::Update {
            plan_id: "p1".into(),
            title: Some("n".into()),
            steps: None,
        }
    );

    let list = serde_json::to_value(PlanCommand::List).unwrap();
    assert_eq!(list, serde_json::json!({"command": "list"}));
}
