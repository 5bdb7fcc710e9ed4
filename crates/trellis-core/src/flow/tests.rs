//! Tests for the planning flow.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex as StdMutex,
};

use anyhow::anyhow;
use async_trait::async_trait;

use super::*;
use crate::{store::MemoryStore, sync::ExternalSync};

/// Agent that echoes the step and records what it was given.
struct RecordingAgent {
    name: String,
    registry: Option<Arc<Mutex<PlanRegistry>>>,
    seen: StdMutex<Vec<(StepContext, Option<StepStatus>)>>,
}

impl RecordingAgent {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            registry: None,
            seen: StdMutex::new(Vec::new()),
        }
    }

    fn observing(name: &str, registry: &Arc<Mutex<PlanRegistry>>) -> Self {
        Self {
            registry: Some(Arc::clone(registry)),
            ..Self::new(name)
        }
    }

    fn seen(&self) -> Vec<(StepContext, Option<StepStatus>)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Agent for RecordingAgent {
    fn name(&self) -> &str {
        &self.name
    }

    async fn step(&self, context: &StepContext) -> anyhow::Result<String> {
        let status = match &self.registry {
            Some(registry) => registry
                .lock()
                .await
                .plan(&context.plan_id)
                .and_then(|plan| plan.step(context.step_index))
                .map(|step| step.status),
            None => None,
        };
        self.seen.lock().unwrap().push((context.clone(), status));
        Ok(format!("{} did: {}", self.name, context.step_text))
    }
}

struct FailingAgent;

#[async_trait]
impl Agent for FailingAgent {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn step(&self, _context: &StepContext) -> anyhow::Result<String> {
        Err(anyhow!("model unavailable"))
    }
}

/// Agent that marks its own step blocked before returning.
struct SelfBlockingAgent {
    registry: Arc<Mutex<PlanRegistry>>,
}

#[async_trait]
impl Agent for SelfBlockingAgent {
    fn name(&self) -> &str {
        "blocker"
    }

    async fn step(&self, context: &StepContext) -> anyhow::Result<String> {
        self.registry.lock().await.mark_step(
            Some(&context.plan_id),
            context.step_index,
            Some(StepStatus::Blocked),
            Some("needs a human"),
        )?;
        Ok("partial".to_string())
    }
}

/// Agent that inserts a step ahead of its own on its first call.
struct ReshufflingAgent {
    registry: Arc<Mutex<PlanRegistry>>,
    reshuffled: AtomicBool,
}

#[async_trait]
impl Agent for ReshufflingAgent {
    fn name(&self) -> &str {
        "reshuffler"
    }

    async fn step(&self, context: &StepContext) -> anyhow::Result<String> {
        if !self.reshuffled.swap(true, Ordering::SeqCst) {
            self.registry.lock().await.update(
                &context.plan_id,
                None,
                Some(vec!["x".into(), "s1".into(), "s2".into()]),
            )?;
        }
        Ok(format!("ran {}", context.step_text))
    }
}

/// Agent that completes its own step before returning.
struct SelfCompletingAgent {
    registry: Arc<Mutex<PlanRegistry>>,
}

#[async_trait]
impl Agent for SelfCompletingAgent {
    fn name(&self) -> &str {
        "closer"
    }

    async fn step(&self, context: &StepContext) -> anyhow::Result<String> {
        self.registry.lock().await.mark_step(
            Some(&context.plan_id),
            context.step_index,
            Some(StepStatus::Completed),
            None,
        )?;
        Ok("already done".to_string())
    }
}

fn shared_registry() -> Arc<Mutex<PlanRegistry>> {
    Arc::new(Mutex::new(PlanRegistry::from_store(
        Box::new(MemoryStore),
        ExternalSync::disabled(),
    )))
}

async fn create_plan(registry: &Arc<Mutex<PlanRegistry>>, plan_id: &str, steps: &[&str]) {
    registry
        .lock()
        .await
        .create(plan_id, "t", steps.iter().map(|s| s.to_string()).collect())
        .expect("Failed to create plan");
}

async fn statuses(registry: &Arc<Mutex<PlanRegistry>>, plan_id: &str) -> Vec<StepStatus> {
    registry.lock().await.plan(plan_id).unwrap().step_statuses().to_vec()
}

#[tokio::test]
async fn test_flow_runs_every_step() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["s1", "s2"]).await;

    let agent = Arc::new(RecordingAgent::observing("worker", &registry));
    let flow = PlanningFlow::new(
        Arc::clone(&registry),
        AgentPool::new().with_agent(agent.clone()),
    );

    let report = flow.execute().await.expect("flow failed");
    assert!(report.is_complete());
    assert_eq!(report.plan_id, "p1");
    assert_eq!(report.executed.len(), 2);
    assert_eq!(report.executed[1].output, "worker did: s2");
    assert!(report.warnings.is_empty());
    assert!(report.finished_at >= report.started_at);

    // Each step was in progress while its agent ran.
    let seen = agent.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[0].1, Some(StepStatus::InProgress));
    assert_eq!(seen[1].1, Some(StepStatus::InProgress));

    // Earlier outputs are passed along as context.
    assert!(seen[0].0.previous_outputs.is_empty());
    assert_eq!(seen[1].0.previous_outputs, report.executed[..1].to_vec());
    assert!(seen[1].0.plan_view.contains("0. [✓] s1"));

    assert_eq!(
        statuses(&registry, "p1").await,
        vec![StepStatus::Completed, StepStatus::Completed]
    );

    // Nothing left to do on a second run.
    let again = flow.execute().await.unwrap();
    assert!(again.is_complete());
    assert!(again.executed.is_empty());
}

#[tokio::test]
async fn test_flow_skips_completed_and_resumes_in_progress() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["s1", "s2", "s3"]).await;
    {
        let mut guard = registry.lock().await;
        guard
            .mark_step(None, 0, Some(StepStatus::Completed), None)
            .unwrap();
        guard
            .mark_step(None, 1, Some(StepStatus::InProgress), None)
            .unwrap();
    }

    let agent = Arc::new(RecordingAgent::new("worker"));
    let report = PlanningFlow::new(registry, AgentPool::new().with_agent(agent.clone()))
        .execute()
        .await
        .unwrap();

    let indices: Vec<usize> = report.executed.iter().map(|s| s.step_index).collect();
    assert_eq!(indices, vec![1, 2]);
}

#[tokio::test]
async fn test_flow_halts_at_blocked_step() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["s1", "s2", "s3"]).await;
    registry
        .lock()
        .await
        .mark_step(None, 1, Some(StepStatus::Blocked), None)
        .unwrap();

    let flow = PlanningFlow::new(
        Arc::clone(&registry),
        AgentPool::new().with_agent(Arc::new(RecordingAgent::new("worker"))),
    );
    let report = flow.execute().await.unwrap();

    assert_eq!(report.outcome, FlowOutcome::Blocked { step_index: 1 });
    assert_eq!(report.executed.len(), 1);
    assert!(report.to_string().contains("step 1 is blocked"));
    assert_eq!(
        statuses(&registry, "p1").await,
        vec![
            StepStatus::Completed,
            StepStatus::Blocked,
            StepStatus::NotStarted
        ]
    );

    // Unblocking lets the next run finish.
    registry
        .lock()
        .await
        .mark_step(None, 1, Some(StepStatus::NotStarted), None)
        .unwrap();
    assert!(flow.execute().await.unwrap().is_complete());
}

#[tokio::test]
async fn test_flow_step_blocked_while_running() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["[blocker] s1", "s2"]).await;

    let agents = AgentPool::new()
        .with_agent(Arc::new(RecordingAgent::new("worker")))
        .with_agent(Arc::new(SelfBlockingAgent {
            registry: Arc::clone(&registry),
        }));
    let report = PlanningFlow::new(Arc::clone(&registry), agents)
        .execute()
        .await
        .unwrap();

    assert_eq!(report.outcome, FlowOutcome::Blocked { step_index: 0 });
    assert!(report.executed.is_empty());
    let guard = registry.lock().await;
    let plan = guard.plan("p1").unwrap();
    assert_eq!(plan.step_statuses()[0], StepStatus::Blocked);
    assert_eq!(plan.step_notes()[0], "needs a human");
}

#[tokio::test]
async fn test_flow_discards_output_of_rewritten_step() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["s1", "s2"]).await;

    let agent = Arc::new(ReshufflingAgent {
        registry: Arc::clone(&registry),
        reshuffled: AtomicBool::new(false),
    });
    let report = PlanningFlow::new(Arc::clone(&registry), AgentPool::new().with_agent(agent))
        .execute()
        .await
        .unwrap();

    // The first "s1" output belonged to index 0, which now holds "x".
    assert!(report.is_complete());
    let executed: Vec<(usize, &str)> = report
        .executed
        .iter()
        .map(|s| (s.step_index, s.output.as_str()))
        .collect();
    assert_eq!(executed, vec![(0, "ran x"), (1, "ran s1"), (2, "ran s2")]);
    assert_eq!(
        statuses(&registry, "p1").await,
        vec![StepStatus::Completed; 3]
    );
}

#[tokio::test]
async fn test_flow_discards_output_of_step_marked_elsewhere() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["[closer] s1", "s2"]).await;

    let agents = AgentPool::new()
        .with_agent(Arc::new(RecordingAgent::new("worker")))
        .with_agent(Arc::new(SelfCompletingAgent {
            registry: Arc::clone(&registry),
        }));
    let report = PlanningFlow::new(Arc::clone(&registry), agents)
        .execute()
        .await
        .unwrap();

    assert!(report.is_complete());
    let indices: Vec<usize> = report.executed.iter().map(|s| s.step_index).collect();
    assert_eq!(indices, vec![1]);
    assert_eq!(
        statuses(&registry, "p1").await,
        vec![StepStatus::Completed, StepStatus::Completed]
    );
}

#[tokio::test]
async fn test_flow_agent_failure_leaves_step_in_progress() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["s1", "s2"]).await;

    let flow = PlanningFlow::new(
        Arc::clone(&registry),
        AgentPool::new().with_agent(Arc::new(FailingAgent)),
    );
    let err = flow.execute().await.unwrap_err();

    match err {
        PlanError::AgentFailed {
            plan_id,
            step_index,
            agent,
            message,
        } => {
            assert_eq!(plan_id, "p1");
            assert_eq!(step_index, 0);
            assert_eq!(agent, "flaky");
            assert!(message.contains("model unavailable"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        statuses(&registry, "p1").await,
        vec![StepStatus::InProgress, StepStatus::NotStarted]
    );
}

#[tokio::test]
async fn test_flow_routes_tagged_steps() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["plain", "[SEARCH] look it up"]).await;

    let writer = Arc::new(RecordingAgent::new("writer"));
    let search = Arc::new(RecordingAgent::new("search"));
    let agents = AgentPool::new()
        .with_agent(writer.clone())
        .with_agent(search.clone());

    let report = PlanningFlow::new(registry, agents)
        .execute()
        .await
        .unwrap();

    assert_eq!(report.executed[0].agent, "writer");
    assert_eq!(report.executed[1].agent, "search");
    assert_eq!(search.seen()[0].0.step_text, "look it up");
    assert_eq!(writer.seen().len(), 1);
}

#[tokio::test]
async fn test_flow_unknown_agent_does_not_touch_step() {
    let registry = shared_registry();
    create_plan(&registry, "p1", &["[ghost] haunt"]).await;

    let err = PlanningFlow::new(
        Arc::clone(&registry),
        AgentPool::new().with_agent(Arc::new(RecordingAgent::new("worker"))),
    )
    .execute()
    .await
    .unwrap_err();

    assert!(matches!(err, PlanError::UnknownAgent { ref name } if name == "ghost"));
    assert_eq!(statuses(&registry, "p1").await, vec![StepStatus::NotStarted]);
}

#[tokio::test]
async fn test_flow_needs_agents_and_a_plan() {
    let registry = shared_registry();
    let flow = PlanningFlow::new(Arc::clone(&registry), AgentPool::new());
    assert!(matches!(flow.execute().await, Err(PlanError::NoActivePlan)));

    create_plan(&registry, "p1", &["s1"]).await;
    assert!(matches!(flow.execute().await, Err(PlanError::NoAgents)));

    let missing = PlanningFlow::new(registry, AgentPool::new()).with_plan_id("ghost");
    assert!(missing.execute().await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_seed_creates_once() {
    let registry = shared_registry();
    let mut flow = PlanningFlow::new(
        Arc::clone(&registry),
        AgentPool::new().with_agent(Arc::new(RecordingAgent::new("worker"))),
    );
    let seed = PlanSeed {
        title: "Seeded".into(),
        steps: vec!["a".into(), "b".into()],
    };

    assert!(flow.seed("p1", seed.clone()).await.unwrap().is_some());
    flow.execute().await.unwrap();
    assert!(flow.seed("p1", seed).await.unwrap().is_none());
    assert_eq!(
        statuses(&registry, "p1").await,
        vec![StepStatus::Completed, StepStatus::Completed]
    );
}

#[test]
fn test_agent_pool_lookup() {
    let pool = AgentPool::new()
        .with_agent(Arc::new(RecordingAgent::new("Writer")))
        .with_agent(Arc::new(RecordingAgent::new("search")));

    assert_eq!(pool.len(), 2);
    assert_eq!(pool.primary().map(|a| a.name()), Some("Writer"));
    assert!(pool.get("writer").is_some());
    assert!(pool.get("SEARCH").is_some());

    let pool = pool.with_primary("search").unwrap();
    assert_eq!(pool.primary().map(|a| a.name()), Some("search"));
    assert!(matches!(
        pool.with_primary("ghost"),
        Err(PlanError::UnknownAgent { .. })
    ));
}

#[test]
fn test_split_agent_tag() {
    assert_eq!(split_agent_tag("  [code_review] check it"), (Some("code_review"), "check it"));
    assert_eq!(split_agent_tag("[] empty"), (None, "[] empty"));
    assert_eq!(split_agent_tag("[unclosed"), (None, "[unclosed"));
    assert_eq!(split_agent_tag("text [tag] later"), (None, "text [tag] later"));
}
