//! # Replay and Inspect Subcommands
//!
//! - `replay`: seed a scenario tree, fire each step in order, and print a
//!   JSON report of every outcome plus the final tree.
//! - `inspect`: seed a scenario tree and print one namespace's own state,
//!   effective state and metadata without firing any step.
//!
//! Rejected steps are part of the report, not errors. Only an unreadable
//! scenario or a store failure aborts the run.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use nsl_core::{CorrelationId, NamespaceId};
use nsl_state::{
    InMemoryNamespaceStore, LifecycleEvent, LifecycleStateMachine, Namespace, NamespaceState,
    NamespaceStore, StateMetadata, TransitionOutcome,
};

use crate::config::CliConfig;
use crate::scenario::Scenario;

/// Arguments for `nsl replay`.
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Path to the scenario YAML file.
    pub scenario: PathBuf,

    /// Exit with status 1 if any step is rejected.
    #[arg(long)]
    pub fail_on_reject: bool,
}

/// Arguments for `nsl inspect`.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the scenario YAML file.
    pub scenario: PathBuf,

    /// Namespace id to inspect.
    pub id: i64,
}

// ─── Reports ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Rejected,
}

/// Outcome of one scenario step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub index: usize,
    pub namespace_id: NamespaceId,
    pub event: LifecycleEvent,
    pub status: StepStatus,
    pub from_state: NamespaceState,
    pub to_state: NamespaceState,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<CorrelationId>,
}

/// A namespace as it stands after seeding or replay.
#[derive(Debug, Clone, Serialize)]
pub struct NamespaceReport {
    pub id: NamespaceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<NamespaceId>,
    pub traversal_ids: Vec<NamespaceId>,
    pub state: NamespaceState,
    pub effective_state: NamespaceState,
    /// Events the transition table and ancestor guard allow right now.
    pub available_events: Vec<LifecycleEvent>,
    pub state_metadata: StateMetadata,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    pub applied: usize,
    pub rejected: usize,
    pub steps: Vec<StepReport>,
    pub namespaces: Vec<NamespaceReport>,
}

// ─── Operations ──────────────────────────────────────────────────────

/// Fire every step of `scenario` against a freshly seeded tree.
pub fn replay(scenario: &Scenario) -> Result<ReplayReport> {
    let machine = LifecycleStateMachine::new(scenario.build_store()?);
    let mut steps = Vec::with_capacity(scenario.steps.len());

    for (index, step) in scenario.steps.iter().enumerate() {
        let mut namespace = machine
            .store()
            .find(step.namespace)
            .with_context(|| format!("step {index}"))?;
        let from_state = namespace.state;
        let outcome = machine
            .fire(&mut namespace, step.event, step.context())
            .with_context(|| {
                format!("step {index}: {} on namespace {}", step.event, step.namespace)
            })?;

        let (status, reasons, error) = match outcome {
            TransitionOutcome::Applied(_) => (StepStatus::Applied, Vec::new(), None),
            TransitionOutcome::Rejected { reasons, error } => {
                (StepStatus::Rejected, reasons, Some(error))
            }
        };
        tracing::debug!(
            index,
            namespace_id = %step.namespace,
            event = %step.event,
            ?status,
            "replayed step"
        );

        steps.push(StepReport {
            index,
            namespace_id: step.namespace,
            event: step.event,
            status,
            from_state,
            to_state: namespace.state,
            reasons,
            error,
            correlation_id: namespace.state_metadata.correlation_id.clone(),
        });
    }

    let applied = steps
        .iter()
        .filter(|step| step.status == StepStatus::Applied)
        .count();
    let namespaces = machine
        .store()
        .list()
        .iter()
        .map(|namespace| describe(&machine, namespace))
        .collect::<Result<Vec<_>>>()?;

    Ok(ReplayReport {
        applied,
        rejected: steps.len() - applied,
        steps,
        namespaces,
    })
}

/// Describe namespace `id` in the seeded tree of `scenario`.
pub fn inspect(scenario: &Scenario, id: NamespaceId) -> Result<NamespaceReport> {
    let machine = LifecycleStateMachine::new(scenario.build_store()?);
    let namespace = machine.store().find(id)?;
    describe(&machine, &namespace)
}

fn describe(
    machine: &LifecycleStateMachine<InMemoryNamespaceStore>,
    namespace: &Namespace,
) -> Result<NamespaceReport> {
    let available_events = machine.permitted_events(namespace)?;
    Ok(NamespaceReport {
        id: namespace.id,
        parent_id: namespace.parent_id,
        traversal_ids: namespace.traversal_ids.clone(),
        state: namespace.state,
        effective_state: machine.effective_state(namespace)?,
        available_events,
        state_metadata: namespace.state_metadata.clone(),
    })
}

// ─── Command Handlers ────────────────────────────────────────────────

/// Execute `nsl replay`.
pub fn run_replay(args: &ReplayArgs, config: &CliConfig) -> Result<u8> {
    let scenario = Scenario::load(&args.scenario)?;
    let report = replay(&scenario)?;
    tracing::info!(
        applied = report.applied,
        rejected = report.rejected,
        "scenario replayed"
    );
    println!("{}", render(&report, config)?);

    if args.fail_on_reject && report.rejected > 0 {
        return Ok(1);
    }
    Ok(0)
}

/// Execute `nsl inspect`.
pub fn run_inspect(args: &InspectArgs, config: &CliConfig) -> Result<u8> {
    let scenario = Scenario::load(&args.scenario)?;
    let report = inspect(&scenario, NamespaceId(args.id))?;
    println!("{}", render(&report, config)?);
    Ok(0)
}

fn render(value: &impl Serialize, config: &CliConfig) -> Result<String> {
    let rendered = if config.pretty_output {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(rendered)
}
