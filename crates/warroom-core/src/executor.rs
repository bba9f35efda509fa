//! Sequential pause execution with per-target isolation.
//!
//! Every step of the plan is attempted once, in order. A failed step becomes a
//! failed [`PauseOutcome`] and the next step runs regardless, with one policy
//! exception: under [`GateFailurePolicy::Abort`] a failed central-gate pause
//! halts the run before anything else is sent.

use crate::call::bounded;
use crate::config::{ExecutionConfig, GateFailurePolicy};
use crate::error::CallError;
use crate::ledger::{PauseGate, RegistryClient, ResourceReader};
use crate::outcome::{PauseOutcome, PendingPause};
use crate::plan::{ExecutionPhase, ExecutionPlan, PlannedPause, TargetSpec};
use crate::report::Reporter;
use crate::types::{Address, Caller, ResourceKind};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct ExecutionSettings {
    pub call_timeout: Duration,
    pub gate_failure: GateFailurePolicy,
}

impl From<&ExecutionConfig> for ExecutionSettings {
    fn from(config: &ExecutionConfig) -> Self {
        Self {
            call_timeout: config.call_timeout(),
            gate_failure: config.gate_failure,
        }
    }
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self::from(&ExecutionConfig::default())
    }
}

/// Outcomes of an execution pass.
#[derive(Debug, Clone)]
pub struct Execution {
    pub outcomes: Vec<PauseOutcome>,
    /// Set when the gate-failure policy stopped the run early.
    pub halted: Option<String>,
}

pub struct PauseExecutor {
    registry: Arc<dyn RegistryClient>,
    reader: Arc<dyn ResourceReader>,
    gate: Arc<dyn PauseGate>,
    caller: Caller,
    settings: ExecutionSettings,
}

impl PauseExecutor {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        reader: Arc<dyn ResourceReader>,
        gate: Arc<dyn PauseGate>,
        caller: Caller,
        settings: ExecutionSettings,
    ) -> Self {
        Self {
            registry,
            reader,
            gate,
            caller,
            settings,
        }
    }

    #[instrument(skip(self, plan, reporter), fields(gate = %self.gate.address(), steps = plan.len()))]
    pub async fn execute(&self, plan: &ExecutionPlan, reporter: &mut dyn Reporter) -> Execution {
        let mut outcomes = Vec::with_capacity(plan.len());
        let mut current_phase = None;

        for step in plan.steps() {
            if current_phase != Some(step.phase) {
                current_phase = Some(step.phase);
                reporter.phase_started(step.phase, plan.count(step.phase));
            }

            let outcome = self.attempt(step).await;
            reporter.outcome(&outcome);

            let gate_failed = step.phase == ExecutionPhase::CentralGate && !outcome.succeeded;
            outcomes.push(outcome);

            if gate_failed && self.settings.gate_failure == GateFailurePolicy::Abort {
                let reason = format!(
                    "pausing {} failed and the gate-failure policy is abort",
                    step.label
                );
                error!(reason = %reason, "Halting execution");
                return Execution {
                    outcomes,
                    halted: Some(reason),
                };
            }
        }

        Execution {
            outcomes,
            halted: None,
        }
    }

    async fn attempt(&self, step: &PlannedPause) -> PauseOutcome {
        let pending = step.pending();
        match &step.spec {
            TargetSpec::Known(target) => self.pause(pending, *target).await,
            TargetSpec::Named(name) => match self.resolve(name).await {
                Ok(target) => self.pause(pending.at(target), target).await,
                Err(err) => self.fail(pending, format!("{} could not be resolved", name), err),
            },
            TargetSpec::CoreOf(name) => match self.lookup_core(name).await {
                Ok(target) => self.pause(pending.at(target), target).await,
                Err(err) => {
                    self.fail(pending, format!("core of {} could not be looked up", name), err)
                }
            },
        }
    }

    async fn lookup_core(&self, module_name: &str) -> Result<Address, CallError> {
        let module = self.resolve(module_name).await?;
        bounded(self.settings.call_timeout, self.reader.core(module)).await
    }

    async fn resolve(&self, name: &str) -> Result<Address, CallError> {
        bounded(self.settings.call_timeout, self.registry.resolve(name)).await
    }

    async fn pause(&self, pending: PendingPause, target: Address) -> PauseOutcome {
        match bounded(
            self.settings.call_timeout,
            self.gate.pause(target, &self.caller),
        )
        .await
        {
            Ok(receipt) => {
                info!(
                    target = %target,
                    label = %pending.label(),
                    tx = %receipt.tx_hash,
                    fee_gwei = receipt.fee_gwei,
                    "Paused"
                );
                pending.succeeded(receipt)
            }
            Err(err) => {
                let pending = if pending.kind() == ResourceKind::Vault {
                    let name = self.describe_vault(target).await;
                    pending.relabel(name)
                } else {
                    pending
                };
                let what = pending.label().to_string();
                self.fail(pending, format!("{} was not paused", what), err)
            }
        }
    }

    /// Vault failures are reported by symbol when it can be read.
    async fn describe_vault(&self, vault: Address) -> String {
        match bounded(self.settings.call_timeout, self.reader.symbol(vault)).await {
            Ok(symbol) => format!("vault {}", symbol),
            Err(_) => format!("vault {}", vault),
        }
    }

    fn fail(&self, pending: PendingPause, context: String, err: CallError) -> PauseOutcome {
        warn!(label = %pending.label(), error = %err, "{}", context);
        pending.failed(format!("{}: {}", context, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RegistryConfig;
    use crate::discovery::{DiscoverySettings, ResourceDiscoverer};
    use crate::fee::FeeSchedule;
    use crate::ledger::PauseGateFactory;
    use crate::outcome::TargetState;
    use crate::report::{NullReporter, RecordingReporter, ReportEvent};
    use crate::testing::{
        addr, caller, named, FakeLedger, BADGER_TREE, GAC, GUARDIAN, IBBTC, IBBTC_CORE,
    };

    async fn plan_for(ledger: &FakeLedger) -> ExecutionPlan {
        let discovery = ResourceDiscoverer::new(
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            DiscoverySettings {
                passthrough_vault: None,
                ..DiscoverySettings::default()
            },
        )
        .discover(&mut NullReporter)
        .await
        .unwrap();
        ExecutionPlan::build(named(GAC), &discovery, &RegistryConfig::default())
    }

    fn executor(ledger: &FakeLedger, settings: ExecutionSettings) -> PauseExecutor {
        PauseExecutor::new(
            Arc::new(ledger.clone()),
            Arc::new(ledger.clone()),
            ledger.connect(named(GUARDIAN), FeeSchedule::default()),
            caller(),
            settings,
        )
    }

    #[tokio::test]
    async fn scenario_issues_eight_pauses_in_order() {
        let ledger = FakeLedger::scenario();
        let plan = plan_for(&ledger).await;
        let execution = executor(&ledger, ExecutionSettings::default())
            .execute(&plan, &mut NullReporter)
            .await;

        assert_eq!(execution.outcomes.len(), 8);
        assert!(execution.outcomes.iter().all(|o| o.succeeded));
        assert!(execution.halted.is_none());
        assert_eq!(
            ledger.pauses(),
            vec![
                named(GAC),
                addr(2),
                addr(3),
                addr(101),
                addr(102),
                addr(103),
                named(BADGER_TREE),
                named(IBBTC_CORE),
            ]
        );
    }

    #[tokio::test]
    async fn failures_are_isolated_and_reported_by_symbol() {
        let ledger = FakeLedger::scenario()
            .failing_pause(addr(2))
            .failing_pause(addr(101));
        let plan = plan_for(&ledger).await;
        let execution = executor(&ledger, ExecutionSettings::default())
            .execute(&plan, &mut NullReporter)
            .await;

        assert_eq!(execution.outcomes.len(), 8);
        assert_eq!(ledger.pauses().len(), 8);
        let failed: Vec<&PauseOutcome> =
            execution.outcomes.iter().filter(|o| !o.succeeded).collect();
        assert_eq!(failed.len(), 2);
        assert_eq!(failed[0].label, "vault b2");
        assert!(failed[0]
            .reason
            .as_deref()
            .unwrap()
            .contains("vault b2 was not paused"));
        assert!(failed[1].label.starts_with("strategy "));
    }

    #[tokio::test]
    async fn missing_module_fails_only_its_nested_step() {
        let ledger = FakeLedger::scenario().failing_read("core", named(IBBTC));
        let plan = plan_for(&ledger).await;
        let execution = executor(&ledger, ExecutionSettings::default())
            .execute(&plan, &mut NullReporter)
            .await;

        let last = execution.outcomes.last().unwrap();
        assert_eq!(last.phase, ExecutionPhase::NestedCore);
        assert_eq!(last.state(), TargetState::Failed);
        assert!(last.reason.as_deref().unwrap().contains("could not be looked up"));
        assert_eq!(ledger.pauses().len(), 7);
    }

    #[tokio::test]
    async fn unresolvable_singleton_is_a_failed_outcome() {
        let ledger = FakeLedger::scenario();
        let plan = {
            let mut names = RegistryConfig::default();
            names.badger_tree = "missingTree".to_string();
            ExecutionPlan::build(named(GAC), &Default::default(), &names)
        };
        let execution = executor(&ledger, ExecutionSettings::default())
            .execute(&plan, &mut NullReporter)
            .await;

        assert_eq!(execution.outcomes.len(), 3);
        assert!(!execution.outcomes[1].succeeded);
        assert!(execution.outcomes[2].succeeded);
    }

    #[tokio::test]
    async fn gate_failure_continues_by_default() {
        let ledger = FakeLedger::scenario().failing_pause(named(GAC));
        let plan = plan_for(&ledger).await;
        let mut reporter = RecordingReporter::default();
        let execution = executor(&ledger, ExecutionSettings::default())
            .execute(&plan, &mut reporter)
            .await;

        assert!(!execution.outcomes[0].succeeded);
        assert_eq!(execution.outcomes.len(), 8);
        assert!(execution.halted.is_none());
        assert_eq!(
            reporter.events[0],
            ReportEvent::Phase(ExecutionPhase::CentralGate, 1)
        );
    }

    #[tokio::test]
    async fn gate_failure_can_halt_the_run() {
        let ledger = FakeLedger::scenario().failing_pause(named(GAC));
        let plan = plan_for(&ledger).await;
        let settings = ExecutionSettings {
            gate_failure: GateFailurePolicy::Abort,
            ..ExecutionSettings::default()
        };
        let execution = executor(&ledger, settings)
            .execute(&plan, &mut NullReporter)
            .await;

        assert_eq!(execution.outcomes.len(), 1);
        assert!(execution.halted.is_some());
        assert_eq!(ledger.pauses(), vec![named(GAC)]);
    }
}
