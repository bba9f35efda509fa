//! Ordered pause plan derived from a completed discovery.

use crate::config::RegistryConfig;
use crate::discovery::DiscoveryResult;
use crate::outcome::PendingPause;
use crate::types::{Address, ResourceKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution phases in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionPhase {
    CentralGate,
    NonGatedVaults,
    Strategies,
    Singleton,
    NestedCore,
}

impl ExecutionPhase {
    pub fn title(self) -> &'static str {
        match self {
            Self::CentralGate => "global access control",
            Self::NonGatedVaults => "non-gated vaults",
            Self::Strategies => "strategies",
            Self::Singleton => "singleton modules",
            Self::NestedCore => "nested cores",
        }
    }
}

impl fmt::Display for ExecutionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// How the pause target is located at execution time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum TargetSpec {
    /// Address known from preflight or discovery.
    Known(Address),
    /// Resolved from the registry right before the pause.
    Named(String),
    /// `core()` of the module registered under this name.
    CoreOf(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedPause {
    pub phase: ExecutionPhase,
    pub kind: ResourceKind,
    pub label: String,
    pub spec: TargetSpec,
}

impl PlannedPause {
    pub fn pending(&self) -> PendingPause {
        let pending = PendingPause::new(self.phase, self.kind, self.label.clone());
        match &self.spec {
            TargetSpec::Known(address) => pending.at(*address),
            TargetSpec::Named(_) | TargetSpec::CoreOf(_) => pending,
        }
    }
}

/// Every pause of a run in issue order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionPlan {
    steps: Vec<PlannedPause>,
}

impl ExecutionPlan {
    /// Central gate first, then non-gated vaults and strategies in discovery
    /// order, then the named singleton, then the nested core.
    pub fn build(
        global_access_control: Address,
        discovery: &DiscoveryResult,
        names: &RegistryConfig,
    ) -> Self {
        let mut steps =
            Vec::with_capacity(discovery.non_gated_vaults.len() + discovery.strategies.len() + 3);

        steps.push(PlannedPause {
            phase: ExecutionPhase::CentralGate,
            kind: ResourceKind::PeripheralModule,
            label: names.global_access_control.clone(),
            spec: TargetSpec::Known(global_access_control),
        });

        steps.extend(discovery.non_gated_vaults.iter().map(|vault| PlannedPause {
            phase: ExecutionPhase::NonGatedVaults,
            kind: ResourceKind::Vault,
            label: format!("vault {}", vault.address()),
            spec: TargetSpec::Known(vault.address()),
        }));

        steps.extend(discovery.strategies.iter().map(|strategy| PlannedPause {
            phase: ExecutionPhase::Strategies,
            kind: ResourceKind::Strategy,
            label: format!("strategy {}", strategy),
            spec: TargetSpec::Known(*strategy),
        }));

        steps.push(PlannedPause {
            phase: ExecutionPhase::Singleton,
            kind: ResourceKind::PeripheralModule,
            label: names.badger_tree.clone(),
            spec: TargetSpec::Named(names.badger_tree.clone()),
        });

        steps.push(PlannedPause {
            phase: ExecutionPhase::NestedCore,
            kind: ResourceKind::PeripheralModule,
            label: format!("{} core", names.ibbtc),
            spec: TargetSpec::CoreOf(names.ibbtc.clone()),
        });

        Self { steps }
    }

    pub fn steps(&self) -> &[PlannedPause] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Number of steps in one phase.
    pub fn count(&self, phase: ExecutionPhase) -> usize {
        self.steps.iter().filter(|step| step.phase == phase).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::addr;
    use crate::types::{ResourceRef, SchemaVersion};

    fn discovery() -> DiscoveryResult {
        let a = ResourceRef::vault(addr(1), SchemaVersion::V1, false);
        let b = ResourceRef::vault(addr(2), SchemaVersion::V1, true);
        let c = ResourceRef::vault(addr(3), SchemaVersion::V1_5, true);
        DiscoveryResult {
            vaults_v1: vec![a, b.clone()],
            vaults_v1_5: vec![c.clone()],
            strategies: vec![addr(101), addr(102), addr(103)],
            non_gated_vaults: vec![b, c],
            issues: Vec::new(),
        }
    }

    #[test]
    fn plan_follows_fixed_priority_order() {
        let plan = ExecutionPlan::build(addr(50), &discovery(), &RegistryConfig::default());
        let phases: Vec<ExecutionPhase> = plan.steps().iter().map(|s| s.phase).collect();

        assert_eq!(plan.len(), 8);
        assert_eq!(
            phases,
            vec![
                ExecutionPhase::CentralGate,
                ExecutionPhase::NonGatedVaults,
                ExecutionPhase::NonGatedVaults,
                ExecutionPhase::Strategies,
                ExecutionPhase::Strategies,
                ExecutionPhase::Strategies,
                ExecutionPhase::Singleton,
                ExecutionPhase::NestedCore,
            ]
        );
        assert_eq!(plan.steps()[0].spec, TargetSpec::Known(addr(50)));
        assert_eq!(plan.steps()[1].spec, TargetSpec::Known(addr(2)));
        assert_eq!(plan.steps()[2].spec, TargetSpec::Known(addr(3)));
        assert_eq!(
            plan.steps()[7].spec,
            TargetSpec::CoreOf("ibBTC".to_string())
        );
    }

    #[test]
    fn empty_discovery_still_pauses_gate_and_singletons() {
        let plan = ExecutionPlan::build(
            addr(50),
            &DiscoveryResult::default(),
            &RegistryConfig::default(),
        );
        assert_eq!(plan.len(), 3);
        assert_eq!(plan.count(ExecutionPhase::Strategies), 0);
    }
}
