//! End-to-end shutdown run: preflight, discovery, then execution.

use crate::call::bounded;
use crate::config::WarRoomConfig;
use crate::discovery::{DiscoveryResult, DiscoverySettings, ResourceDiscoverer};
use crate::error::WarRoomError;
use crate::executor::{ExecutionSettings, PauseExecutor};
use crate::fee::FeeSchedule;
use crate::ledger::{PauseGate, PauseGateFactory, RegistryClient, ResourceReader};
use crate::plan::ExecutionPlan;
use crate::report::{Reporter, RunReport, RunStatus};
use crate::types::{Address, Caller};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Addresses and gate established before discovery starts.
pub struct Preflight {
    pub guardian: Address,
    pub global_access_control: Address,
    pub gate: Arc<dyn PauseGate>,
}

/// A run that finished discovery and has not sent anything yet.
pub struct PreparedRun {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub caller: Caller,
    pub preflight: Preflight,
    pub discovery: DiscoveryResult,
    pub plan: ExecutionPlan,
}

pub struct ShutdownOrchestrator {
    registry: Arc<dyn RegistryClient>,
    reader: Arc<dyn ResourceReader>,
    gates: Arc<dyn PauseGateFactory>,
    config: WarRoomConfig,
}

impl ShutdownOrchestrator {
    pub fn builder() -> ShutdownOrchestratorBuilder {
        ShutdownOrchestratorBuilder::default()
    }

    pub fn config(&self) -> &WarRoomConfig {
        &self.config
    }

    /// Resolve the gate and access-control module, connect the gate with the
    /// run's fee schedule, and check the caller may use it.
    #[instrument(skip_all, fields(caller = %caller))]
    pub async fn preflight(
        &self,
        caller: &Caller,
        fees: FeeSchedule,
    ) -> Result<Preflight, WarRoomError> {
        let timeout = self.config.execution.call_timeout();
        let names = &self.config.registry;

        let guardian = bounded(timeout, self.registry.resolve(&names.guardian))
            .await
            .map_err(|source| WarRoomError::unresolved(&names.guardian, source))?;
        let global_access_control =
            bounded(timeout, self.registry.resolve(&names.global_access_control))
                .await
                .map_err(|source| WarRoomError::unresolved(&names.global_access_control, source))?;

        let gate = self.gates.connect(guardian, fees);
        let authorized = bounded(timeout, gate.is_authorized(caller))
            .await
            .map_err(WarRoomError::AuthorizationCheck)?;
        if !authorized {
            return Err(WarRoomError::Unauthorized(caller.address));
        }

        info!(
            guardian = %guardian,
            global_access_control = %global_access_control,
            fees = %gate.fees(),
            "Preflight passed"
        );
        Ok(Preflight {
            guardian,
            global_access_control,
            gate,
        })
    }

    pub async fn discover(
        &self,
        reporter: &mut dyn Reporter,
    ) -> Result<DiscoveryResult, WarRoomError> {
        let settings = DiscoverySettings::from_config(
            &self.config.registry,
            self.config.execution.call_timeout(),
        );
        ResourceDiscoverer::new(self.registry.clone(), self.reader.clone(), settings)
            .discover(reporter)
            .await
    }

    /// Preflight and discovery. Nothing is paused.
    pub async fn prepare(
        &self,
        caller: Caller,
        fees: FeeSchedule,
        reporter: &mut dyn Reporter,
    ) -> Result<PreparedRun, WarRoomError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(run_id = %run_id, caller = %caller, "Starting emergency shutdown run");

        let preflight = self.preflight(&caller, fees).await?;
        let discovery = self.discover(reporter).await?;
        let plan = ExecutionPlan::build(
            preflight.global_access_control,
            &discovery,
            &self.config.registry,
        );

        Ok(PreparedRun {
            run_id,
            started_at,
            caller,
            preflight,
            discovery,
            plan,
        })
    }

    /// Issue every planned pause and assemble the report.
    #[instrument(skip_all, fields(run_id = %prepared.run_id))]
    pub async fn execute(&self, prepared: PreparedRun, reporter: &mut dyn Reporter) -> RunReport {
        let executor = PauseExecutor::new(
            self.registry.clone(),
            self.reader.clone(),
            prepared.preflight.gate.clone(),
            prepared.caller.clone(),
            ExecutionSettings::from(&self.config.execution),
        );
        let execution = executor.execute(&prepared.plan, reporter).await;

        let status = match execution.halted {
            Some(reason) => RunStatus::Halted { reason },
            None => RunReport::status_for(&execution.outcomes),
        };
        let report = RunReport {
            run_id: prepared.run_id,
            caller: prepared.caller,
            fees: *prepared.preflight.gate.fees(),
            started_at: prepared.started_at,
            finished_at: Utc::now(),
            issues: prepared.discovery.issues,
            outcomes: execution.outcomes,
            status,
        };

        info!(
            succeeded = report.succeeded_count(),
            failed = report.failed_count(),
            status = ?report.status,
            "Emergency shutdown run finished"
        );
        reporter.finished(&report);
        report
    }

    /// Full run. Only precondition failures come back as errors.
    pub async fn run(
        &self,
        caller: Caller,
        fees: FeeSchedule,
        reporter: &mut dyn Reporter,
    ) -> Result<RunReport, WarRoomError> {
        let prepared = self.prepare(caller, fees, reporter).await?;
        Ok(self.execute(prepared, reporter).await)
    }
}

/// Builder for [`ShutdownOrchestrator`].
#[derive(Default)]
pub struct ShutdownOrchestratorBuilder {
    registry: Option<Arc<dyn RegistryClient>>,
    reader: Option<Arc<dyn ResourceReader>>,
    gates: Option<Arc<dyn PauseGateFactory>>,
    config: Option<WarRoomConfig>,
}

impl ShutdownOrchestratorBuilder {
    pub fn with_registry(mut self, registry: Arc<dyn RegistryClient>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_reader(mut self, reader: Arc<dyn ResourceReader>) -> Self {
        self.reader = Some(reader);
        self
    }

    pub fn with_gate_factory(mut self, gates: Arc<dyn PauseGateFactory>) -> Self {
        self.gates = Some(gates);
        self
    }

    /// Use one backend for registry, reads, and the pause gate.
    pub fn with_ledger<L>(self, ledger: Arc<L>) -> Self
    where
        L: RegistryClient + ResourceReader + PauseGateFactory + 'static,
    {
        self.with_registry(ledger.clone())
            .with_reader(ledger.clone())
            .with_gate_factory(ledger)
    }

    pub fn with_config(mut self, config: WarRoomConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> Result<ShutdownOrchestrator, WarRoomError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        Ok(ShutdownOrchestrator {
            registry: self
                .registry
                .ok_or_else(|| WarRoomError::Config("registry client is required".into()))?,
            reader: self
                .reader
                .ok_or_else(|| WarRoomError::Config("resource reader is required".into()))?,
            gates: self
                .gates
                .ok_or_else(|| WarRoomError::Config("pause gate factory is required".into()))?,
            config,
        })
    }
}
