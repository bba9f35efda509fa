//! War Room emergency shutdown core.
//!
//! Discovers every vault and strategy listed in the on-chain registry,
//! classifies which of them are already covered by the global access-control
//! pause, and drives the pause gate through a fixed priority order with
//! per-target failure isolation.
//!
//! A run always has two phases. Discovery reads the registry and the vaults
//! to completion; only then does execution issue pause transactions:
//!
//! 1. the global access-control module,
//! 2. vaults that cannot be reached through it,
//! 3. every discovered strategy,
//! 4. the `badgerTree` module,
//! 5. the core contract behind the `ibBTC` module.
//!
//! Collaborators (registry, vault reads, pause gate, operator input, reporter)
//! are traits so that the same orchestration runs against a live transport or
//! the deterministic snapshot ledger in `warroom-adapters`.

#![deny(unsafe_code)]

pub mod call;
pub mod classify;
pub mod config;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod fee;
pub mod ledger;
pub mod orchestrator;
pub mod outcome;
pub mod plan;
pub mod report;
pub mod types;

#[cfg(test)]
mod testing;

pub use classify::Capability;
pub use config::{
    ExecutionConfig, ExitPolicy, FeeConfig, GateFailurePolicy, LoggingConfig, RegistryConfig,
    WarRoomConfig, DEFAULT_PASSTHROUGH_VAULT,
};
pub use discovery::{DiscoveryIssue, DiscoveryResult, DiscoverySettings, ResourceDiscoverer};
pub use error::{CallError, WarRoomError};
pub use executor::{Execution, ExecutionSettings, PauseExecutor};
pub use fee::{FeeConfigurator, FeeDraft, FeePrompt, FeeSchedule, FeeScheduleError};
pub use ledger::{PauseGate, PauseGateFactory, PauseReceipt, RegistryClient, ResourceReader};
pub use orchestrator::{Preflight, PreparedRun, ShutdownOrchestrator, ShutdownOrchestratorBuilder};
pub use outcome::{PauseOutcome, PendingPause, TargetState};
pub use plan::{ExecutionPhase, ExecutionPlan, PlannedPause, TargetSpec};
pub use report::{NullReporter, RecordingReporter, ReportEvent, Reporter, RunReport, RunStatus};
pub use types::{Address, Caller, ResourceKind, ResourceRef, SchemaVersion, VaultStatus};
