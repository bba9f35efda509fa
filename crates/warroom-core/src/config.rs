//! Run configuration.
//!
//! Layered through the `config` crate: built-in defaults, then an optional
//! file, then `WARROOM_` environment variables (`__` separates sections, e.g.
//! `WARROOM_EXECUTION__CALL_TIMEOUT_SECS=60`).

use crate::error::WarRoomError;
use crate::fee::{FeeSchedule, FeeScheduleError};
use crate::report::RunStatus;
use crate::types::{Address, VaultStatus};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Yield-aggregator passthrough vault (byvWBTC). It has no controller or strategy.
pub const DEFAULT_PASSTHROUGH_VAULT: &str = "0x4b92d19c11435614cd49af1b589001b7c08cd4d5";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarRoomConfig {
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub fee: FeeConfig,

    #[serde(default)]
    pub execution: ExecutionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for WarRoomConfig {
    fn default() -> Self {
        Self {
            registry: RegistryConfig::default(),
            fee: FeeConfig::default(),
            execution: ExecutionConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Registry names and discovery scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Name of the pause gate every pause goes through
    #[serde(default = "default_guardian")]
    pub guardian: String,

    /// Name of the global access-control module
    #[serde(default = "default_global_access_control")]
    pub global_access_control: String,

    /// Name of the reward tree module
    #[serde(default = "default_badger_tree")]
    pub badger_tree: String,

    /// Name of the module whose core is paused last
    #[serde(default = "default_ibbtc")]
    pub ibbtc: String,

    /// V1 vault excluded from strategy resolution; an empty string disables the exclusion
    #[serde(default = "default_passthrough", deserialize_with = "optional_address")]
    pub passthrough_vault: Option<Address>,

    /// Lifecycle statuses to list, in discovery order
    #[serde(default = "default_statuses")]
    pub statuses: Vec<VaultStatus>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            guardian: default_guardian(),
            global_access_control: default_global_access_control(),
            badger_tree: default_badger_tree(),
            ibbtc: default_ibbtc(),
            passthrough_vault: default_passthrough(),
            statuses: default_statuses(),
        }
    }
}

/// Default fee schedule offered to the operator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    #[serde(default = "default_initial_gwei")]
    pub initial_gwei: f64,

    #[serde(default = "default_max_gwei")]
    pub max_gwei: f64,

    #[serde(default = "default_interval_secs")]
    pub interval_secs: f64,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            initial_gwei: default_initial_gwei(),
            max_gwei: default_max_gwei(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl FeeConfig {
    pub fn schedule(&self) -> Result<FeeSchedule, FeeScheduleError> {
        FeeSchedule::validate(self.initial_gwei, self.max_gwei, self.interval_secs)
    }
}

/// What to do when pausing the global access-control module fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GateFailurePolicy {
    /// Report the failure and keep pausing the remaining targets.
    #[default]
    Continue,
    /// Stop before any further pause is issued.
    Abort,
}

/// Process exit status policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExitPolicy {
    /// Exit 0 whenever the run reached its end, failures are only reported.
    #[default]
    AlwaysZero,
    /// Exit 2 when any pause attempt failed or the run was halted.
    NonZeroOnFailure,
}

impl ExitPolicy {
    pub fn exit_code(self, status: &RunStatus) -> i32 {
        match (self, status) {
            (Self::AlwaysZero, _) | (Self::NonZeroOnFailure, RunStatus::Completed) => 0,
            (Self::NonZeroOnFailure, _) => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Upper bound for any single remote call, in seconds
    #[serde(default = "default_call_timeout")]
    pub call_timeout_secs: u64,

    #[serde(default)]
    pub gate_failure: GateFailurePolicy,

    #[serde(default)]
    pub exit_policy: ExitPolicy,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: default_call_timeout(),
            gate_failure: GateFailurePolicy::default(),
            exit_policy: ExitPolicy::default(),
        }
    }
}

impl ExecutionConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_guardian() -> String {
    "guardian".to_string()
}

fn default_global_access_control() -> String {
    "globalAccessControl".to_string()
}

fn default_badger_tree() -> String {
    "badgerTree".to_string()
}

fn default_ibbtc() -> String {
    "ibBTC".to_string()
}

fn default_passthrough() -> Option<Address> {
    DEFAULT_PASSTHROUGH_VAULT.parse().ok()
}

fn optional_address<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => text.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

fn default_statuses() -> Vec<VaultStatus> {
    VaultStatus::ORDERED.to_vec()
}

fn default_initial_gwei() -> f64 {
    100.0
}

fn default_max_gwei() -> f64 {
    200.0
}

fn default_interval_secs() -> f64 {
    30.0
}

fn default_call_timeout() -> u64 {
    120
}

fn default_log_level() -> String {
    "info".to_string()
}

impl WarRoomConfig {
    /// Load defaults, then the optional file, then `WARROOM_*` environment overrides.
    pub fn load(path: Option<&str>) -> Result<Self, WarRoomError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&WarRoomConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("WARROOM")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let loaded: WarRoomConfig = builder.build()?.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject configurations that cannot drive a complete run.
    pub fn validate(&self) -> Result<(), WarRoomError> {
        if self.registry.statuses.is_empty() {
            return Err(WarRoomError::Config(
                "registry.statuses must list at least one status".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for status in &self.registry.statuses {
            if !seen.insert(*status) {
                return Err(WarRoomError::Config(format!(
                    "registry.statuses lists '{}' more than once",
                    status
                )));
            }
        }
        if self.execution.call_timeout_secs == 0 {
            return Err(WarRoomError::Config(
                "execution.call_timeout_secs must be greater than zero".to_string(),
            ));
        }
        self.fee.schedule()?;
        Ok(())
    }
}
