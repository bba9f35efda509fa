use crate::fee::FeeScheduleError;
use crate::types::{Address, SchemaVersion, VaultStatus};
use std::time::Duration;
use thiserror::Error;

/// Failure of a single remote call.
///
/// Call errors are data: the classifier reads them as "not gated" and the
/// executor turns them into failed outcomes. They only become a
/// [`WarRoomError`] when they break a precondition of the run.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CallError {
    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("no confirmation within {0:?}")]
    Timeout(Duration),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("registry has no entry named '{0}'")]
    UnknownName(String),

    #[error("{method}() is not available on {address}")]
    Unsupported {
        method: &'static str,
        address: Address,
    },
}

impl CallError {
    pub fn unsupported(method: &'static str, address: Address) -> Self {
        Self::Unsupported { method, address }
    }
}

/// Run-aborting errors.
#[derive(Debug, Error)]
pub enum WarRoomError {
    #[error("Precondition failed: registry name '{name}' could not be resolved: {source}")]
    UnresolvedName {
        name: String,
        #[source]
        source: CallError,
    },

    #[error("Precondition failed: caller {0} is not authorized on the pause gate")]
    Unauthorized(Address),

    #[error("Precondition failed: caller authorization could not be checked: {0}")]
    AuthorizationCheck(#[source] CallError),

    #[error("Discovery failed listing {schema} vaults with status '{status}': {source}")]
    Listing {
        schema: SchemaVersion,
        status: VaultStatus,
        #[source]
        source: CallError,
    },

    #[error("Invalid fee schedule: {0}")]
    FeeSchedule(#[from] FeeScheduleError),

    #[error("Operator input failed: {0}")]
    Input(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}

impl WarRoomError {
    pub fn unresolved(name: &str, source: CallError) -> Self {
        Self::UnresolvedName {
            name: name.to_string(),
            source,
        }
    }

    /// Whether the error was raised before any pause transaction could be sent.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedName { .. }
                | Self::Unauthorized(_)
                | Self::AuthorizationCheck(_)
                | Self::Listing { .. }
        )
    }
}

impl From<config::ConfigError> for WarRoomError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
