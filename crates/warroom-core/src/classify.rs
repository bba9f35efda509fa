//! Capability classification and schema-dependent strategy lookup.

use crate::call::bounded;
use crate::error::CallError;
use crate::ledger::ResourceReader;
use crate::types::{Address, SchemaVersion};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// How a vault is brought to a halt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Halted transitively when the global access-control module is paused.
    Gated,
    /// Must be paused individually through the gate.
    Direct,
}

impl Capability {
    pub fn requires_direct_pause(self) -> bool {
        matches!(self, Self::Direct)
    }
}

/// Classify a vault.
///
/// A V1 vault is gated only if its access-control binding can be read; a
/// failed read is the expected signal for "not gated", not a fault. V1.5
/// vaults never have the binding.
pub async fn classify(
    reader: &dyn ResourceReader,
    vault: Address,
    schema: SchemaVersion,
    limit: Duration,
) -> Capability {
    if !schema.supports_central_gate() {
        return Capability::Direct;
    }

    match bounded(limit, reader.gate_marker(vault)).await {
        Ok(binding) => {
            debug!(vault = %vault, binding = %binding, "Vault is bound to global access control");
            Capability::Gated
        }
        Err(signal) => {
            debug!(vault = %vault, signal = %signal, "Vault has no global access-control binding");
            Capability::Direct
        }
    }
}

/// Resolve the strategy of a vault according to its schema.
///
/// V1 goes through the vault's controller keyed by its want token; V1.5 holds
/// the strategy directly.
pub async fn resolve_strategy(
    reader: &dyn ResourceReader,
    vault: Address,
    schema: SchemaVersion,
    limit: Duration,
) -> Result<Address, CallError> {
    if schema.uses_controller() {
        let controller = bounded(limit, reader.controller(vault)).await?;
        let token = bounded(limit, reader.token(vault)).await?;
        bounded(limit, reader.controller_strategy(controller, token)).await
    } else {
        bounded(limit, reader.strategy(vault)).await
    }
}
