//! Collaborator interfaces for the ledger transport.
//!
//! Reads and writes are split: discovery only needs [`RegistryClient`] and
//! [`ResourceReader`], while pause transactions go through a [`PauseGate`]
//! obtained from a [`PauseGateFactory`] together with the run's fee schedule.

use crate::error::CallError;
use crate::fee::FeeSchedule;
use crate::types::{Address, Caller, SchemaVersion, VaultStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Symbolic-name directory of deployed contracts.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn resolve(&self, name: &str) -> Result<Address, CallError>;

    /// Production vaults of one schema in one lifecycle status, in registry order.
    async fn list_filtered(
        &self,
        schema: SchemaVersion,
        status: VaultStatus,
    ) -> Result<Vec<Address>, CallError>;
}

/// Read-only view calls on vaults, controllers, and modules.
#[async_trait]
pub trait ResourceReader: Send + Sync {
    /// Controller of a V1 vault.
    async fn controller(&self, vault: Address) -> Result<Address, CallError>;

    /// Want token of a V1 vault.
    async fn token(&self, vault: Address) -> Result<Address, CallError>;

    /// Strategy a controller holds for a token.
    async fn controller_strategy(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, CallError>;

    /// Strategy of a V1.5 vault.
    async fn strategy(&self, vault: Address) -> Result<Address, CallError>;

    /// Global access-control binding of a V1 vault. Fails when the vault has none.
    async fn gate_marker(&self, vault: Address) -> Result<Address, CallError>;

    /// Core contract behind a peripheral module.
    async fn core(&self, module: Address) -> Result<Address, CallError>;

    async fn symbol(&self, address: Address) -> Result<String, CallError>;
}

/// Confirmation of a pause transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PauseReceipt {
    pub tx_hash: String,
    pub target: Address,
    pub fee_gwei: f64,
    pub confirmed_at: DateTime<Utc>,
}

/// The central pause gate ("guardian") every pause goes through.
#[async_trait]
pub trait PauseGate: Send + Sync {
    fn address(&self) -> Address;

    fn fees(&self) -> &FeeSchedule;

    async fn is_authorized(&self, caller: &Caller) -> Result<bool, CallError>;

    async fn pause(&self, target: Address, caller: &Caller) -> Result<PauseReceipt, CallError>;
}

/// Connects to the gate at a resolved address, bound to a fee schedule.
pub trait PauseGateFactory: Send + Sync {
    fn connect(&self, gate: Address, fees: FeeSchedule) -> Arc<dyn PauseGate>;
}
