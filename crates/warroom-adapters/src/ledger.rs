//! In-memory ledger served from a [`LedgerSnapshot`].

use crate::snapshot::{LedgerSnapshot, SnapshotError};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;
use warroom_core::{
    Address, CallError, Caller, FeeSchedule, PauseGate, PauseGateFactory, PauseReceipt,
    RegistryClient, ResourceReader, SchemaVersion, VaultStatus,
};

/// What happened to one pause transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseEffect {
    Paused,
    AlreadyPaused,
    Reverted,
    Unauthorized,
}

/// One pause transaction as seen by the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub sequence: u64,
    pub gate: Address,
    pub target: Address,
    pub caller: Address,
    pub fee_gwei: f64,
    pub effect: PauseEffect,
}

#[derive(Debug, Default)]
struct LedgerState {
    paused: BTreeSet<Address>,
    journal: Vec<JournalEntry>,
}

/// Deterministic ledger answering every collaborator call from a snapshot.
///
/// Clones share the same pause state and journal.
#[derive(Clone)]
pub struct SnapshotLedger {
    snapshot: Arc<LedgerSnapshot>,
    state: Arc<Mutex<LedgerState>>,
}

impl SnapshotLedger {
    pub fn new(snapshot: LedgerSnapshot) -> Self {
        let state = LedgerState {
            paused: snapshot.paused.clone(),
            journal: Vec::new(),
        };
        Self {
            snapshot: Arc::new(snapshot),
            state: Arc::new(Mutex::new(state)),
        }
    }

    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        Ok(Self::new(LedgerSnapshot::load(path).await?))
    }

    pub async fn journal(&self) -> Vec<JournalEntry> {
        self.state.lock().await.journal.clone()
    }

    /// Targets of every pause transaction, in submission order.
    pub async fn pause_order(&self) -> Vec<Address> {
        self.state
            .lock()
            .await
            .journal
            .iter()
            .map(|entry| entry.target)
            .collect()
    }

    pub async fn is_paused(&self, target: Address) -> bool {
        self.state.lock().await.paused.contains(&target)
    }

    fn vault_field<T>(
        &self,
        vault: Address,
        method: &'static str,
        field: impl FnOnce(&crate::snapshot::VaultRecord) -> Option<T>,
    ) -> Result<T, CallError> {
        self.snapshot
            .vaults
            .get(&vault)
            .and_then(field)
            .ok_or_else(|| CallError::unsupported(method, vault))
    }
}

#[async_trait]
impl RegistryClient for SnapshotLedger {
    async fn resolve(&self, name: &str) -> Result<Address, CallError> {
        self.snapshot
            .names
            .get(name)
            .copied()
            .ok_or_else(|| CallError::UnknownName(name.to_string()))
    }

    async fn list_filtered(
        &self,
        schema: SchemaVersion,
        status: VaultStatus,
    ) -> Result<Vec<Address>, CallError> {
        let vaults = self.snapshot.listing(schema, status);
        debug!(schema = %schema, status = %status, count = vaults.len(), "Listing served");
        Ok(vaults)
    }
}

#[async_trait]
impl ResourceReader for SnapshotLedger {
    async fn controller(&self, vault: Address) -> Result<Address, CallError> {
        self.vault_field(vault, "controller", |record| record.controller)
    }

    async fn token(&self, vault: Address) -> Result<Address, CallError> {
        self.vault_field(vault, "token", |record| record.token)
    }

    async fn controller_strategy(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, CallError> {
        self.snapshot
            .controllers
            .get(&controller)
            .and_then(|strategies| strategies.get(&token))
            .copied()
            .ok_or_else(|| CallError::unsupported("strategies", controller))
    }

    async fn strategy(&self, vault: Address) -> Result<Address, CallError> {
        self.vault_field(vault, "strategy", |record| record.strategy)
    }

    async fn gate_marker(&self, vault: Address) -> Result<Address, CallError> {
        self.vault_field(vault, "GAC", |record| record.gate_marker)
    }

    async fn core(&self, module: Address) -> Result<Address, CallError> {
        self.snapshot
            .modules
            .get(&module)
            .map(|record| record.core)
            .ok_or_else(|| CallError::unsupported("core", module))
    }

    async fn symbol(&self, address: Address) -> Result<String, CallError> {
        self.vault_field(address, "symbol", |record| record.symbol.clone())
    }
}

impl PauseGateFactory for SnapshotLedger {
    fn connect(&self, gate: Address, fees: FeeSchedule) -> Arc<dyn PauseGate> {
        Arc::new(SnapshotGate {
            ledger: self.clone(),
            address: gate,
            fees,
        })
    }
}

/// Pause gate over a [`SnapshotLedger`].
///
/// Each transaction is priced with the fee schedule at the time it spent
/// pending, counted from its own submission.
pub struct SnapshotGate {
    ledger: SnapshotLedger,
    address: Address,
    fees: FeeSchedule,
}

#[async_trait]
impl PauseGate for SnapshotGate {
    fn address(&self) -> Address {
        self.address
    }

    fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    async fn is_authorized(&self, caller: &Caller) -> Result<bool, CallError> {
        Ok(self
            .ledger
            .snapshot
            .authorized_callers
            .contains(&caller.address))
    }

    async fn pause(&self, target: Address, caller: &Caller) -> Result<PauseReceipt, CallError> {
        let snapshot = &self.ledger.snapshot;
        let submitted = Instant::now();
        if snapshot.stalled.contains(&target) {
            debug!(target = %target, "Pause transaction stalled");
            std::future::pending::<()>().await;
        }
        if let Some(secs) = snapshot.pending_secs.get(&target) {
            tokio::time::sleep(Duration::from_secs(*secs)).await;
        }

        let fee_gwei = self.fees.fee_at(submitted.elapsed());
        let mut state = self.ledger.state.lock().await;
        let effect = if !snapshot.authorized_callers.contains(&caller.address) {
            PauseEffect::Unauthorized
        } else if snapshot.reverting.contains(&target) {
            PauseEffect::Reverted
        } else if state.paused.insert(target) {
            PauseEffect::Paused
        } else {
            PauseEffect::AlreadyPaused
        };

        let sequence = state.journal.len() as u64 + 1;
        state.journal.push(JournalEntry {
            sequence,
            gate: self.address,
            target,
            caller: caller.address,
            fee_gwei,
            effect,
        });
        drop(state);

        match effect {
            PauseEffect::Paused | PauseEffect::AlreadyPaused => Ok(PauseReceipt {
                tx_hash: format!("0x{:064x}", sequence),
                target,
                fee_gwei,
                confirmed_at: Utc::now(),
            }),
            PauseEffect::Reverted => Err(CallError::Reverted("target rejected pause".to_string())),
            PauseEffect::Unauthorized => Err(CallError::Reverted(format!(
                "{} is not authorized on {}",
                caller.address, self.address
            ))),
        }
    }
}
