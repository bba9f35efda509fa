use crate::ledger::PauseReceipt;
use crate::plan::ExecutionPhase;
use crate::types::{Address, ResourceKind};
use serde::{Deserialize, Serialize};

/// Lifecycle of one pause target within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetState {
    NotAttempted,
    Succeeded,
    Failed,
}

/// A target that has not been attempted yet.
///
/// Resolving consumes it, so a target can only leave `NotAttempted` once.
#[derive(Debug, Clone)]
pub struct PendingPause {
    phase: ExecutionPhase,
    kind: ResourceKind,
    label: String,
    address: Option<Address>,
}

impl PendingPause {
    pub fn new(phase: ExecutionPhase, kind: ResourceKind, label: impl Into<String>) -> Self {
        Self {
            phase,
            kind,
            label: label.into(),
            address: None,
        }
    }

    pub fn at(mut self, address: Address) -> Self {
        self.address = Some(address);
        self
    }

    pub fn state(&self) -> TargetState {
        TargetState::NotAttempted
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn address(&self) -> Option<Address> {
        self.address
    }

    pub fn relabel(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn succeeded(self, receipt: PauseReceipt) -> PauseOutcome {
        PauseOutcome {
            phase: self.phase,
            kind: self.kind,
            label: self.label,
            address: self.address.or(Some(receipt.target)),
            succeeded: true,
            reason: None,
            receipt: Some(receipt),
        }
    }

    pub fn failed(self, reason: impl Into<String>) -> PauseOutcome {
        PauseOutcome {
            phase: self.phase,
            kind: self.kind,
            label: self.label,
            address: self.address,
            succeeded: false,
            reason: Some(reason.into()),
            receipt: None,
        }
    }
}

/// Result of one pause attempt. Never retried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseOutcome {
    pub phase: ExecutionPhase,
    pub kind: ResourceKind,
    pub label: String,
    pub address: Option<Address>,
    pub succeeded: bool,
    pub reason: Option<String>,
    pub receipt: Option<PauseReceipt>,
}

impl PauseOutcome {
    pub fn state(&self) -> TargetState {
        if self.succeeded {
            TargetState::Succeeded
        } else {
            TargetState::Failed
        }
    }
}
