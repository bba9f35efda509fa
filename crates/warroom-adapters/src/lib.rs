//! Ledger adapters for the war-room orchestrator.
//!
//! [`SnapshotLedger`] serves registry listings, view calls, and pause
//! transactions from a JSON [`LedgerSnapshot`]. It is deterministic, keeps a
//! journal of every pause it receives, and supports failure injection through
//! the snapshot's `reverting` and `stalled` sets.

#![deny(unsafe_code)]

pub mod ledger;
pub mod snapshot;

pub use ledger::{JournalEntry, PauseEffect, SnapshotGate, SnapshotLedger};
pub use snapshot::{LedgerSnapshot, Listing, ModuleRecord, SnapshotError, VaultRecord};
