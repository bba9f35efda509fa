//! Serialized ledger state the snapshot adapter serves.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use thiserror::Error;
use warroom_core::{Address, SchemaVersion, VaultStatus};

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// One registry listing: production vaults of a schema in a status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Listing {
    pub schema: SchemaVersion,
    pub status: VaultStatus,
    #[serde(default)]
    pub vaults: Vec<Address>,
}

/// View-call answers for one vault. A missing field makes that call fail.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    #[serde(default)]
    pub controller: Option<Address>,
    #[serde(default)]
    pub token: Option<Address>,
    #[serde(default)]
    pub strategy: Option<Address>,
    #[serde(default)]
    pub gate_marker: Option<Address>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRecord {
    pub core: Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub names: BTreeMap<String, Address>,
    #[serde(default)]
    pub listings: Vec<Listing>,
    #[serde(default)]
    pub vaults: BTreeMap<Address, VaultRecord>,
    /// Controller address to (want token to strategy).
    #[serde(default)]
    pub controllers: BTreeMap<Address, BTreeMap<Address, Address>>,
    #[serde(default)]
    pub modules: BTreeMap<Address, ModuleRecord>,
    #[serde(default)]
    pub authorized_callers: BTreeSet<Address>,
    /// Targets whose pause reverts.
    #[serde(default)]
    pub reverting: BTreeSet<Address>,
    /// Targets whose pause never confirms.
    #[serde(default)]
    pub stalled: BTreeSet<Address>,
    /// Seconds a target's pause stays pending before it confirms.
    #[serde(default)]
    pub pending_secs: BTreeMap<Address, u64>,
    /// Targets already paused before the run.
    #[serde(default)]
    pub paused: BTreeSet<Address>,
}

impl LedgerSnapshot {
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let snapshot: Self = serde_json::from_str(json)?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| SnapshotError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&json)
    }

    /// A vault may appear in at most one listing.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = BTreeSet::new();
        let mut keys = BTreeSet::new();
        for listing in &self.listings {
            if !keys.insert((listing.schema, listing.status)) {
                return Err(SnapshotError::Invalid(format!(
                    "{} {} is listed more than once",
                    listing.schema, listing.status
                )));
            }
            for vault in &listing.vaults {
                if !seen.insert(*vault) {
                    return Err(SnapshotError::Invalid(format!(
                        "vault {} appears in more than one listing",
                        vault
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn listing(&self, schema: SchemaVersion, status: VaultStatus) -> Vec<Address> {
        self.listings
            .iter()
            .find(|listing| listing.schema == schema && listing.status == status)
            .map(|listing| listing.vaults.clone())
            .unwrap_or_default()
    }
}
