use crate::error::WarRoomError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 20-byte ledger account address.
///
/// Equality is byte-for-byte; the textual form is `0x`-prefixed lowercase hex,
/// parsing accepts mixed case.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 20]);

impl Address {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Short `0xabcd…1234` form for progress output.
    pub fn short(&self) -> String {
        let full = self.to_string();
        format!("{}…{}", &full[..6], &full[full.len() - 4..])
    }
}

impl FromStr for Address {
    type Err = WarRoomError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let decoded =
            hex::decode(digits).map_err(|_| WarRoomError::InvalidAddress(value.to_string()))?;
        let bytes: [u8; 20] = decoded
            .try_into()
            .map_err(|_| WarRoomError::InvalidAddress(value.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = WarRoomError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

/// Registry schema generation a vault was listed under.
///
/// V1 vaults sit behind a controller and may bind the global access-control
/// module; V1.5 vaults hold their strategy directly and have no such binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SchemaVersion {
    #[serde(rename = "v1")]
    V1,
    #[serde(rename = "v1.5")]
    V1_5,
}

impl SchemaVersion {
    pub const ALL: [SchemaVersion; 2] = [SchemaVersion::V1, SchemaVersion::V1_5];

    /// Version tag used by the registry's filtered listing.
    pub fn registry_tag(self) -> &'static str {
        match self {
            Self::V1 => "v1",
            Self::V1_5 => "v1.5",
        }
    }

    /// Whether vaults of this schema can be bound to the central gate at all.
    pub fn supports_central_gate(self) -> bool {
        matches!(self, Self::V1)
    }

    /// Whether the strategy is reached through a controller.
    pub fn uses_controller(self) -> bool {
        matches!(self, Self::V1)
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.registry_tag())
    }
}

/// Registry lifecycle stage. Declaration order is the discovery order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VaultStatus {
    Deprecated,
    Experimental,
    Guarded,
    Open,
}

impl VaultStatus {
    pub const ORDERED: [VaultStatus; 4] = [
        VaultStatus::Deprecated,
        VaultStatus::Experimental,
        VaultStatus::Guarded,
        VaultStatus::Open,
    ];

    /// Numeric code the registry uses for this status.
    pub fn code(self) -> u8 {
        match self {
            Self::Deprecated => 0,
            Self::Experimental => 1,
            Self::Guarded => 2,
            Self::Open => 3,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Deprecated => "deprecated",
            Self::Experimental => "experimental",
            Self::Guarded => "guarded",
            Self::Open => "open",
        }
    }
}

impl fmt::Display for VaultStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Vault,
    Strategy,
    PeripheralModule,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vault => "vault",
            Self::Strategy => "strategy",
            Self::PeripheralModule => "module",
        })
    }
}

/// A discovered resource. Identity is the address; fields are fixed at discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRef {
    address: Address,
    kind: ResourceKind,
    schema: SchemaVersion,
    requires_direct_pause: bool,
}

impl ResourceRef {
    pub fn vault(address: Address, schema: SchemaVersion, requires_direct_pause: bool) -> Self {
        Self {
            address,
            kind: ResourceKind::Vault,
            schema,
            requires_direct_pause,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    pub fn requires_direct_pause(&self) -> bool {
        self.requires_direct_pause
    }
}

impl PartialEq for ResourceRef {
    fn eq(&self, other: &Self) -> bool {
        self.address == other.address
    }
}

impl Eq for ResourceRef {}

/// Operator identity that signs the pause transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub address: Address,
    pub label: Option<String>,
}

impl Caller {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({})", label, self.address),
            None => write!(f, "{}", self.address),
        }
    }
}
