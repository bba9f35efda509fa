//! In-crate ledger double for unit tests.

use crate::error::CallError;
use crate::fee::FeeSchedule;
use crate::ledger::{PauseGate, PauseGateFactory, PauseReceipt, RegistryClient, ResourceReader};
use crate::types::{Address, Caller, SchemaVersion, VaultStatus};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub fn addr(n: u8) -> Address {
    tagged(0x00, n)
}

pub fn tagged(tag: u8, n: u8) -> Address {
    let mut bytes = [0u8; 20];
    bytes[0] = tag;
    bytes[19] = n;
    Address::from_bytes(bytes)
}

pub fn controller_of(vault: Address) -> Address {
    tagged(0xC0, vault.as_bytes()[19])
}

pub fn token_of(vault: Address) -> Address {
    tagged(0x70, vault.as_bytes()[19])
}

pub const GUARDIAN: u8 = 1;
pub const GAC: u8 = 2;
pub const BADGER_TREE: u8 = 3;
pub const IBBTC: u8 = 4;
pub const IBBTC_CORE: u8 = 5;

pub fn named(n: u8) -> Address {
    tagged(0x6A, n)
}

pub fn caller() -> Caller {
    Caller::new(addr(200))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Resolve(String),
    List(SchemaVersion, VaultStatus),
    Read(&'static str, Address),
    Pause(Address),
}

#[derive(Debug, Clone, Default)]
struct Records {
    names: HashMap<String, Address>,
    listings: BTreeMap<(SchemaVersion, VaultStatus), Vec<Address>>,
    v1: HashMap<Address, bool>,
    strategies: HashMap<Address, Address>,
    modules: HashMap<Address, Address>,
    symbols: HashMap<Address, String>,
    failing_pauses: HashSet<Address>,
    failing_reads: HashSet<(&'static str, Address)>,
    authorized: HashSet<Address>,
}

#[derive(Clone, Default)]
pub struct FakeLedger {
    records: Arc<Records>,
    journal: Arc<Mutex<Vec<Call>>>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two V1 vaults (1 gated, 2 not) and one V1.5 vault (3), all named modules present.
    pub fn scenario() -> Self {
        Self::new()
            .name("guardian", named(GUARDIAN))
            .name("globalAccessControl", named(GAC))
            .name("badgerTree", named(BADGER_TREE))
            .name("ibBTC", named(IBBTC))
            .module(named(IBBTC), named(IBBTC_CORE))
            .v1_vault(addr(1), addr(101), true)
            .v1_vault(addr(2), addr(102), false)
            .v1_5_vault(addr(3), addr(103))
            .listing(SchemaVersion::V1, VaultStatus::Deprecated, &[addr(1)])
            .listing(SchemaVersion::V1, VaultStatus::Open, &[addr(2)])
            .listing(SchemaVersion::V1_5, VaultStatus::Guarded, &[addr(3)])
            .authorize(caller().address)
    }

    fn with(mut self, edit: impl FnOnce(&mut Records)) -> Self {
        edit(Arc::make_mut(&mut self.records));
        self
    }

    pub fn name(self, name: &str, address: Address) -> Self {
        self.with(|r| {
            r.names.insert(name.to_string(), address);
        })
    }

    pub fn listing(self, schema: SchemaVersion, status: VaultStatus, vaults: &[Address]) -> Self {
        self.with(|r| {
            r.listings
                .entry((schema, status))
                .or_default()
                .extend_from_slice(vaults);
        })
    }

    pub fn v1_vault(self, vault: Address, strategy: Address, gated: bool) -> Self {
        self.with(|r| {
            r.v1.insert(vault, gated);
            r.strategies.insert(vault, strategy);
            r.symbols.insert(vault, format!("b{}", vault.as_bytes()[19]));
        })
    }

    pub fn v1_5_vault(self, vault: Address, strategy: Address) -> Self {
        self.with(|r| {
            r.strategies.insert(vault, strategy);
            r.symbols.insert(vault, format!("bv{}", vault.as_bytes()[19]));
        })
    }

    pub fn module(self, module: Address, core: Address) -> Self {
        self.with(|r| {
            r.modules.insert(module, core);
        })
    }

    pub fn failing_pause(self, target: Address) -> Self {
        self.with(|r| {
            r.failing_pauses.insert(target);
        })
    }

    pub fn failing_read(self, method: &'static str, address: Address) -> Self {
        self.with(|r| {
            r.failing_reads.insert((method, address));
        })
    }

    pub fn authorize(self, caller: Address) -> Self {
        self.with(|r| {
            r.authorized.insert(caller);
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.journal.lock().unwrap().clone()
    }

    pub fn pauses(&self) -> Vec<Address> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Pause(target) => Some(target),
                _ => None,
            })
            .collect()
    }

    pub fn reads_of(&self, method: &'static str) -> Vec<Address> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Read(m, address) if m == method => Some(address),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.journal.lock().unwrap().push(call);
    }

    fn read(&self, method: &'static str, address: Address) -> Result<(), CallError> {
        self.record(Call::Read(method, address));
        if self.records.failing_reads.contains(&(method, address)) {
            return Err(CallError::Reverted(format!("{method} failed")));
        }
        Ok(())
    }
}

#[async_trait]
impl RegistryClient for FakeLedger {
    async fn resolve(&self, name: &str) -> Result<Address, CallError> {
        self.record(Call::Resolve(name.to_string()));
        self.records
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
        self.record(Call::List(schema, status));
        Ok(self
            .records
            .listings
            .get(&(schema, status))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl ResourceReader for FakeLedger {
    async fn controller(&self, vault: Address) -> Result<Address, CallError> {
        self.read("controller", vault)?;
        if self.records.v1.contains_key(&vault) {
            Ok(controller_of(vault))
        } else {
            Err(CallError::unsupported("controller", vault))
        }
    }

    async fn token(&self, vault: Address) -> Result<Address, CallError> {
        self.read("token", vault)?;
        Ok(token_of(vault))
    }

    async fn controller_strategy(
        &self,
        controller: Address,
        token: Address,
    ) -> Result<Address, CallError> {
        self.read("controller_strategy", controller)?;
        let vault = addr(token.as_bytes()[19]);
        self.records
            .strategies
            .get(&vault)
            .copied()
            .ok_or_else(|| CallError::unsupported("strategies", controller))
    }

    async fn strategy(&self, vault: Address) -> Result<Address, CallError> {
        self.read("strategy", vault)?;
        self.records
            .strategies
            .get(&vault)
            .copied()
            .ok_or_else(|| CallError::unsupported("strategy", vault))
    }

    async fn gate_marker(&self, vault: Address) -> Result<Address, CallError> {
        self.read("gate_marker", vault)?;
        match self.records.v1.get(&vault) {
            Some(true) => Ok(named(GAC)),
            _ => Err(CallError::unsupported("GAC", vault)),
        }
    }

    async fn core(&self, module: Address) -> Result<Address, CallError> {
        self.read("core", module)?;
        self.records
            .modules
            .get(&module)
            .copied()
            .ok_or_else(|| CallError::unsupported("core", module))
    }

    async fn symbol(&self, address: Address) -> Result<String, CallError> {
        self.read("symbol", address)?;
        self.records
            .symbols
            .get(&address)
            .cloned()
            .ok_or_else(|| CallError::unsupported("symbol", address))
    }
}

pub struct FakeGate {
    ledger: FakeLedger,
    address: Address,
    fees: FeeSchedule,
}

#[async_trait]
impl PauseGate for FakeGate {
    fn address(&self) -> Address {
        self.address
    }

    fn fees(&self) -> &FeeSchedule {
        &self.fees
    }

    async fn is_authorized(&self, caller: &Caller) -> Result<bool, CallError> {
        Ok(self.ledger.records.authorized.contains(&caller.address))
    }

    async fn pause(&self, target: Address, _caller: &Caller) -> Result<PauseReceipt, CallError> {
        self.ledger.record(Call::Pause(target));
        if self.ledger.records.failing_pauses.contains(&target) {
            return Err(CallError::Reverted("not pausable".to_string()));
        }
        Ok(PauseReceipt {
            tx_hash: format!("0xtx{}", target),
            target,
            fee_gwei: self.fees.initial_gwei(),
            confirmed_at: Utc::now(),
        })
    }
}

impl PauseGateFactory for FakeLedger {
    fn connect(&self, gate: Address, fees: FeeSchedule) -> Arc<dyn PauseGate> {
        Arc::new(FakeGate {
            ledger: self.clone(),
            address: gate,
            fees,
        })
    }
}
