//! Registry walk that builds the full set of pause candidates.
//!
//! Discovery is read-only and runs to completion before the first pause is
//! issued. Its result is immutable; the executor only ever sees a finished
//! [`DiscoveryResult`].

use crate::call::bounded;
use crate::classify::{classify, resolve_strategy};
use crate::config::RegistryConfig;
use crate::error::WarRoomError;
use crate::ledger::{RegistryClient, ResourceReader};
use crate::report::Reporter;
use crate::types::{Address, ResourceRef, SchemaVersion, VaultStatus};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// A vault whose dependent strategy could not be resolved.
///
/// The vault is still classified and paused if needed; only its strategy is
/// missing from the candidate set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryIssue {
    pub vault: Address,
    pub schema: SchemaVersion,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub vaults_v1: Vec<ResourceRef>,
    pub vaults_v1_5: Vec<ResourceRef>,
    pub strategies: Vec<Address>,
    pub non_gated_vaults: Vec<ResourceRef>,
    pub issues: Vec<DiscoveryIssue>,
}

impl DiscoveryResult {
    /// All discovered vaults, V1 first.
    pub fn vaults(&self) -> impl Iterator<Item = &ResourceRef> {
        self.vaults_v1.iter().chain(self.vaults_v1_5.iter())
    }

    /// Vaults covered by the global access-control pause.
    pub fn gated_vaults(&self) -> impl Iterator<Item = &ResourceRef> {
        self.vaults().filter(|vault| !vault.requires_direct_pause())
    }

    pub fn vault_count(&self) -> usize {
        self.vaults_v1.len() + self.vaults_v1_5.len()
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub statuses: Vec<VaultStatus>,
    pub passthrough_vault: Option<Address>,
    pub call_timeout: Duration,
}

impl DiscoverySettings {
    pub fn from_config(registry: &RegistryConfig, call_timeout: Duration) -> Self {
        Self {
            statuses: registry.statuses.clone(),
            passthrough_vault: registry.passthrough_vault,
            call_timeout,
        }
    }
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self::from_config(&RegistryConfig::default(), Duration::from_secs(120))
    }
}

pub struct ResourceDiscoverer {
    registry: Arc<dyn RegistryClient>,
    reader: Arc<dyn ResourceReader>,
    settings: DiscoverySettings,
}

impl ResourceDiscoverer {
    pub fn new(
        registry: Arc<dyn RegistryClient>,
        reader: Arc<dyn ResourceReader>,
        settings: DiscoverySettings,
    ) -> Self {
        Self {
            registry,
            reader,
            settings,
        }
    }

    /// List both schemas, then classify each vault and resolve its strategy.
    ///
    /// A failed listing aborts: the candidate set would be incomplete.
    #[instrument(skip(self, reporter))]
    pub async fn discover(
        &self,
        reporter: &mut dyn Reporter,
    ) -> Result<DiscoveryResult, WarRoomError> {
        let listed_v1 = self.list_schema(SchemaVersion::V1, reporter).await?;
        let listed_v1_5 = self.list_schema(SchemaVersion::V1_5, reporter).await?;

        let mut result = DiscoveryResult::default();

        for vault in listed_v1 {
            if self.settings.passthrough_vault == Some(vault) {
                info!(vault = %vault, "Skipping strategy lookup for passthrough vault");
            } else {
                self.collect_strategy(vault, SchemaVersion::V1, &mut result, reporter)
                    .await;
            }

            let capability = classify(
                self.reader.as_ref(),
                vault,
                SchemaVersion::V1,
                self.settings.call_timeout,
            )
            .await;
            let resource =
                ResourceRef::vault(vault, SchemaVersion::V1, capability.requires_direct_pause());
            if resource.requires_direct_pause() {
                result.non_gated_vaults.push(resource.clone());
            }
            result.vaults_v1.push(resource);
        }

        for vault in listed_v1_5 {
            self.collect_strategy(vault, SchemaVersion::V1_5, &mut result, reporter)
                .await;

            let resource = ResourceRef::vault(vault, SchemaVersion::V1_5, true);
            result.non_gated_vaults.push(resource.clone());
            result.vaults_v1_5.push(resource);
        }

        info!(
            vaults_v1 = result.vaults_v1.len(),
            vaults_v1_5 = result.vaults_v1_5.len(),
            strategies = result.strategies.len(),
            non_gated = result.non_gated_vaults.len(),
            issues = result.issues.len(),
            "Discovery complete"
        );
        reporter.discovery_finished(&result);
        Ok(result)
    }

    async fn list_schema(
        &self,
        schema: SchemaVersion,
        reporter: &mut dyn Reporter,
    ) -> Result<Vec<Address>, WarRoomError> {
        let mut vaults = Vec::new();
        for status in &self.settings.statuses {
            let listed = bounded(
                self.settings.call_timeout,
                self.registry.list_filtered(schema, *status),
            )
            .await
            .map_err(|source| WarRoomError::Listing {
                schema,
                status: *status,
                source,
            })?;
            reporter.listing_fetched(schema, *status, listed.len());
            vaults.extend(listed);
        }
        Ok(vaults)
    }

    async fn collect_strategy(
        &self,
        vault: Address,
        schema: SchemaVersion,
        result: &mut DiscoveryResult,
        reporter: &mut dyn Reporter,
    ) {
        match resolve_strategy(
            self.reader.as_ref(),
            vault,
            schema,
            self.settings.call_timeout,
        )
        .await
        {
            Ok(strategy) => result.strategies.push(strategy),
            Err(err) => {
                warn!(vault = %vault, schema = %schema, error = %err, "Strategy could not be resolved");
                let issue = DiscoveryIssue {
                    vault,
                    schema,
                    reason: format!("strategy of {} vault {} unresolved: {}", schema, vault, err),
                };
                reporter.discovery_issue(&issue);
                result.issues.push(issue);
            }
        }
    }
}
