// Spécification du genesis - balances, subnets et overwatch nodes initiaux
use super::config::{ConfigError, LedgerConfig, SubnetParams};
use crate::runtime::MemoryRuntime;
use crate::storage::state::LedgerState;
use crate::types::{AccountId, Balance, OverwatchNodeId, SubnetId, SubnetNodeId, TOKEN};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Spécification du genesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSpec {
    /// Comptes initiaux avec leurs balances libres
    #[serde(default)]
    pub balances: BTreeMap<AccountId, Balance>,

    /// Subnets actifs au genesis
    #[serde(default)]
    pub subnets: BTreeMap<SubnetId, GenesisSubnet>,

    /// Overwatch nodes and their owners
    #[serde(default)]
    pub overwatch_nodes: BTreeMap<OverwatchNodeId, AccountId>,
}

/// Subnet dans le genesis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisSubnet {
    /// Falls back to `LedgerConfig::subnet_defaults`
    #[serde(default)]
    pub params: Option<SubnetParams>,

    /// Active nodes
    #[serde(default)]
    pub nodes: Vec<SubnetNodeId>,
}

/// Deterministic development account
pub fn dev_account(seed: u8) -> AccountId {
    AccountId::from_bytes([seed; 32])
}

impl GenesisSpec {
    /// Three funded accounts, two subnets with three nodes each, and one
    /// overwatch node owned by the first account
    pub fn dev() -> Self {
        let mut balances = BTreeMap::new();
        for seed in 1..=3 {
            balances.insert(dev_account(seed), 1_000_000 * TOKEN);
        }

        let mut subnets = BTreeMap::new();
        for subnet_id in 1..=2 {
            subnets.insert(
                subnet_id,
                GenesisSubnet {
                    params: None,
                    nodes: vec![1, 2, 3],
                },
            );
        }

        let mut overwatch_nodes = BTreeMap::new();
        overwatch_nodes.insert(1, dev_account(1));

        Self {
            balances,
            subnets,
            overwatch_nodes,
        }
    }

    /// Charge depuis un fichier JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Sauvegarde vers un fichier JSON
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Builder pour l'état genesis
pub struct GenesisBuilder {
    config: LedgerConfig,
    spec: GenesisSpec,
}

impl GenesisBuilder {
    pub fn new(config: LedgerConfig, spec: GenesisSpec) -> Self {
        Self { config, spec }
    }

    /// Validates the configuration and builds an empty ledger over a runtime
    /// holding the genesis balances and registries
    pub fn build(self) -> Result<LedgerState<MemoryRuntime>, ConfigError> {
        self.config.validate()?;

        let mut runtime = MemoryRuntime::new(self.config.network.clone());

        for (account, balance) in &self.spec.balances {
            runtime.set_balance(*account, *balance);
        }

        for (subnet_id, subnet) in &self.spec.subnets {
            let params = subnet.params.unwrap_or(self.config.subnet_defaults);
            params.validate()?;
            runtime.register_subnet(*subnet_id, params);

            let mut seen = BTreeSet::new();
            for node in &subnet.nodes {
                if !seen.insert(*node) {
                    return Err(ConfigError::Genesis(format!(
                        "subnet {} lists node {} twice",
                        subnet_id, node
                    )));
                }
                runtime.register_node(*subnet_id, *node);
            }
        }

        for (node, owner) in &self.spec.overwatch_nodes {
            runtime.register_overwatch_node(*node, *owner);
        }

        let state = LedgerState::new(runtime);

        info!(
            "🌱 Genesis built: {} accounts, {} subnets, {} overwatch nodes",
            self.spec.balances.len(),
            self.spec.subnets.len(),
            self.spec.overwatch_nodes.len()
        );

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{Currency, SubnetRegistry};

    #[test]
    fn test_dev_genesis() {
        let state = GenesisBuilder::new(LedgerConfig::default(), GenesisSpec::dev())
            .build()
            .unwrap();
        let runtime = state.runtime();

        assert_eq!(runtime.free_balance(&dev_account(2)), 1_000_000 * TOKEN);
        assert_eq!(runtime.subnet_params(1), Some(SubnetParams::default()));
        assert!(runtime.is_subnet_node_active(2, 3));
        assert!(!runtime.is_subnet_node_active(2, 4));
        assert_eq!(runtime.overwatch_node_owner(1), Some(dev_account(1)));
        assert_eq!(state.total_stake(), 0);
    }

    #[test]
    fn test_subnet_params_override() {
        let mut spec = GenesisSpec::dev();
        let custom = SubnetParams {
            min_stake: TOKEN,
            max_stake: 10 * TOKEN,
            unbonding_period: 5,
        };
        spec.subnets.insert(
            7,
            GenesisSubnet {
                params: Some(custom),
                nodes: vec![],
            },
        );

        let state = GenesisBuilder::new(LedgerConfig::default(), spec)
            .build()
            .unwrap();
        assert_eq!(state.runtime().subnet_params(7), Some(custom));
    }

    #[test]
    fn test_duplicate_node_rejected() {
        let mut spec = GenesisSpec::default();
        spec.subnets.insert(
            1,
            GenesisSubnet {
                params: None,
                nodes: vec![4, 4],
            },
        );

        let result = GenesisBuilder::new(LedgerConfig::default(), spec).build();
        assert!(matches!(result, Err(ConfigError::Genesis(_))));
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genesis.json");

        let spec = GenesisSpec::dev();
        spec.to_file(&path).unwrap();
        assert_eq!(GenesisSpec::from_file(&path).unwrap(), spec);
    }
}
