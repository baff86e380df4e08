// Memory Runtime - Runtime en mémoire pour les tests et le replay
use super::{Currency, SubnetRegistry};
use crate::genesis::{NetworkParams, SubnetParams};
use crate::types::{
    AccountId, AccountInfo, Balance, LedgerError, OverwatchNodeId, SubnetId, SubnetNodeId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRuntime {
    network: NetworkParams,

    accounts: BTreeMap<AccountId, AccountInfo>,

    /// Active subnets
    subnets: BTreeMap<SubnetId, SubnetParams>,

    /// Active nodes
    nodes: BTreeSet<(SubnetId, SubnetNodeId)>,

    overwatch_nodes: BTreeMap<OverwatchNodeId, AccountId>,
}

impl MemoryRuntime {
    pub fn new(network: NetworkParams) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn set_balance(&mut self, account: AccountId, free: Balance) {
        self.accounts.insert(account, AccountInfo::new(free));
    }

    pub fn register_subnet(&mut self, subnet_id: SubnetId, params: SubnetParams) {
        self.subnets.insert(subnet_id, params);
    }

    /// Deactivates a subnet and every node registered under it
    pub fn deactivate_subnet(&mut self, subnet_id: SubnetId) {
        self.subnets.remove(&subnet_id);
        self.nodes.retain(|(subnet, _)| *subnet != subnet_id);
    }

    pub fn register_node(&mut self, subnet_id: SubnetId, subnet_node_id: SubnetNodeId) {
        self.nodes.insert((subnet_id, subnet_node_id));
    }

    pub fn deactivate_node(&mut self, subnet_id: SubnetId, subnet_node_id: SubnetNodeId) {
        self.nodes.remove(&(subnet_id, subnet_node_id));
    }

    pub fn register_overwatch_node(&mut self, node: OverwatchNodeId, owner: AccountId) {
        self.overwatch_nodes.insert(node, owner);
    }

    /// Sum of all free balances
    pub fn total_issuance(&self) -> Balance {
        self.accounts
            .values()
            .fold(0, |acc: Balance, info| acc.saturating_add(info.free))
    }
}

impl Currency for MemoryRuntime {
    fn free_balance(&self, account: &AccountId) -> Balance {
        self.accounts.get(account).map(|info| info.free).unwrap_or(0)
    }

    fn debit(&mut self, account: &AccountId, amount: Balance) -> Result<(), LedgerError> {
        let info = self
            .accounts
            .get_mut(account)
            .ok_or(LedgerError::InsufficientBalance)?;
        info.debit(amount)?;
        Ok(())
    }

    fn credit(&mut self, account: &AccountId, amount: Balance) {
        self.accounts.entry(*account).or_default().credit(amount);
    }
}

impl SubnetRegistry for MemoryRuntime {
    fn network_params(&self) -> &NetworkParams {
        &self.network
    }

    fn subnet_params(&self, subnet_id: SubnetId) -> Option<SubnetParams> {
        self.subnets.get(&subnet_id).copied()
    }

    fn is_subnet_node_active(&self, subnet_id: SubnetId, subnet_node_id: SubnetNodeId) -> bool {
        self.nodes.contains(&(subnet_id, subnet_node_id))
    }

    fn overwatch_node_owner(&self, node: OverwatchNodeId) -> Option<AccountId> {
        self.overwatch_nodes.get(&node).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debit_and_credit() {
        let alice = AccountId::from_bytes([1; 32]);
        let mut runtime = MemoryRuntime::default();
        runtime.set_balance(alice, 100);

        runtime.debit(&alice, 40).unwrap();
        assert_eq!(runtime.free_balance(&alice), 60);
        assert_eq!(runtime.debit(&alice, 61), Err(LedgerError::InsufficientBalance));
        assert_eq!(runtime.free_balance(&alice), 60);

        let bob = AccountId::from_bytes([2; 32]);
        assert_eq!(runtime.debit(&bob, 1), Err(LedgerError::InsufficientBalance));
        runtime.credit(&bob, 5);
        assert_eq!(runtime.free_balance(&bob), 5);
        assert_eq!(runtime.total_issuance(), 65);
    }

    #[test]
    fn test_deactivating_subnet_drops_its_nodes() {
        let mut runtime = MemoryRuntime::default();
        runtime.register_subnet(1, SubnetParams::default());
        runtime.register_node(1, 7);
        runtime.register_node(2, 7);

        assert!(runtime.active_node(1, 7).is_ok());
        runtime.deactivate_subnet(1);

        assert_eq!(runtime.active_subnet(1), Err(LedgerError::SubnetNotActive(1)));
        assert!(!runtime.is_subnet_node_active(1, 7));
        assert!(runtime.is_subnet_node_active(2, 7));
        assert_eq!(
            runtime.active_node(2, 7),
            Err(LedgerError::SubnetNotActive(2))
        );
    }
}
