// Runtime - Primitives consommées par le ledger
//
// Free balances, subnet registration and overwatch node ownership live outside
// the ledger. `LedgerState` reaches them only through these traits.

pub mod memory;

pub use memory::MemoryRuntime;

use crate::genesis::{NetworkParams, SubnetParams};
use crate::types::{AccountId, Balance, LedgerError, OverwatchNodeId, SubnetId, SubnetNodeId};

/// Free balance custody
pub trait Currency {
    fn free_balance(&self, account: &AccountId) -> Balance;

    /// Fails `InsufficientBalance` without touching the account
    fn debit(&mut self, account: &AccountId, amount: Balance) -> Result<(), LedgerError>;

    fn credit(&mut self, account: &AccountId, amount: Balance);
}

/// Subnet, node and overwatch registries
pub trait SubnetRegistry {
    fn network_params(&self) -> &NetworkParams;

    /// `None` when the subnet is not active
    fn subnet_params(&self, subnet_id: SubnetId) -> Option<SubnetParams>;

    fn is_subnet_node_active(&self, subnet_id: SubnetId, subnet_node_id: SubnetNodeId) -> bool;

    fn overwatch_node_owner(&self, node: OverwatchNodeId) -> Option<AccountId>;

    fn active_subnet(&self, subnet_id: SubnetId) -> Result<SubnetParams, LedgerError> {
        self.subnet_params(subnet_id)
            .ok_or(LedgerError::SubnetNotActive(subnet_id))
    }

    /// Params of the node's subnet, if both are active
    fn active_node(
        &self,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
    ) -> Result<SubnetParams, LedgerError> {
        let params = self.active_subnet(subnet_id)?;
        if !self.is_subnet_node_active(subnet_id, subnet_node_id) {
            return Err(LedgerError::SubnetNodeNotActive {
                subnet_id,
                subnet_node_id,
            });
        }
        Ok(params)
    }
}

/// Everything the ledger needs from its host
pub trait Runtime: Currency + SubnetRegistry {}

impl<T: Currency + SubnetRegistry> Runtime for T {}
