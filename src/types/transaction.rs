// Transaction - Appels du ledger soumis par la couche de dispatch
use super::account::AccountId;
use super::primitives::{Balance, Hash, OverwatchNodeId, Shares, SubnetId, SubnetNodeId, SwapId};
use crate::contracts::overwatch::{OverwatchCommit, OverwatchReveal};
use crate::contracts::swap_queue::SwapTarget;
use serde::{Deserialize, Serialize};

/// Origine d'un appel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Signed by an account
    Signed(AccountId),

    /// Runtime-internal (reward distribution, housekeeping)
    System,
}

impl Origin {
    pub fn signer(&self) -> Option<AccountId> {
        match self {
            Origin::Signed(account) => Some(*account),
            Origin::System => None,
        }
    }
}

/// Transaction soumise au ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Émetteur
    pub origin: Origin,

    /// Appel
    pub call: LedgerCall,
}

impl Transaction {
    pub fn signed(sender: AccountId, call: LedgerCall) -> Self {
        Self {
            origin: Origin::Signed(sender),
            call,
        }
    }

    pub fn system(call: LedgerCall) -> Self {
        Self {
            origin: Origin::System,
            call,
        }
    }

    /// Hash de la transaction, over its full bincode encoding
    pub fn hash(&self) -> Result<Hash, bincode::Error> {
        Ok(Hash::hash(&bincode::serialize(self)?))
    }
}

/// One variant per ledger operation, matched exhaustively by the dispatcher
///
/// Externally tagged: u128 amounts cannot pass through serde's
/// buffered (internally tagged) representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerCall {
    AddStake {
        subnet_id: SubnetId,
        amount: Balance,
    },
    RemoveStake {
        subnet_id: SubnetId,
        amount: Balance,
    },

    AddDelegateStake {
        subnet_id: SubnetId,
        amount: Balance,
    },
    RemoveDelegateStake {
        subnet_id: SubnetId,
        shares: Shares,
    },
    SwapDelegateStake {
        from_subnet_id: SubnetId,
        to_subnet_id: SubnetId,
        shares: Shares,
    },
    TransferDelegateStake {
        subnet_id: SubnetId,
        to: AccountId,
        shares: Shares,
    },

    AddNodeDelegateStake {
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        amount: Balance,
    },
    RemoveNodeDelegateStake {
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        shares: Shares,
    },
    SwapNodeDelegateStake {
        from_subnet_id: SubnetId,
        from_subnet_node_id: SubnetNodeId,
        to_subnet_id: SubnetId,
        to_subnet_node_id: SubnetNodeId,
        shares: Shares,
    },
    TransferNodeDelegateStake {
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        to: AccountId,
        shares: Shares,
    },
    SwapFromNodeToSubnet {
        from_subnet_id: SubnetId,
        from_subnet_node_id: SubnetNodeId,
        to_subnet_id: SubnetId,
        shares: Shares,
    },
    SwapFromSubnetToNode {
        from_subnet_id: SubnetId,
        to_subnet_id: SubnetId,
        to_subnet_node_id: SubnetNodeId,
        shares: Shares,
    },

    UpdateSwapQueue {
        id: SwapId,
        target: SwapTarget,
    },
    /// Integer-tagged form: 0 = subnet pool, 1 = node pool.
    /// `to_subnet_node_id` is ignored for subnet targets.
    UpdateSwapQueueByCallType {
        id: SwapId,
        call_type: u8,
        to_subnet_id: SubnetId,
        to_subnet_node_id: SubnetNodeId,
    },
    ExecuteSwap {
        id: SwapId,
    },
    ExecuteReadySwaps {
        max: usize,
    },

    ClaimUnbondings,

    CommitOverwatchWeights {
        overwatch_node_id: OverwatchNodeId,
        commits: Vec<OverwatchCommit>,
    },
    RevealOverwatchWeights {
        overwatch_node_id: OverwatchNodeId,
        reveals: Vec<OverwatchReveal>,
    },
    PruneOverwatch,

    // System origin only
    DistributeDelegateRewards {
        subnet_id: SubnetId,
        amount: Balance,
    },
    DistributeNodeDelegateRewards {
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        amount: Balance,
    },
}

impl LedgerCall {
    pub fn name(&self) -> &'static str {
        match self {
            LedgerCall::AddStake { .. } => "add_stake",
            LedgerCall::RemoveStake { .. } => "remove_stake",
            LedgerCall::AddDelegateStake { .. } => "add_delegate_stake",
            LedgerCall::RemoveDelegateStake { .. } => "remove_delegate_stake",
            LedgerCall::SwapDelegateStake { .. } => "swap_delegate_stake",
            LedgerCall::TransferDelegateStake { .. } => "transfer_delegate_stake",
            LedgerCall::AddNodeDelegateStake { .. } => "add_node_delegate_stake",
            LedgerCall::RemoveNodeDelegateStake { .. } => "remove_node_delegate_stake",
            LedgerCall::SwapNodeDelegateStake { .. } => "swap_node_delegate_stake",
            LedgerCall::TransferNodeDelegateStake { .. } => "transfer_node_delegate_stake",
            LedgerCall::SwapFromNodeToSubnet { .. } => "swap_from_node_to_subnet",
            LedgerCall::SwapFromSubnetToNode { .. } => "swap_from_subnet_to_node",
            LedgerCall::UpdateSwapQueue { .. } => "update_swap_queue",
            LedgerCall::UpdateSwapQueueByCallType { .. } => "update_swap_queue_by_call_type",
            LedgerCall::ExecuteSwap { .. } => "execute_swap",
            LedgerCall::ExecuteReadySwaps { .. } => "execute_ready_swaps",
            LedgerCall::ClaimUnbondings => "claim_unbondings",
            LedgerCall::CommitOverwatchWeights { .. } => "commit_overwatch_weights",
            LedgerCall::RevealOverwatchWeights { .. } => "reveal_overwatch_weights",
            LedgerCall::PruneOverwatch => "prune_overwatch",
            LedgerCall::DistributeDelegateRewards { .. } => "distribute_delegate_rewards",
            LedgerCall::DistributeNodeDelegateRewards { .. } => "distribute_node_delegate_rewards",
        }
    }

    /// Calls that only the runtime itself may submit
    pub fn requires_system_origin(&self) -> bool {
        matches!(
            self,
            LedgerCall::DistributeDelegateRewards { .. }
                | LedgerCall::DistributeNodeDelegateRewards { .. }
        )
    }

    /// Polls that any origin may submit
    pub fn is_permissionless(&self) -> bool {
        matches!(
            self,
            LedgerCall::ExecuteSwap { .. }
                | LedgerCall::ExecuteReadySwaps { .. }
                | LedgerCall::PruneOverwatch
        )
    }
}
