// Swap Queue - Déplacements différés entre pools
//
// A swap burns shares in the source pool immediately but credits the target
// pool only after `swap_delay` blocks. Crediting in the same call would let an
// actor move share price in two pools atomically.

use crate::types::{AccountId, Balance, BlockNumber, LedgerError, SubnetId, SubnetNodeId, SwapId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// Integer tag used by callers that cannot pass an enum (precompile-style ABIs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapCallType {
    ToSubnetDelegateStake,
    ToNodeDelegateStake,
}

impl TryFrom<u8> for SwapCallType {
    type Error = LedgerError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        match tag {
            0 => Ok(SwapCallType::ToSubnetDelegateStake),
            1 => Ok(SwapCallType::ToNodeDelegateStake),
            other => Err(LedgerError::InvalidCallType(other)),
        }
    }
}

impl From<SwapCallType> for u8 {
    fn from(call_type: SwapCallType) -> Self {
        match call_type {
            SwapCallType::ToSubnetDelegateStake => 0,
            SwapCallType::ToNodeDelegateStake => 1,
        }
    }
}

/// Destination of a queued swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapTarget {
    ToSubnetDelegateStake {
        subnet_id: SubnetId,
    },
    ToNodeDelegateStake {
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
    },
}

impl SwapTarget {
    /// Builds a target from ABI parts. `subnet_node_id` is ignored for subnet targets.
    pub fn from_parts(
        call_type: u8,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
    ) -> Result<Self, LedgerError> {
        Ok(match SwapCallType::try_from(call_type)? {
            SwapCallType::ToSubnetDelegateStake => SwapTarget::ToSubnetDelegateStake { subnet_id },
            SwapCallType::ToNodeDelegateStake => SwapTarget::ToNodeDelegateStake {
                subnet_id,
                subnet_node_id,
            },
        })
    }

    pub fn call_type(&self) -> SwapCallType {
        match self {
            SwapTarget::ToSubnetDelegateStake { .. } => SwapCallType::ToSubnetDelegateStake,
            SwapTarget::ToNodeDelegateStake { .. } => SwapCallType::ToNodeDelegateStake,
        }
    }

    pub fn subnet_id(&self) -> SubnetId {
        match self {
            SwapTarget::ToSubnetDelegateStake { subnet_id }
            | SwapTarget::ToNodeDelegateStake { subnet_id, .. } => *subnet_id,
        }
    }

    pub fn subnet_node_id(&self) -> Option<SubnetNodeId> {
        match self {
            SwapTarget::ToSubnetDelegateStake { .. } => None,
            SwapTarget::ToNodeDelegateStake { subnet_node_id, .. } => Some(*subnet_node_id),
        }
    }
}

/// Entrée de la swap queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQueueEntry {
    pub id: SwapId,
    pub account: AccountId,
    pub target: SwapTarget,
    pub balance: Balance,
    pub queued_at_block: BlockNumber,
    /// First block at which the swap may execute; the entry is frozen from then on
    pub execute_after_block: BlockNumber,
}

impl SwapQueueEntry {
    pub fn is_matured(&self, current_block: BlockNumber) -> bool {
        current_block >= self.execute_after_block
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQueue {
    entries: BTreeMap<SwapId, SwapQueueEntry>,

    /// FIFO execution order
    order: VecDeque<SwapId>,

    next_id: SwapId,
}

impl SwapQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_id(&self) -> SwapId {
        self.next_id
    }

    pub fn get(&self, id: SwapId) -> Option<&SwapQueueEntry> {
        self.entries.get(&id)
    }

    pub fn check_enqueue(&self, balance: Balance) -> Result<(), LedgerError> {
        if balance == 0 {
            return Err(LedgerError::InsufficientAmount);
        }
        self.next_id.checked_add(1).ok_or(LedgerError::Overflow)?;
        Ok(())
    }

    /// Queues a swap maturing at `current_block + swap_delay`
    pub fn enqueue(
        &mut self,
        account: AccountId,
        target: SwapTarget,
        balance: Balance,
        current_block: BlockNumber,
        swap_delay: BlockNumber,
    ) -> Result<SwapId, LedgerError> {
        self.check_enqueue(balance)?;

        let id = self.next_id;
        self.next_id += 1;

        self.entries.insert(
            id,
            SwapQueueEntry {
                id,
                account,
                target,
                balance,
                queued_at_block: current_block,
                execute_after_block: current_block.saturating_add(swap_delay),
            },
        );
        self.order.push_back(id);

        Ok(id)
    }

    /// Only the owner may retarget, and only before maturity
    pub fn check_update(
        &self,
        id: SwapId,
        account: &AccountId,
        current_block: BlockNumber,
    ) -> Result<&SwapQueueEntry, LedgerError> {
        let entry = self.entries.get(&id).ok_or(LedgerError::SwapNotFound(id))?;
        if entry.account != *account {
            return Err(LedgerError::Unauthorized);
        }
        if entry.is_matured(current_block) {
            return Err(LedgerError::QueueLocked {
                id,
                execute_after: entry.execute_after_block,
            });
        }
        Ok(entry)
    }

    /// Retargets a queued swap. Balance and maturity are unchanged.
    pub fn update(
        &mut self,
        id: SwapId,
        account: &AccountId,
        target: SwapTarget,
        current_block: BlockNumber,
    ) -> Result<(), LedgerError> {
        self.check_update(id, account, current_block)?;
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.target = target;
        }
        Ok(())
    }

    pub fn check_matured(
        &self,
        id: SwapId,
        current_block: BlockNumber,
    ) -> Result<&SwapQueueEntry, LedgerError> {
        let entry = self.entries.get(&id).ok_or(LedgerError::SwapNotFound(id))?;
        if !entry.is_matured(current_block) {
            return Err(LedgerError::NotMatured {
                id,
                execute_after: entry.execute_after_block,
            });
        }
        Ok(entry)
    }

    pub fn remove(&mut self, id: SwapId) -> Option<SwapQueueEntry> {
        let entry = self.entries.remove(&id)?;
        self.order.retain(|queued| *queued != id);
        Some(entry)
    }

    /// Up to `max` matured ids, in queue order
    pub fn ready(&self, current_block: BlockNumber, max: usize) -> Vec<SwapId> {
        self.order
            .iter()
            .filter(|id| {
                self.entries
                    .get(id)
                    .is_some_and(|entry| entry.is_matured(current_block))
            })
            .take(max)
            .copied()
            .collect()
    }

    pub fn entries_of(&self, account: &AccountId) -> Vec<&SwapQueueEntry> {
        self.iter().filter(|entry| entry.account == *account).collect()
    }

    /// Entries in queue order
    pub fn iter(&self) -> impl Iterator<Item = &SwapQueueEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }
}
