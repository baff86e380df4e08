// Dispatch - Application d'une transaction au ledger à une hauteur donnée
use crate::runtime::Runtime;
use crate::contracts::swap_queue::SwapTarget;
use crate::storage::state::{LedgerState, SwapOutcome};
use crate::types::{
    AccountId, Balance, BlockNumber, EpochNumber, Hash, LedgerCall, LedgerError, Origin, Shares,
    SwapId, Transaction,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// What a successful call returns to the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutput {
    Done,
    Stake { balance: Balance },
    Unbonding { unlock_block: BlockNumber },
    Shares { shares: Shares },
    Withdrawn { amount: Balance },
    SwapQueued { id: SwapId },
    Swap { outcome: SwapOutcome },
    Swaps { results: Vec<SwapResult> },
    Claimed { amount: Balance },
    Epoch { epoch: EpochNumber },
    Pruned { removed: usize },
}

/// Outcome of one entry in a batch execution
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapResult {
    pub id: SwapId,
    pub outcome: Option<SwapOutcome>,
    pub error: Option<LedgerError>,
}

/// Result of executing a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub tx_hash: Hash,
    pub call: String,
    pub block_number: BlockNumber,
    pub output: Option<CallOutput>,
    /// Error if the call was rejected; the ledger is then unchanged
    pub error: Option<LedgerError>,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Transaction dispatcher
pub struct Dispatcher;

impl Dispatcher {
    /// Applies one transaction. Never panics on a rejected call.
    pub fn apply<R: Runtime>(
        state: &mut LedgerState<R>,
        tx: &Transaction,
        current_block: BlockNumber,
    ) -> ExecutionResult {
        let tx_hash = match tx.hash() {
            Ok(hash) => hash,
            Err(e) => {
                debug!(
                    "Transaction ({}) rejected at block {}: encoding failed: {}",
                    tx.call.name(),
                    current_block,
                    e
                );
                return ExecutionResult {
                    tx_hash: Hash::ZERO,
                    call: tx.call.name().to_string(),
                    block_number: current_block,
                    output: None,
                    error: Some(LedgerError::Encoding),
                };
            }
        };
        let result = Self::dispatch(state, tx, current_block);

        match &result {
            Ok(output) => debug!(
                "Transaction {} ({}) applied at block {}: {:?}",
                tx_hash,
                tx.call.name(),
                current_block,
                output
            ),
            Err(error) => debug!(
                "Transaction {} ({}) rejected at block {}: {}",
                tx_hash,
                tx.call.name(),
                current_block,
                error
            ),
        }

        let (output, error) = match result {
            Ok(output) => (Some(output), None),
            Err(error) => (None, Some(error)),
        };

        ExecutionResult {
            tx_hash,
            call: tx.call.name().to_string(),
            block_number: current_block,
            output,
            error,
        }
    }

    fn check_origin(tx: &Transaction) -> Result<Option<AccountId>, LedgerError> {
        let signer = tx.origin.signer();
        if tx.call.is_permissionless() {
            return Ok(signer);
        }
        match (&tx.origin, tx.call.requires_system_origin()) {
            (Origin::System, true) => Ok(None),
            (Origin::Signed(account), false) => Ok(Some(*account)),
            _ => Err(LedgerError::Unauthorized),
        }
    }

    fn dispatch<R: Runtime>(
        state: &mut LedgerState<R>,
        tx: &Transaction,
        current_block: BlockNumber,
    ) -> Result<CallOutput, LedgerError> {
        let signer = Self::check_origin(tx)?;
        let sender = || signer.ok_or(LedgerError::Unauthorized);

        let output = match &tx.call {
            LedgerCall::AddStake { subnet_id, amount } => CallOutput::Stake {
                balance: state.add_stake(&sender()?, *subnet_id, *amount)?,
            },
            LedgerCall::RemoveStake { subnet_id, amount } => CallOutput::Unbonding {
                unlock_block: state.remove_stake(&sender()?, *subnet_id, *amount, current_block)?,
            },

            LedgerCall::AddDelegateStake { subnet_id, amount } => CallOutput::Shares {
                shares: state.add_delegate_stake(&sender()?, *subnet_id, *amount)?,
            },
            LedgerCall::RemoveDelegateStake { subnet_id, shares } => CallOutput::Withdrawn {
                amount: state.remove_delegate_stake(&sender()?, *subnet_id, *shares, current_block)?,
            },
            LedgerCall::SwapDelegateStake {
                from_subnet_id,
                to_subnet_id,
                shares,
            } => CallOutput::SwapQueued {
                id: state.swap_delegate_stake(
                    &sender()?,
                    *from_subnet_id,
                    *to_subnet_id,
                    *shares,
                    current_block,
                )?,
            },
            LedgerCall::TransferDelegateStake {
                subnet_id,
                to,
                shares,
            } => {
                state.transfer_delegate_stake(&sender()?, *subnet_id, to, *shares)?;
                CallOutput::Done
            }

            LedgerCall::AddNodeDelegateStake {
                subnet_id,
                subnet_node_id,
                amount,
            } => CallOutput::Shares {
                shares: state.add_node_delegate_stake(
                    &sender()?,
                    *subnet_id,
                    *subnet_node_id,
                    *amount,
                )?,
            },
            LedgerCall::RemoveNodeDelegateStake {
                subnet_id,
                subnet_node_id,
                shares,
            } => CallOutput::Withdrawn {
                amount: state.remove_node_delegate_stake(
                    &sender()?,
                    *subnet_id,
                    *subnet_node_id,
                    *shares,
                    current_block,
                )?,
            },
            LedgerCall::SwapNodeDelegateStake {
                from_subnet_id,
                from_subnet_node_id,
                to_subnet_id,
                to_subnet_node_id,
                shares,
            } => CallOutput::SwapQueued {
                id: state.swap_node_delegate_stake(
                    &sender()?,
                    *from_subnet_id,
                    *from_subnet_node_id,
                    *to_subnet_id,
                    *to_subnet_node_id,
                    *shares,
                    current_block,
                )?,
            },
            LedgerCall::TransferNodeDelegateStake {
                subnet_id,
                subnet_node_id,
                to,
                shares,
            } => {
                state.transfer_node_delegate_stake(
                    &sender()?,
                    *subnet_id,
                    *subnet_node_id,
                    to,
                    *shares,
                )?;
                CallOutput::Done
            }
            LedgerCall::SwapFromNodeToSubnet {
                from_subnet_id,
                from_subnet_node_id,
                to_subnet_id,
                shares,
            } => CallOutput::SwapQueued {
                id: state.swap_from_node_to_subnet(
                    &sender()?,
                    *from_subnet_id,
                    *from_subnet_node_id,
                    *to_subnet_id,
                    *shares,
                    current_block,
                )?,
            },
            LedgerCall::SwapFromSubnetToNode {
                from_subnet_id,
                to_subnet_id,
                to_subnet_node_id,
                shares,
            } => CallOutput::SwapQueued {
                id: state.swap_from_subnet_to_node(
                    &sender()?,
                    *from_subnet_id,
                    *to_subnet_id,
                    *to_subnet_node_id,
                    *shares,
                    current_block,
                )?,
            },

            LedgerCall::UpdateSwapQueue { id, target } => {
                state.update_swap_queue(&sender()?, *id, *target, current_block)?;
                CallOutput::Done
            }
            LedgerCall::UpdateSwapQueueByCallType {
                id,
                call_type,
                to_subnet_id,
                to_subnet_node_id,
            } => {
                let account = sender()?;
                let target = SwapTarget::from_parts(*call_type, *to_subnet_id, *to_subnet_node_id)?;
                state.update_swap_queue(&account, *id, target, current_block)?;
                CallOutput::Done
            }
            LedgerCall::ExecuteSwap { id } => CallOutput::Swap {
                outcome: state.execute_swap(*id, current_block)?,
            },
            LedgerCall::ExecuteReadySwaps { max } => CallOutput::Swaps {
                results: state
                    .execute_ready_swaps(current_block, *max)
                    .into_iter()
                    .map(|(id, result)| match result {
                        Ok(outcome) => SwapResult {
                            id,
                            outcome: Some(outcome),
                            error: None,
                        },
                        Err(error) => SwapResult {
                            id,
                            outcome: None,
                            error: Some(error),
                        },
                    })
                    .collect(),
            },

            LedgerCall::ClaimUnbondings => CallOutput::Claimed {
                amount: state.claim_unbondings(&sender()?, current_block),
            },

            LedgerCall::CommitOverwatchWeights {
                overwatch_node_id,
                commits,
            } => CallOutput::Epoch {
                epoch: state.commit_overwatch_weights(
                    &sender()?,
                    *overwatch_node_id,
                    commits,
                    current_block,
                )?,
            },
            LedgerCall::RevealOverwatchWeights {
                overwatch_node_id,
                reveals,
            } => CallOutput::Epoch {
                epoch: state.reveal_overwatch_weights(
                    &sender()?,
                    *overwatch_node_id,
                    reveals,
                    current_block,
                )?,
            },
            LedgerCall::PruneOverwatch => CallOutput::Pruned {
                removed: state.prune_overwatch(current_block),
            },

            LedgerCall::DistributeDelegateRewards { subnet_id, amount } => {
                state.distribute_delegate_rewards(*subnet_id, *amount)?;
                CallOutput::Done
            }
            LedgerCall::DistributeNodeDelegateRewards {
                subnet_id,
                subnet_node_id,
                amount,
            } => {
                state.distribute_node_delegate_rewards(*subnet_id, *subnet_node_id, *amount)?;
                CallOutput::Done
            }
        };

        Ok(output)
    }
}
