// State - Façade atomique du ledger de stake
//
// Every write follows the same order: validate each touched component, then
// perform the one fallible external step (a debit), then apply writes that
// can no longer fail. A rejected operation leaves the ledger unchanged.

use crate::contracts::delegate_pool::{DelegatePool, PoolState};
use crate::contracts::node_delegate_pool::{NodeDelegatePool, NodeKey};
use crate::contracts::overwatch::{OverwatchCommit, OverwatchEngine, OverwatchReveal};
use crate::contracts::stake::StakeLedger;
use crate::contracts::swap_queue::{SwapQueue, SwapQueueEntry, SwapTarget};
use crate::contracts::unbonding::{UnbondingEntry, UnbondingLedger};
use crate::genesis::SubnetParams;
use crate::runtime::Runtime;
use crate::types::{
    AccountId, Balance, BlockNumber, EpochNumber, Hash, LedgerError, MerkleProof, OverwatchNodeId,
    Shares, StateMerkleTree, StateRoot, SubnetId, SubnetNodeId, SwapId,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

/// Bumped whenever the snapshot layout changes
pub const SNAPSHOT_VERSION: u32 = 1;

// =============================================================================
// POOLS
// =============================================================================

/// One delegate pool, subnet-wide or node-scoped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolId {
    Subnet(SubnetId),
    Node(NodeKey),
}

impl PoolId {
    pub fn node(subnet_id: SubnetId, subnet_node_id: SubnetNodeId) -> Self {
        PoolId::Node(NodeKey::new(subnet_id, subnet_node_id))
    }

    pub fn subnet_id(&self) -> SubnetId {
        match self {
            PoolId::Subnet(subnet_id) => *subnet_id,
            PoolId::Node(key) => key.subnet_id,
        }
    }
}

impl From<SwapTarget> for PoolId {
    fn from(target: SwapTarget) -> Self {
        match target {
            SwapTarget::ToSubnetDelegateStake { subnet_id } => PoolId::Subnet(subnet_id),
            SwapTarget::ToNodeDelegateStake {
                subnet_id,
                subnet_node_id,
            } => PoolId::node(subnet_id, subnet_node_id),
        }
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PoolId::Subnet(subnet_id) => write!(f, "subnet {}", subnet_id),
            PoolId::Node(key) => write!(f, "node {}", key),
        }
    }
}

/// Result of executing a matured swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapOutcome {
    /// Balance deposited into the target pool
    Deposited { shares: Shares },

    /// Target could not accept the balance; it was queued for unbonding instead
    Unbonded { unlock_block: BlockNumber },
}

// =============================================================================
// LEDGER STORE
// =============================================================================

/// Every ledger component, as persisted in snapshots
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStore {
    pub stakes: StakeLedger,
    pub delegate: DelegatePool,
    pub node_delegate: NodeDelegatePool,
    pub unbonding: UnbondingLedger,
    pub swaps: SwapQueue,
    pub overwatch: OverwatchEngine,
}

impl LedgerStore {
    pub fn new(max_unbondings: usize) -> Self {
        Self {
            unbonding: UnbondingLedger::new(max_unbondings),
            ..Self::default()
        }
    }

    pub fn shares_of(&self, account: &AccountId, pool: PoolId) -> Shares {
        match pool {
            PoolId::Subnet(subnet_id) => self.delegate.shares_of(account, subnet_id),
            PoolId::Node(key) => self.node_delegate.shares_of(account, key),
        }
    }

    pub fn balance_of(&self, account: &AccountId, pool: PoolId) -> Balance {
        match pool {
            PoolId::Subnet(subnet_id) => self.delegate.balance_of(account, subnet_id),
            PoolId::Node(key) => self.node_delegate.balance_of(account, key),
        }
    }

    pub fn pool(&self, pool: PoolId) -> PoolState {
        match pool {
            PoolId::Subnet(subnet_id) => self.delegate.pool(subnet_id),
            PoolId::Node(key) => self.node_delegate.pool(key),
        }
    }

    pub fn quote_deposit(
        &self,
        pool: PoolId,
        amount: Balance,
        min_deposit: Balance,
    ) -> Result<Shares, LedgerError> {
        match pool {
            PoolId::Subnet(subnet_id) => self.delegate.quote_deposit(subnet_id, amount, min_deposit),
            PoolId::Node(key) => self.node_delegate.quote_deposit(key, amount, min_deposit),
        }
    }

    pub fn deposit(
        &mut self,
        account: &AccountId,
        pool: PoolId,
        amount: Balance,
        min_deposit: Balance,
    ) -> Result<Shares, LedgerError> {
        match pool {
            PoolId::Subnet(subnet_id) => {
                self.delegate.deposit(account, subnet_id, amount, min_deposit)
            }
            PoolId::Node(key) => self.node_delegate.deposit(account, key, amount, min_deposit),
        }
    }

    pub fn quote_withdraw(
        &self,
        account: &AccountId,
        pool: PoolId,
        shares: Shares,
    ) -> Result<Balance, LedgerError> {
        match pool {
            PoolId::Subnet(subnet_id) => self.delegate.quote_withdraw(account, subnet_id, shares),
            PoolId::Node(key) => self.node_delegate.quote_withdraw(account, key, shares),
        }
    }

    pub fn withdraw(
        &mut self,
        account: &AccountId,
        pool: PoolId,
        shares: Shares,
    ) -> Result<Balance, LedgerError> {
        match pool {
            PoolId::Subnet(subnet_id) => self.delegate.withdraw(account, subnet_id, shares),
            PoolId::Node(key) => self.node_delegate.withdraw(account, key, shares),
        }
    }

    pub fn transfer(
        &mut self,
        from: &AccountId,
        pool: PoolId,
        to: &AccountId,
        shares: Shares,
        min_deposit: Balance,
    ) -> Result<(), LedgerError> {
        match pool {
            PoolId::Subnet(subnet_id) => {
                self.delegate.transfer(from, subnet_id, to, shares, min_deposit)
            }
            PoolId::Node(key) => self.node_delegate.transfer(from, key, to, shares, min_deposit),
        }
    }

    pub fn distribute(&mut self, pool: PoolId, amount: Balance) -> Result<(), LedgerError> {
        match pool {
            PoolId::Subnet(subnet_id) => self.delegate.distribute(subnet_id, amount),
            PoolId::Node(key) => self.node_delegate.distribute(key, amount),
        }
    }

    /// Canonical encoding of every record, in key order within each component.
    /// Fails as a whole if any record cannot be encoded.
    pub fn leaves(&self) -> Result<Vec<Vec<u8>>, bincode::Error> {
        let mut records = Vec::new();

        for ((account, subnet_id), balance) in self.stakes.entries() {
            records.push(StateLeaf::Stake(account, *subnet_id, *balance));
        }
        for (subnet_id, pool) in self.delegate.pools() {
            records.push(StateLeaf::DelegatePool(*subnet_id, pool));
        }
        for ((account, subnet_id), shares) in self.delegate.share_entries() {
            records.push(StateLeaf::DelegateShares(account, *subnet_id, *shares));
        }
        for (key, pool) in self.node_delegate.pools() {
            records.push(StateLeaf::NodePool(key, pool));
        }
        for ((account, key), shares) in self.node_delegate.share_entries() {
            records.push(StateLeaf::NodeShares(account, key, *shares));
        }
        for (account, entries) in self.unbonding.accounts() {
            records.push(StateLeaf::Unbonding(account, entries));
        }
        for entry in self.swaps.iter() {
            records.push(StateLeaf::Swap(entry));
        }
        for ((epoch, node, subnet_id), hash) in self.overwatch.commits() {
            records.push(StateLeaf::Commit(*epoch, *node, *subnet_id, hash));
        }
        for ((epoch, subnet_id, node), weight) in self.overwatch.reveals() {
            records.push(StateLeaf::Reveal(*epoch, *subnet_id, *node, *weight));
        }

        records.iter().map(bincode::serialize).collect()
    }
}

/// Merkle leaf; the variant tag separates record kinds
#[derive(Serialize)]
enum StateLeaf<'a> {
    Stake(&'a AccountId, SubnetId, Balance),
    DelegatePool(SubnetId, &'a PoolState),
    DelegateShares(&'a AccountId, SubnetId, Shares),
    NodePool(&'a NodeKey, &'a PoolState),
    NodeShares(&'a AccountId, &'a NodeKey, Shares),
    Unbonding(&'a AccountId, &'a [UnbondingEntry]),
    Swap(&'a SwapQueueEntry),
    Commit(EpochNumber, OverwatchNodeId, SubnetId, &'a Hash),
    Reveal(EpochNumber, SubnetId, OverwatchNodeId, u128),
}

// =============================================================================
// LEDGER STATE
// =============================================================================

/// Erreurs de snapshot
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Échec de sérialisation: {0}")]
    Codec(#[from] bincode::Error),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Serialize)]
struct SnapshotRef<'a, R> {
    version: u32,
    block_number: BlockNumber,
    store: &'a LedgerStore,
    runtime: &'a R,
}

#[derive(Deserialize)]
struct Snapshot<R> {
    version: u32,
    block_number: BlockNumber,
    store: LedgerStore,
    runtime: R,
}

/// État du ledger
///
/// The only way to mutate ledger components. Each public write is atomic:
/// it returns an error with no side effect, or applies completely.
#[derive(Debug, Clone)]
pub struct LedgerState<R: Runtime> {
    store: LedgerStore,
    runtime: R,
}

impl<R: Runtime> LedgerState<R> {
    pub fn new(runtime: R) -> Self {
        let capacity = runtime.network_params().max_unbondings;
        Self {
            store: LedgerStore::new(capacity),
            runtime,
        }
    }

    pub fn from_parts(store: LedgerStore, runtime: R) -> Self {
        Self { store, runtime }
    }

    pub fn store(&self) -> &LedgerStore {
        &self.store
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Registry and balance administration happen outside the ledger
    pub fn runtime_mut(&mut self) -> &mut R {
        &mut self.runtime
    }

    fn check_pool_active(&self, pool: PoolId) -> Result<SubnetParams, LedgerError> {
        match pool {
            PoolId::Subnet(subnet_id) => self.runtime.active_subnet(subnet_id),
            PoolId::Node(key) => self.runtime.active_node(key.subnet_id, key.subnet_node_id),
        }
    }

    /// Bounds for leaving a subnet. A deactivated subnet releases stake in
    /// full, over the network fallback period.
    fn withdrawal_params(&self, subnet_id: SubnetId) -> SubnetParams {
        self.runtime
            .subnet_params(subnet_id)
            .unwrap_or_else(|| SubnetParams {
                min_stake: 0,
                max_stake: Balance::MAX,
                unbonding_period: self.runtime.network_params().fallback_unbonding_period,
            })
    }

    fn enqueue_unbonding(
        &mut self,
        account: &AccountId,
        amount: Balance,
        unlock_block: BlockNumber,
        current_block: BlockNumber,
    ) -> Result<(), LedgerError> {
        let released = self
            .store
            .unbonding
            .enqueue(account, amount, unlock_block, current_block)?;
        if released > 0 {
            self.runtime.credit(account, released);
            debug!("Released {} matured unbonding to {} to make room", released, account);
        }
        Ok(())
    }

    // =========================================================================
    // DIRECT STAKE
    // =========================================================================

    /// Moves `amount` from free balance into direct stake. Returns the new stake.
    pub fn add_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        amount: Balance,
    ) -> Result<Balance, LedgerError> {
        let params = self.runtime.active_subnet(subnet_id)?;
        self.store.stakes.check_add(account, subnet_id, amount, &params)?;

        self.runtime.debit(account, amount)?;
        let balance = self.store.stakes.add_stake(account, subnet_id, amount, &params)?;

        info!("Stake added: {} +{} on subnet {} (now {})", account, amount, subnet_id, balance);
        Ok(balance)
    }

    /// Moves `amount` of direct stake into unbonding. Returns the unlock block.
    pub fn remove_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        amount: Balance,
        current_block: BlockNumber,
    ) -> Result<BlockNumber, LedgerError> {
        let params = self.withdrawal_params(subnet_id);
        self.store.stakes.check_remove(account, subnet_id, amount, &params)?;
        let unlock_block = current_block.saturating_add(params.unbonding_period);
        self.store
            .unbonding
            .check_enqueue(account, amount, unlock_block, current_block)?;

        self.store.stakes.remove_stake(account, subnet_id, amount, &params)?;
        self.enqueue_unbonding(account, amount, unlock_block, current_block)?;

        info!(
            "Stake removed: {} -{} from subnet {}, unlocks at block {}",
            account, amount, subnet_id, unlock_block
        );
        Ok(unlock_block)
    }

    // =========================================================================
    // DELEGATE STAKE (subnet and node pools)
    // =========================================================================

    fn deposit_into(
        &mut self,
        account: &AccountId,
        pool: PoolId,
        amount: Balance,
    ) -> Result<Shares, LedgerError> {
        self.check_pool_active(pool)?;
        let min_deposit = self.runtime.network_params().min_delegate_deposit;
        self.store.quote_deposit(pool, amount, min_deposit)?;

        self.runtime.debit(account, amount)?;
        let shares = self.store.deposit(account, pool, amount, min_deposit)?;

        info!("Delegated {} to {} for {} shares ({})", amount, pool, shares, account);
        Ok(shares)
    }

    fn withdraw_from(
        &mut self,
        account: &AccountId,
        pool: PoolId,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<Balance, LedgerError> {
        let period = self.withdrawal_params(pool.subnet_id()).unbonding_period;
        let amount = self.store.quote_withdraw(account, pool, shares)?;
        let unlock_block = current_block.saturating_add(period);

        // Dust shares worth nothing are burned without an unbonding entry
        if amount > 0 {
            self.store
                .unbonding
                .check_enqueue(account, amount, unlock_block, current_block)?;
        }

        self.store.withdraw(account, pool, shares)?;
        if amount > 0 {
            self.enqueue_unbonding(account, amount, unlock_block, current_block)?;
        }

        info!(
            "Undelegated {} shares from {} worth {}, unlocks at block {} ({})",
            shares, pool, amount, unlock_block, account
        );
        Ok(amount)
    }

    fn transfer_within(
        &mut self,
        from: &AccountId,
        pool: PoolId,
        to: &AccountId,
        shares: Shares,
    ) -> Result<(), LedgerError> {
        let min_deposit = self.runtime.network_params().min_delegate_deposit;
        self.store.transfer(from, pool, to, shares, min_deposit)?;

        info!("Transferred {} shares of {} from {} to {}", shares, pool, from, to);
        Ok(())
    }

    /// Burns source shares now and queues their balance for the target
    fn queue_swap(
        &mut self,
        account: &AccountId,
        source: PoolId,
        target: SwapTarget,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<SwapId, LedgerError> {
        self.check_pool_active(PoolId::from(target))?;
        let balance = self.store.quote_withdraw(account, source, shares)?;
        self.store.swaps.check_enqueue(balance)?;
        let delay = self.runtime.network_params().swap_delay;

        self.store.withdraw(account, source, shares)?;
        let id = self
            .store
            .swaps
            .enqueue(*account, target, balance, current_block, delay)?;

        info!(
            "Swap {} queued: {} from {} to {} for {}, executes after block {}",
            id,
            balance,
            source,
            PoolId::from(target),
            account,
            current_block.saturating_add(delay)
        );
        Ok(id)
    }

    pub fn add_delegate_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        amount: Balance,
    ) -> Result<Shares, LedgerError> {
        self.deposit_into(account, PoolId::Subnet(subnet_id), amount)
    }

    /// Returns the balance sent to unbonding
    pub fn remove_delegate_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<Balance, LedgerError> {
        self.withdraw_from(account, PoolId::Subnet(subnet_id), shares, current_block)
    }

    pub fn swap_delegate_stake(
        &mut self,
        account: &AccountId,
        from_subnet_id: SubnetId,
        to_subnet_id: SubnetId,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<SwapId, LedgerError> {
        self.queue_swap(
            account,
            PoolId::Subnet(from_subnet_id),
            SwapTarget::ToSubnetDelegateStake {
                subnet_id: to_subnet_id,
            },
            shares,
            current_block,
        )
    }

    pub fn transfer_delegate_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        to: &AccountId,
        shares: Shares,
    ) -> Result<(), LedgerError> {
        self.transfer_within(account, PoolId::Subnet(subnet_id), to, shares)
    }

    pub fn add_node_delegate_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        amount: Balance,
    ) -> Result<Shares, LedgerError> {
        self.deposit_into(account, PoolId::node(subnet_id, subnet_node_id), amount)
    }

    pub fn remove_node_delegate_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<Balance, LedgerError> {
        self.withdraw_from(
            account,
            PoolId::node(subnet_id, subnet_node_id),
            shares,
            current_block,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn swap_node_delegate_stake(
        &mut self,
        account: &AccountId,
        from_subnet_id: SubnetId,
        from_subnet_node_id: SubnetNodeId,
        to_subnet_id: SubnetId,
        to_subnet_node_id: SubnetNodeId,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<SwapId, LedgerError> {
        self.queue_swap(
            account,
            PoolId::node(from_subnet_id, from_subnet_node_id),
            SwapTarget::ToNodeDelegateStake {
                subnet_id: to_subnet_id,
                subnet_node_id: to_subnet_node_id,
            },
            shares,
            current_block,
        )
    }

    pub fn transfer_node_delegate_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        to: &AccountId,
        shares: Shares,
    ) -> Result<(), LedgerError> {
        self.transfer_within(account, PoolId::node(subnet_id, subnet_node_id), to, shares)
    }

    pub fn swap_from_node_to_subnet(
        &mut self,
        account: &AccountId,
        from_subnet_id: SubnetId,
        from_subnet_node_id: SubnetNodeId,
        to_subnet_id: SubnetId,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<SwapId, LedgerError> {
        self.queue_swap(
            account,
            PoolId::node(from_subnet_id, from_subnet_node_id),
            SwapTarget::ToSubnetDelegateStake {
                subnet_id: to_subnet_id,
            },
            shares,
            current_block,
        )
    }

    pub fn swap_from_subnet_to_node(
        &mut self,
        account: &AccountId,
        from_subnet_id: SubnetId,
        to_subnet_id: SubnetId,
        to_subnet_node_id: SubnetNodeId,
        shares: Shares,
        current_block: BlockNumber,
    ) -> Result<SwapId, LedgerError> {
        self.queue_swap(
            account,
            PoolId::Subnet(from_subnet_id),
            SwapTarget::ToNodeDelegateStake {
                subnet_id: to_subnet_id,
                subnet_node_id: to_subnet_node_id,
            },
            shares,
            current_block,
        )
    }

    /// Rewards enter the pool without minting shares
    pub fn distribute_delegate_rewards(
        &mut self,
        subnet_id: SubnetId,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        let pool = PoolId::Subnet(subnet_id);
        self.check_pool_active(pool)?;
        self.store.distribute(pool, amount)?;
        info!("Distributed {} rewards to {}", amount, pool);
        Ok(())
    }

    pub fn distribute_node_delegate_rewards(
        &mut self,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
        amount: Balance,
    ) -> Result<(), LedgerError> {
        let pool = PoolId::node(subnet_id, subnet_node_id);
        self.check_pool_active(pool)?;
        self.store.distribute(pool, amount)?;
        info!("Distributed {} rewards to {}", amount, pool);
        Ok(())
    }

    // =========================================================================
    // SWAP QUEUE
    // =========================================================================

    /// Retargets a queued swap. Only its owner may do so, before maturity.
    pub fn update_swap_queue(
        &mut self,
        account: &AccountId,
        id: SwapId,
        target: SwapTarget,
        current_block: BlockNumber,
    ) -> Result<(), LedgerError> {
        self.store.swaps.check_update(id, account, current_block)?;
        self.check_pool_active(PoolId::from(target))?;

        self.store.swaps.update(id, account, target, current_block)?;

        info!("Swap {} retargeted to {}", id, PoolId::from(target));
        Ok(())
    }

    /// Executes one matured swap.
    ///
    /// When the target can no longer accept the balance (deactivated subnet or
    /// node, or a deposit that would mint zero shares) the balance goes to the
    /// owner's unbonding ledger over `fallback_unbonding_period`. If that ledger
    /// is full the entry stays queued and the call fails.
    pub fn execute_swap(
        &mut self,
        id: SwapId,
        current_block: BlockNumber,
    ) -> Result<SwapOutcome, LedgerError> {
        let entry = self.store.swaps.check_matured(id, current_block)?.clone();
        let pool = PoolId::from(entry.target);

        let accepted = self
            .check_pool_active(pool)
            .and_then(|_| self.store.quote_deposit(pool, entry.balance, 0));

        match accepted {
            Ok(_) => {
                self.store.swaps.remove(id);
                let shares = self.store.deposit(&entry.account, pool, entry.balance, 0)?;

                info!(
                    "Swap {} executed: {} into {} for {} shares ({})",
                    id, entry.balance, pool, shares, entry.account
                );
                Ok(SwapOutcome::Deposited { shares })
            }
            Err(reason) => {
                let period = self.runtime.network_params().fallback_unbonding_period;
                let unlock_block = current_block.saturating_add(period);
                self.store.unbonding.check_enqueue(
                    &entry.account,
                    entry.balance,
                    unlock_block,
                    current_block,
                )?;

                self.store.swaps.remove(id);
                self.enqueue_unbonding(&entry.account, entry.balance, unlock_block, current_block)?;

                warn!(
                    "Swap {} target {} rejected ({}), {} sent to unbonding until block {}",
                    id, pool, reason, entry.balance, unlock_block
                );
                Ok(SwapOutcome::Unbonded { unlock_block })
            }
        }
    }

    /// Executes up to `max` matured swaps in queue order. Each entry is
    /// atomic on its own; a failing entry stays queued.
    pub fn execute_ready_swaps(
        &mut self,
        current_block: BlockNumber,
        max: usize,
    ) -> Vec<(SwapId, Result<SwapOutcome, LedgerError>)> {
        let ready = self.store.swaps.ready(current_block, max);
        debug!("{} matured swaps ready at block {}", ready.len(), current_block);

        ready
            .into_iter()
            .map(|id| (id, self.execute_swap(id, current_block)))
            .collect()
    }

    // =========================================================================
    // UNBONDING
    // =========================================================================

    /// Credits every matured entry to free balance. Returns 0 when nothing matured.
    pub fn claim_unbondings(&mut self, account: &AccountId, current_block: BlockNumber) -> Balance {
        let claimed = self.store.unbonding.claim(account, current_block);
        if claimed > 0 {
            self.runtime.credit(account, claimed);
            info!("Claimed {} unbonded by {}", claimed, account);
        } else {
            debug!("Nothing to claim for {} at block {}", account, current_block);
        }
        claimed
    }

    // =========================================================================
    // OVERWATCH
    // =========================================================================

    fn check_overwatch_owner(
        &self,
        caller: &AccountId,
        node: OverwatchNodeId,
    ) -> Result<(), LedgerError> {
        match self.runtime.overwatch_node_owner(node) {
            Some(owner) if owner == *caller => Ok(()),
            _ => Err(LedgerError::Unauthorized),
        }
    }

    pub fn commit_overwatch_weights(
        &mut self,
        caller: &AccountId,
        node: OverwatchNodeId,
        commits: &[OverwatchCommit],
        current_block: BlockNumber,
    ) -> Result<EpochNumber, LedgerError> {
        self.check_overwatch_owner(caller, node)?;
        for commit in commits {
            self.runtime.active_subnet(commit.subnet_id)?;
        }

        let schedule = self.runtime.network_params().overwatch_schedule();
        let epoch = self
            .store
            .overwatch
            .commit_many(&schedule, current_block, node, commits)?;

        info!(
            "Overwatch node {} committed {} weights for epoch {}",
            node,
            commits.len(),
            epoch
        );
        Ok(epoch)
    }

    pub fn reveal_overwatch_weights(
        &mut self,
        caller: &AccountId,
        node: OverwatchNodeId,
        reveals: &[OverwatchReveal],
        current_block: BlockNumber,
    ) -> Result<EpochNumber, LedgerError> {
        self.check_overwatch_owner(caller, node)?;

        let schedule = self.runtime.network_params().overwatch_schedule();
        let epoch = self
            .store
            .overwatch
            .reveal_many(&schedule, current_block, node, reveals)?;

        info!(
            "Overwatch node {} revealed {} weights for epoch {}",
            node,
            reveals.len(),
            epoch
        );
        Ok(epoch)
    }

    /// Drops overwatch records older than the retention window
    pub fn prune_overwatch(&mut self, current_block: BlockNumber) -> usize {
        let params = self.runtime.network_params();
        let current_epoch = params.overwatch_schedule().epoch_of(current_block);
        let before = current_epoch.saturating_sub(params.overwatch_retention_epochs);

        let removed = self.store.overwatch.prune(before);
        if removed > 0 {
            info!("Pruned {} overwatch records before epoch {}", removed, before);
        }
        removed
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Direct stake
    pub fn balance_of(&self, account: &AccountId, subnet_id: SubnetId) -> Balance {
        self.store.stakes.balance_of(account, subnet_id)
    }

    pub fn delegate_shares_of(&self, account: &AccountId, subnet_id: SubnetId) -> Shares {
        self.store.shares_of(account, PoolId::Subnet(subnet_id))
    }

    pub fn delegate_balance_of(&self, account: &AccountId, subnet_id: SubnetId) -> Balance {
        self.store.balance_of(account, PoolId::Subnet(subnet_id))
    }

    pub fn node_delegate_shares_of(
        &self,
        account: &AccountId,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
    ) -> Shares {
        self.store
            .shares_of(account, PoolId::node(subnet_id, subnet_node_id))
    }

    pub fn node_delegate_balance_of(
        &self,
        account: &AccountId,
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
    ) -> Balance {
        self.store
            .balance_of(account, PoolId::node(subnet_id, subnet_node_id))
    }

    pub fn pool(&self, pool: PoolId) -> PoolState {
        self.store.pool(pool)
    }

    pub fn pending_unbondings(&self, account: &AccountId) -> &[UnbondingEntry] {
        self.store.unbonding.pending(account)
    }

    pub fn queued_swap(&self, id: SwapId) -> Option<&SwapQueueEntry> {
        self.store.swaps.get(id)
    }

    pub fn commit_of(
        &self,
        epoch: EpochNumber,
        node: OverwatchNodeId,
        subnet_id: SubnetId,
    ) -> Option<Hash> {
        self.store.overwatch.commit_of(epoch, node, subnet_id)
    }

    pub fn reveal_of(
        &self,
        epoch: EpochNumber,
        subnet_id: SubnetId,
        node: OverwatchNodeId,
    ) -> Option<u128> {
        self.store.overwatch.reveal_of(epoch, subnet_id, node)
    }

    pub fn total_stake(&self) -> Balance {
        self.store.stakes.total_stake()
    }

    pub fn subnet_stake(&self, subnet_id: SubnetId) -> Balance {
        self.store.stakes.subnet_total(subnet_id)
    }

    pub fn total_delegate_stake(&self) -> Balance {
        self.store.delegate.total_balance()
    }

    pub fn total_node_delegate_stake(&self) -> Balance {
        self.store.node_delegate.total_balance()
    }

    // =========================================================================
    // STATE ROOT & SNAPSHOTS
    // =========================================================================

    /// Merkle root over every ledger record. Free balances are not included.
    pub fn state_root(&self, block_number: BlockNumber) -> Result<StateRoot, bincode::Error> {
        let tree = StateMerkleTree::new(self.store.leaves()?);
        Ok(StateRoot::new(tree.root(), block_number))
    }

    /// Inclusion proof of an account's direct stake record
    /// `None` when the account holds no stake on the subnet
    pub fn prove_stake(
        &self,
        account: &AccountId,
        subnet_id: SubnetId,
    ) -> Result<Option<MerkleProof>, bincode::Error> {
        let balance = self.balance_of(account, subnet_id);
        if balance == 0 {
            return Ok(None);
        }
        let leaf = bincode::serialize(&StateLeaf::Stake(account, subnet_id, balance))?;

        let tree = StateMerkleTree::new(self.store.leaves()?);
        Ok(tree
            .position(&leaf)
            .and_then(|index| tree.generate_proof(index)))
    }
}

impl<R: Runtime + Serialize> LedgerState<R> {
    /// Écrit un snapshot bincode (ledger + runtime)
    pub fn save_snapshot(
        &self,
        path: impl AsRef<Path>,
        block_number: BlockNumber,
    ) -> Result<(), SnapshotError> {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            block_number,
            store: &self.store,
            runtime: &self.runtime,
        };
        let bytes = bincode::serialize(&snapshot)?;
        std::fs::write(path.as_ref(), bytes)?;

        info!("Snapshot saved at block {} to {}", block_number, path.as_ref().display());
        Ok(())
    }
}

impl<R: Runtime + DeserializeOwned> LedgerState<R> {
    /// Charge un snapshot; returns the state and the block it was taken at
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<(Self, BlockNumber), SnapshotError> {
        let bytes = std::fs::read(path.as_ref())?;
        let snapshot: Snapshot<R> = bincode::deserialize(&bytes)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::Version {
                found: snapshot.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        Ok((
            Self::from_parts(snapshot.store, snapshot.runtime),
            snapshot.block_number,
        ))
    }
}
