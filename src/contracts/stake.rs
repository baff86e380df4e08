// Stake - Stake direct par (compte, subnet), borné par [min_stake, max_stake]
use crate::genesis::SubnetParams;
use crate::types::{AccountId, Balance, LedgerError, SubnetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Registre de stake direct
///
/// A stored balance is never zero: an entry is removed when it reaches zero,
/// and every other value lies within the subnet bounds at the time it was written.
///
/// `check_*` methods only read; the mutating methods run the same check first
/// so a rejected call never touches the maps. `LedgerState` relies on the
/// split to validate every component before writing to any of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeLedger {
    stakes: BTreeMap<(AccountId, SubnetId), Balance>,

    subnet_totals: BTreeMap<SubnetId, Balance>,

    total_stake: Balance,
}

impl StakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &AccountId, subnet_id: SubnetId) -> Balance {
        self.stakes
            .get(&(*account, subnet_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn subnet_total(&self, subnet_id: SubnetId) -> Balance {
        self.subnet_totals.get(&subnet_id).copied().unwrap_or(0)
    }

    pub fn total_stake(&self) -> Balance {
        self.total_stake
    }

    /// Validates an addition and returns the resulting balance
    pub fn check_add(
        &self,
        account: &AccountId,
        subnet_id: SubnetId,
        amount: Balance,
        params: &SubnetParams,
    ) -> Result<Balance, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InsufficientAmount);
        }

        let balance = self
            .balance_of(account, subnet_id)
            .checked_add(amount)
            .ok_or(LedgerError::Overflow)?;

        if balance < params.min_stake {
            return Err(LedgerError::BelowMinStake {
                balance,
                min: params.min_stake,
            });
        }
        if balance > params.max_stake {
            return Err(LedgerError::AboveMaxStake {
                balance,
                max: params.max_stake,
            });
        }

        Ok(balance)
    }

    pub fn add_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        amount: Balance,
        params: &SubnetParams,
    ) -> Result<Balance, LedgerError> {
        let balance = self.check_add(account, subnet_id, amount, params)?;

        self.stakes.insert((*account, subnet_id), balance);
        *self.subnet_totals.entry(subnet_id).or_insert(0) += amount;
        self.total_stake = self.total_stake.saturating_add(amount);

        Ok(balance)
    }

    /// Validates a removal and returns the remaining balance.
    /// A partial removal may not leave dust below the subnet minimum.
    pub fn check_remove(
        &self,
        account: &AccountId,
        subnet_id: SubnetId,
        amount: Balance,
        params: &SubnetParams,
    ) -> Result<Balance, LedgerError> {
        let balance = self.balance_of(account, subnet_id);
        if amount == 0 || amount > balance {
            return Err(LedgerError::InsufficientAmount);
        }

        let remaining = balance - amount;
        if remaining != 0 && remaining < params.min_stake {
            return Err(LedgerError::BelowMinStake {
                balance: remaining,
                min: params.min_stake,
            });
        }

        Ok(remaining)
    }

    /// Removes stake. The caller routes the withdrawn amount to unbonding.
    pub fn remove_stake(
        &mut self,
        account: &AccountId,
        subnet_id: SubnetId,
        amount: Balance,
        params: &SubnetParams,
    ) -> Result<Balance, LedgerError> {
        let remaining = self.check_remove(account, subnet_id, amount, params)?;

        if remaining == 0 {
            self.stakes.remove(&(*account, subnet_id));
        } else {
            self.stakes.insert((*account, subnet_id), remaining);
        }

        if let Some(total) = self.subnet_totals.get_mut(&subnet_id) {
            *total = total.saturating_sub(amount);
            if *total == 0 {
                self.subnet_totals.remove(&subnet_id);
            }
        }
        self.total_stake = self.total_stake.saturating_sub(amount);

        Ok(remaining)
    }

    /// Every stake entry in key order
    pub fn entries(&self) -> impl Iterator<Item = (&(AccountId, SubnetId), &Balance)> {
        self.stakes.iter()
    }
}
