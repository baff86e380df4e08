// Delegate Pool - Pools de délégation à parts (shares)
//
// Depositors receive shares of a pool. Rewards raise the pool balance without
// minting shares, so each share redeems for more over time.
//
// Invariants, for every pool key:
//   sum(shares over accounts) == total_shares
//   balance_of(account) == shares * total_balance / total_shares   (floor)

use super::math::{convert_to_balance, convert_to_shares};
use crate::types::{AccountId, Balance, LedgerError, Shares, SubnetId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Key identifying one pool: a subnet, or a (subnet, node) pair
pub trait PoolKey: Copy + Ord + fmt::Debug + fmt::Display + Serialize + DeserializeOwned {}

impl PoolKey for SubnetId {}

/// Totaux d'un pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    pub total_shares: Shares,
    pub total_balance: Balance,
}

impl PoolState {
    pub fn is_empty(&self) -> bool {
        self.total_shares == 0 && self.total_balance == 0
    }
}

/// Pool à parts générique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(bound(serialize = "K: PoolKey", deserialize = "K: PoolKey"))]
pub struct SharePool<K: PoolKey> {
    pools: BTreeMap<K, PoolState>,

    shares: BTreeMap<(AccountId, K), Shares>,

    /// Sum of `total_balance` over every pool
    total_balance: Balance,
}

/// Subnet-scoped delegate stake
pub type DelegatePool = SharePool<SubnetId>;

impl<K: PoolKey> Default for SharePool<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: PoolKey> SharePool<K> {
    pub fn new() -> Self {
        Self {
            pools: BTreeMap::new(),
            shares: BTreeMap::new(),
            total_balance: 0,
        }
    }

    pub fn pool(&self, key: K) -> PoolState {
        self.pools.get(&key).copied().unwrap_or_default()
    }

    pub fn shares_of(&self, account: &AccountId, key: K) -> Shares {
        self.shares.get(&(*account, key)).copied().unwrap_or(0)
    }

    /// Current redeemable balance of an account's shares
    pub fn balance_of(&self, account: &AccountId, key: K) -> Balance {
        let shares = self.shares_of(account, key);
        if shares == 0 {
            return 0;
        }
        let pool = self.pool(key);
        convert_to_balance(shares, pool.total_shares, pool.total_balance).unwrap_or(0)
    }

    pub fn total_balance(&self) -> Balance {
        self.total_balance
    }

    /// Shares a deposit of `amount` would mint
    pub fn quote_deposit(
        &self,
        key: K,
        amount: Balance,
        min_deposit: Balance,
    ) -> Result<Shares, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InsufficientAmount);
        }
        if amount < min_deposit {
            return Err(LedgerError::BelowMinDelegateDeposit {
                amount,
                min: min_deposit,
            });
        }

        let pool = self.pool(key);
        let shares = convert_to_shares(amount, pool.total_shares, pool.total_balance)?;

        // Rounding to zero would hand the deposit to existing holders
        if shares == 0 {
            return Err(LedgerError::ZeroShares);
        }

        pool.total_shares
            .checked_add(shares)
            .and(pool.total_balance.checked_add(amount))
            .and(self.total_balance.checked_add(amount))
            .ok_or(LedgerError::Overflow)?;

        Ok(shares)
    }

    pub fn deposit(
        &mut self,
        account: &AccountId,
        key: K,
        amount: Balance,
        min_deposit: Balance,
    ) -> Result<Shares, LedgerError> {
        let shares = self.quote_deposit(key, amount, min_deposit)?;

        let pool = self.pools.entry(key).or_default();
        pool.total_shares += shares;
        pool.total_balance += amount;
        self.total_balance += amount;
        *self.shares.entry((*account, key)).or_insert(0) += shares;

        Ok(shares)
    }

    /// Balance `shares` would redeem for
    pub fn quote_withdraw(
        &self,
        account: &AccountId,
        key: K,
        shares: Shares,
    ) -> Result<Balance, LedgerError> {
        if shares == 0 || shares > self.shares_of(account, key) {
            return Err(LedgerError::InsufficientShares);
        }
        let pool = self.pool(key);
        convert_to_balance(shares, pool.total_shares, pool.total_balance)
    }

    /// Burns shares and takes their balance out of the pool.
    /// The caller decides where the returned balance goes (unbonding or swap queue).
    pub fn withdraw(
        &mut self,
        account: &AccountId,
        key: K,
        shares: Shares,
    ) -> Result<Balance, LedgerError> {
        let amount = self.quote_withdraw(account, key, shares)?;

        self.burn_shares(account, key, shares);
        if let Some(pool) = self.pools.get_mut(&key) {
            pool.total_shares -= shares;
            pool.total_balance -= amount;
            if pool.is_empty() {
                self.pools.remove(&key);
            }
        }
        self.total_balance -= amount;

        Ok(amount)
    }

    /// Validates a share transfer. The transferred value must still clear the
    /// minimum deposit so transfers cannot be used to split positions into dust.
    pub fn check_transfer(
        &self,
        from: &AccountId,
        key: K,
        shares: Shares,
        min_deposit: Balance,
    ) -> Result<(), LedgerError> {
        let value = self.quote_withdraw(from, key, shares)?;
        if value < min_deposit {
            return Err(LedgerError::BelowMinDelegateDeposit {
                amount: value,
                min: min_deposit,
            });
        }
        Ok(())
    }

    /// Moves shares between accounts. Pool totals and share price are unchanged.
    pub fn transfer(
        &mut self,
        from: &AccountId,
        key: K,
        to: &AccountId,
        shares: Shares,
        min_deposit: Balance,
    ) -> Result<(), LedgerError> {
        self.check_transfer(from, key, shares, min_deposit)?;

        self.burn_shares(from, key, shares);
        *self.shares.entry((*to, key)).or_insert(0) += shares;

        Ok(())
    }

    /// Adds rewards to a pool without minting shares.
    /// A pool without holders refuses rewards: the next depositor would mint
    /// 1:1 and take them whole.
    pub fn distribute(&mut self, key: K, amount: Balance) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InsufficientAmount);
        }
        let pool = self.pool(key);
        if pool.total_shares == 0 {
            return Err(LedgerError::InsufficientShares);
        }
        pool.total_balance
            .checked_add(amount)
            .and(self.total_balance.checked_add(amount))
            .ok_or(LedgerError::Overflow)?;

        self.pools.entry(key).or_default().total_balance += amount;
        self.total_balance += amount;

        Ok(())
    }

    /// Holders of one pool with their shares
    pub fn holders(&self, key: K) -> Vec<(AccountId, Shares)> {
        self.shares
            .iter()
            .filter(|((_, k), _)| *k == key)
            .map(|((account, _), shares)| (*account, *shares))
            .collect()
    }

    pub fn pools(&self) -> impl Iterator<Item = (&K, &PoolState)> {
        self.pools.iter()
    }

    pub fn share_entries(&self) -> impl Iterator<Item = (&(AccountId, K), &Shares)> {
        self.shares.iter()
    }

    fn burn_shares(&mut self, account: &AccountId, key: K, shares: Shares) {
        let entry = (*account, key);
        if let Some(held) = self.shares.get_mut(&entry) {
            *held -= shares;
            if *held == 0 {
                self.shares.remove(&entry);
            }
        }
    }
}
