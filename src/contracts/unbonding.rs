// Unbonding - File de retraits verrouillés dans le temps
use crate::types::{AccountId, Balance, BlockNumber, LedgerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default per-account capacity
pub const DEFAULT_MAX_UNBONDINGS: usize = 32;

/// Montant en attente de déblocage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingEntry {
    pub amount: Balance,
    pub unlock_block: BlockNumber,
}

impl UnbondingEntry {
    pub fn is_matured(&self, current_block: BlockNumber) -> bool {
        self.unlock_block <= current_block
    }
}

/// Per-account unbonding queues, each holding at most `capacity` entries.
///
/// Entries for the same unlock block are merged. When an account is at
/// capacity, matured entries are released to make room; only a queue that is
/// full of unmatured entries rejects with `LedgerFull`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbondingLedger {
    entries: BTreeMap<AccountId, Vec<UnbondingEntry>>,
    capacity: usize,
}

impl Default for UnbondingLedger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNBONDINGS)
    }
}

impl UnbondingLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries in enqueue order
    pub fn pending(&self, account: &AccountId) -> &[UnbondingEntry] {
        self.entries
            .get(account)
            .map(|list| list.as_slice())
            .unwrap_or(&[])
    }

    /// Sum of entries claimable at `current_block`
    pub fn claimable(&self, account: &AccountId, current_block: BlockNumber) -> Balance {
        self.pending(account)
            .iter()
            .filter(|entry| entry.is_matured(current_block))
            .fold(0, |acc: Balance, entry| acc.saturating_add(entry.amount))
    }

    pub fn total_pending(&self, account: &AccountId) -> Balance {
        self.pending(account)
            .iter()
            .fold(0, |acc: Balance, entry| acc.saturating_add(entry.amount))
    }

    pub fn check_enqueue(
        &self,
        account: &AccountId,
        amount: Balance,
        unlock_block: BlockNumber,
        current_block: BlockNumber,
    ) -> Result<(), LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InsufficientAmount);
        }

        let list = self.pending(account);

        if let Some(existing) = list.iter().find(|e| e.unlock_block == unlock_block) {
            existing
                .amount
                .checked_add(amount)
                .ok_or(LedgerError::Overflow)?;
            return Ok(());
        }

        if list.len() < self.capacity {
            return Ok(());
        }

        if list.iter().any(|e| e.is_matured(current_block)) {
            return Ok(());
        }

        Err(LedgerError::LedgerFull {
            capacity: self.capacity,
        })
    }

    /// Appends an entry. Returns the matured balance released to make room,
    /// which the caller must credit to the account's free balance.
    pub fn enqueue(
        &mut self,
        account: &AccountId,
        amount: Balance,
        unlock_block: BlockNumber,
        current_block: BlockNumber,
    ) -> Result<Balance, LedgerError> {
        self.check_enqueue(account, amount, unlock_block, current_block)?;

        let capacity = self.capacity;
        let list = self.entries.entry(*account).or_default();

        if let Some(existing) = list.iter_mut().find(|e| e.unlock_block == unlock_block) {
            existing.amount += amount;
            return Ok(0);
        }

        let mut released: Balance = 0;
        if list.len() >= capacity {
            list.retain(|entry| {
                if entry.is_matured(current_block) {
                    released = released.saturating_add(entry.amount);
                    false
                } else {
                    true
                }
            });
        }

        list.push(UnbondingEntry {
            amount,
            unlock_block,
        });

        Ok(released)
    }

    /// Removes every matured entry and returns their sum. Returns 0 when
    /// nothing has matured; that is not an error.
    pub fn claim(&mut self, account: &AccountId, current_block: BlockNumber) -> Balance {
        let Some(list) = self.entries.get_mut(account) else {
            return 0;
        };

        let mut claimed: Balance = 0;
        list.retain(|entry| {
            if entry.is_matured(current_block) {
                claimed = claimed.saturating_add(entry.amount);
                false
            } else {
                true
            }
        });

        if list.is_empty() {
            self.entries.remove(account);
        }

        claimed
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&AccountId, &Vec<UnbondingEntry>)> {
        self.entries.iter()
    }
}
