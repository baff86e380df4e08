// Overwatch - Commit/reveal des poids de subnet par les overwatch nodes
//
// Nodes commit hash256(encode(weight, salt)) while the commit window is open,
// then reveal (weight, salt) once it closes. A weight is only recorded when the
// reveal reproduces the committed hash for the same epoch, node and subnet.

use crate::consensus::epoch::{OverwatchPhase, OverwatchSchedule};
use crate::types::{
    BlockNumber, EpochNumber, Hash, LedgerError, OverwatchNodeId, SubnetId, PERCENTAGE_FACTOR,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commit d'un poids pour un subnet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverwatchCommit {
    pub subnet_id: SubnetId,
    pub hash: Hash,
}

/// Révélation d'un poids précédemment commité
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverwatchReveal {
    pub subnet_id: SubnetId,
    /// 1e18 = 100%
    pub weight: u128,
    pub salt: Vec<u8>,
}

impl OverwatchReveal {
    pub fn commit(&self) -> OverwatchCommit {
        OverwatchCommit {
            subnet_id: self.subnet_id,
            hash: commit_hash(self.weight, &self.salt),
        }
    }
}

/// hash256 of the canonical `(weight, salt)` encoding.
///
/// Produces the same bytes as bincode's default encoding of `(u128, &[u8])`:
/// the weight little-endian, then the salt prefixed by its u64 length.
pub fn commit_hash(weight: u128, salt: &[u8]) -> Hash {
    let mut preimage = Vec::with_capacity(16 + 8 + salt.len());
    preimage.extend_from_slice(&weight.to_le_bytes());
    preimage.extend_from_slice(&(salt.len() as u64).to_le_bytes());
    preimage.extend_from_slice(salt);
    Hash::hash(&preimage)
}

/// Moteur de pondération overwatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverwatchEngine {
    commits: BTreeMap<(EpochNumber, OverwatchNodeId, SubnetId), Hash>,

    reveals: BTreeMap<(EpochNumber, SubnetId, OverwatchNodeId), u128>,
}

impl OverwatchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commit_of(
        &self,
        epoch: EpochNumber,
        node: OverwatchNodeId,
        subnet_id: SubnetId,
    ) -> Option<Hash> {
        self.commits.get(&(epoch, node, subnet_id)).copied()
    }

    pub fn reveal_of(
        &self,
        epoch: EpochNumber,
        subnet_id: SubnetId,
        node: OverwatchNodeId,
    ) -> Option<u128> {
        self.reveals.get(&(epoch, subnet_id, node)).copied()
    }

    /// Revealed weights of one subnet for an epoch
    pub fn subnet_weights(
        &self,
        epoch: EpochNumber,
        subnet_id: SubnetId,
    ) -> Vec<(OverwatchNodeId, u128)> {
        self.reveals
            .range((epoch, subnet_id, OverwatchNodeId::MIN)..=(epoch, subnet_id, OverwatchNodeId::MAX))
            .map(|((_, _, node), weight)| (*node, *weight))
            .collect()
    }

    /// Validates a commit batch and returns the epoch it lands in
    pub fn check_commits(
        &self,
        schedule: &OverwatchSchedule,
        current_block: BlockNumber,
        commits: &[OverwatchCommit],
    ) -> Result<EpochNumber, LedgerError> {
        let (epoch, phase) = schedule.current(current_block);
        if phase != OverwatchPhase::CommitOpen {
            return Err(LedgerError::OutOfWindow);
        }
        if commits.is_empty() {
            return Err(LedgerError::InsufficientAmount);
        }
        Ok(epoch)
    }

    /// Stores every commit of the batch, overwriting earlier commits for the
    /// same (epoch, node, subnet)
    pub fn commit_many(
        &mut self,
        schedule: &OverwatchSchedule,
        current_block: BlockNumber,
        node: OverwatchNodeId,
        commits: &[OverwatchCommit],
    ) -> Result<EpochNumber, LedgerError> {
        let epoch = self.check_commits(schedule, current_block, commits)?;

        for commit in commits {
            self.commits.insert((epoch, node, commit.subnet_id), commit.hash);
        }

        Ok(epoch)
    }

    pub fn check_reveals(
        &self,
        schedule: &OverwatchSchedule,
        current_block: BlockNumber,
        node: OverwatchNodeId,
        reveals: &[OverwatchReveal],
    ) -> Result<EpochNumber, LedgerError> {
        let (epoch, phase) = schedule.current(current_block);
        if phase != OverwatchPhase::RevealOpen {
            return Err(LedgerError::OutOfWindow);
        }
        if reveals.is_empty() {
            return Err(LedgerError::InsufficientAmount);
        }

        for reveal in reveals {
            if reveal.weight > PERCENTAGE_FACTOR {
                return Err(LedgerError::InvalidWeight(reveal.weight));
            }
            let committed = self
                .commit_of(epoch, node, reveal.subnet_id)
                .ok_or(LedgerError::NoCommit {
                    epoch,
                    subnet_id: reveal.subnet_id,
                })?;
            if commit_hash(reveal.weight, &reveal.salt) != committed {
                return Err(LedgerError::HashMismatch);
            }
        }

        Ok(epoch)
    }

    /// Records every revealed weight, or none if any reveal fails
    pub fn reveal_many(
        &mut self,
        schedule: &OverwatchSchedule,
        current_block: BlockNumber,
        node: OverwatchNodeId,
        reveals: &[OverwatchReveal],
    ) -> Result<EpochNumber, LedgerError> {
        let epoch = self.check_reveals(schedule, current_block, node, reveals)?;

        for reveal in reveals {
            self.reveals
                .insert((epoch, reveal.subnet_id, node), reveal.weight);
        }

        Ok(epoch)
    }

    /// Drops commits and reveals of epochs before `before_epoch`.
    /// Returns the number of records removed.
    pub fn prune(&mut self, before_epoch: EpochNumber) -> usize {
        let commits_before = self.commits.len();
        let reveals_before = self.reveals.len();

        self.commits = self.commits.split_off(&(before_epoch, OverwatchNodeId::MIN, SubnetId::MIN));
        self.reveals = self.reveals.split_off(&(before_epoch, SubnetId::MIN, OverwatchNodeId::MIN));

        (commits_before - self.commits.len()) + (reveals_before - self.reveals.len())
    }

    pub fn commits(&self) -> impl Iterator<Item = (&(EpochNumber, OverwatchNodeId, SubnetId), &Hash)> {
        self.commits.iter()
    }

    pub fn reveals(&self) -> impl Iterator<Item = (&(EpochNumber, SubnetId, OverwatchNodeId), &u128)> {
        self.reveals.iter()
    }
}
