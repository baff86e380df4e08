// Epoch - Fenêtres commit/reveal des overwatch epochs
use crate::contracts::math::percent_mul;
use crate::types::{BlockNumber, EpochNumber};
use serde::{Deserialize, Serialize};

/// Phase d'une overwatch epoch, relative à un bloc donné
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OverwatchPhase {
    /// The block precedes the epoch
    NotStarted,
    CommitOpen,
    RevealOpen,
    /// The epoch is over
    Closed,
}

/// Overwatch epoch schedule
///
/// An overwatch epoch spans `epoch_length * multiplier` blocks. Commits are
/// accepted during the first `reveal_offset` blocks, reveals during the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverwatchSchedule {
    pub epoch_length: BlockNumber,
    pub multiplier: u64,
    /// 1e18 = 100%
    pub cutoff_percent: u128,
}

impl OverwatchSchedule {
    pub fn new(epoch_length: BlockNumber, multiplier: u64, cutoff_percent: u128) -> Self {
        Self {
            epoch_length,
            multiplier,
            cutoff_percent,
        }
    }

    /// Length in blocks, never zero
    pub fn overwatch_epoch_length(&self) -> BlockNumber {
        self.epoch_length.saturating_mul(self.multiplier).max(1)
    }

    pub fn epoch_of(&self, block: BlockNumber) -> EpochNumber {
        block / self.overwatch_epoch_length()
    }

    pub fn epoch_start(&self, epoch: EpochNumber) -> BlockNumber {
        epoch.saturating_mul(self.overwatch_epoch_length())
    }

    /// Blocks into the epoch at which reveals open
    pub fn reveal_offset(&self) -> BlockNumber {
        let length = self.overwatch_epoch_length();
        let offset = percent_mul(length as u128, self.cutoff_percent);
        offset.min(length as u128) as BlockNumber
    }

    pub fn phase_of(&self, epoch: EpochNumber, block: BlockNumber) -> OverwatchPhase {
        let start = self.epoch_start(epoch);
        let reveal_start = start.saturating_add(self.reveal_offset());
        let end = start.saturating_add(self.overwatch_epoch_length());

        if block < start {
            OverwatchPhase::NotStarted
        } else if block < reveal_start {
            OverwatchPhase::CommitOpen
        } else if block < end {
            OverwatchPhase::RevealOpen
        } else {
            OverwatchPhase::Closed
        }
    }

    /// Epoch containing `block` and its phase at that block
    pub fn current(&self, block: BlockNumber) -> (EpochNumber, OverwatchPhase) {
        let epoch = self.epoch_of(block);
        (epoch, self.phase_of(epoch, block))
    }
}
