// Error - Taxonomie des rejets du ledger
//
// Every variant is detected before any state write. A rejected operation
// leaves the ledger exactly as it found it.

use super::primitives::{Balance, BlockNumber, EpochNumber, SubnetId, SubnetNodeId, SwapId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LedgerError {
    #[error("amount is zero or exceeds the available balance")]
    InsufficientAmount,

    #[error("share amount is zero or exceeds the account holding")]
    InsufficientShares,

    #[error("resulting stake {balance} is below the subnet minimum {min}")]
    BelowMinStake { balance: Balance, min: Balance },

    #[error("resulting stake {balance} is above the subnet maximum {max}")]
    AboveMaxStake { balance: Balance, max: Balance },

    #[error("subnet {0} is not active")]
    SubnetNotActive(SubnetId),

    #[error("subnet node {subnet_node_id} is not active in subnet {subnet_id}")]
    SubnetNodeNotActive {
        subnet_id: SubnetId,
        subnet_node_id: SubnetNodeId,
    },

    #[error("unbonding ledger is full ({capacity} entries, none claimable)")]
    LedgerFull { capacity: usize },

    #[error("swap {id} is locked since block {execute_after}")]
    QueueLocked { id: SwapId, execute_after: BlockNumber },

    #[error("swap {id} matures at block {execute_after}")]
    NotMatured { id: SwapId, execute_after: BlockNumber },

    #[error("swap {0} not found")]
    SwapNotFound(SwapId),

    #[error("unknown swap call type {0}")]
    InvalidCallType(u8),

    #[error("no commit for subnet {subnet_id} in overwatch epoch {epoch}")]
    NoCommit { epoch: EpochNumber, subnet_id: SubnetId },

    #[error("revealed weight does not match the commit")]
    HashMismatch,

    #[error("operation is outside its overwatch window")]
    OutOfWindow,

    #[error("weight {0} exceeds 100%")]
    InvalidWeight(u128),

    #[error("caller is not authorized")]
    Unauthorized,

    #[error("free balance is insufficient")]
    InsufficientBalance,

    #[error("amount {amount} is below the minimum delegate deposit {min}")]
    BelowMinDelegateDeposit { amount: Balance, min: Balance },

    #[error("amount converts to zero shares at the current price")]
    ZeroShares,

    #[error("arithmetic overflow")]
    Overflow,

    #[error("transaction could not be encoded")]
    Encoding,
}

impl LedgerError {
    /// Stable short name, as reported to the calling layer
    pub fn kind(&self) -> &'static str {
        match self {
            LedgerError::InsufficientAmount => "InsufficientAmount",
            LedgerError::InsufficientShares => "InsufficientShares",
            LedgerError::BelowMinStake { .. } => "BelowMinStake",
            LedgerError::AboveMaxStake { .. } => "AboveMaxStake",
            LedgerError::SubnetNotActive(_) => "SubnetNotActive",
            LedgerError::SubnetNodeNotActive { .. } => "SubnetNodeNotActive",
            LedgerError::LedgerFull { .. } => "LedgerFull",
            LedgerError::QueueLocked { .. } => "QueueLocked",
            LedgerError::NotMatured { .. } => "NotMatured",
            LedgerError::SwapNotFound(_) => "SwapNotFound",
            LedgerError::InvalidCallType(_) => "InvalidCallType",
            LedgerError::NoCommit { .. } => "NoCommit",
            LedgerError::HashMismatch => "HashMismatch",
            LedgerError::OutOfWindow => "OutOfWindow",
            LedgerError::InvalidWeight(_) => "InvalidWeight",
            LedgerError::Unauthorized => "Unauthorized",
            LedgerError::InsufficientBalance => "InsufficientBalance",
            LedgerError::BelowMinDelegateDeposit { .. } => "BelowMinDelegateDeposit",
            LedgerError::ZeroShares => "ZeroShares",
            LedgerError::Overflow => "Overflow",
            LedgerError::Encoding => "Encoding",
        }
    }
}

impl From<super::account::AccountError> for LedgerError {
    fn from(err: super::account::AccountError) -> Self {
        match err {
            super::account::AccountError::InsufficientBalance => LedgerError::InsufficientBalance,
        }
    }
}
