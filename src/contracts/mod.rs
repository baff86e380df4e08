// Contracts - Composants du ledger de stake
// Principe: chaque composant valide avant d'écrire, aucun effet partiel

pub mod math;
pub mod stake;
pub mod delegate_pool;
pub mod node_delegate_pool;
pub mod unbonding;
pub mod swap_queue;
pub mod overwatch;

pub use delegate_pool::{DelegatePool, PoolKey, PoolState, SharePool};
pub use node_delegate_pool::{NodeDelegatePool, NodeKey};
pub use overwatch::{commit_hash, OverwatchCommit, OverwatchEngine, OverwatchReveal};
pub use stake::StakeLedger;
pub use swap_queue::{SwapCallType, SwapQueue, SwapQueueEntry, SwapTarget};
pub use unbonding::{UnbondingEntry, UnbondingLedger, DEFAULT_MAX_UNBONDINGS};
