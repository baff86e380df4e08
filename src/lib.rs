// Stake Ledger - Comptabilité de stake, délégation à parts et poids overwatch
// Principe: déterministe, atomique, piloté par la hauteur de bloc

pub mod cli;
pub mod consensus;
pub mod contracts;
pub mod execution;
pub mod genesis;
pub mod runtime;
pub mod storage;
pub mod types;

#[cfg(test)]
mod tests;

pub use execution::{Dispatcher, ExecutionResult};
pub use genesis::{GenesisBuilder, GenesisSpec, LedgerConfig};
pub use runtime::{Currency, MemoryRuntime, Runtime, SubnetRegistry};
pub use storage::{LedgerState, PoolId, SwapOutcome};
pub use types::{AccountId, LedgerCall, LedgerError, Transaction};
