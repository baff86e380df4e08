// Storage - État du ledger, state root et snapshots bincode
pub mod state;

pub use state::*;
