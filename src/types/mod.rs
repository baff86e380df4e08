// Types fondamentaux du ledger
// Principe: Minimal, auditable, déterministe

pub mod primitives;
pub mod account;
pub mod error;
pub mod transaction;
pub mod merkle;

pub use primitives::*;
pub use account::*;
pub use error::*;
pub use transaction::*;
pub use merkle::*;
