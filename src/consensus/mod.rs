// Consensus - Horloge d'epoch pour les overwatch nodes
pub mod epoch;

pub use epoch::{OverwatchPhase, OverwatchSchedule};
