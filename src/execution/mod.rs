// Execution - Machine à états déterministe
// Principe: une transaction à la fois, dans l'ordre de soumission du bloc

pub mod dispatch;

pub use dispatch::{CallOutput, Dispatcher, ExecutionResult, SwapResult};
