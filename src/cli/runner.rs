// Runner - Rejoue un scénario JSON de transactions sur un état genesis
use crate::execution::{Dispatcher, ExecutionResult};
use crate::runtime::Runtime;
use crate::storage::state::LedgerState;
use crate::types::{BlockNumber, LedgerCall, Origin, StateRoot, Transaction};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Expected outcome marker for a step that must succeed
pub const EXPECT_OK: &str = "ok";

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid scenario: {0}")]
    Json(#[from] serde_json::Error),

    #[error("state encoding failed: {0}")]
    Codec(#[from] bincode::Error),

    #[error("step {index} at block {block} precedes block {previous}")]
    BlockOrder {
        index: usize,
        block: BlockNumber,
        previous: BlockNumber,
    },
}

/// Une étape du scénario
///
/// Not a flattened `Transaction`: flattening buffers values and u128 amounts
/// do not survive serde's buffering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub block: BlockNumber,
    pub origin: Origin,
    pub call: LedgerCall,

    /// `"ok"` or an error kind such as `"HashMismatch"`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expect: Option<String>,
}

impl ScenarioStep {
    pub fn transaction(&self) -> Transaction {
        Transaction {
            origin: self.origin,
            call: self.call.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scenario {
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RunnerError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Rapport de replay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub results: Vec<ExecutionResult>,

    /// Steps whose outcome differs from their `expect`
    pub mismatches: Vec<String>,

    pub state_root: StateRoot,
}

impl ReplayReport {
    pub fn applied(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }

    pub fn rejected(&self) -> usize {
        self.results.len() - self.applied()
    }
}

fn outcome_kind(result: &ExecutionResult) -> &'static str {
    match &result.error {
        None => EXPECT_OK,
        Some(error) => error.kind(),
    }
}

/// Applies every step in order. Blocks must be non-decreasing.
pub fn replay<R: Runtime>(
    state: &mut LedgerState<R>,
    scenario: &Scenario,
) -> Result<ReplayReport, RunnerError> {
    let mut results = Vec::with_capacity(scenario.steps.len());
    let mut mismatches = Vec::new();
    let mut last_block: BlockNumber = 0;

    for (index, step) in scenario.steps.iter().enumerate() {
        if step.block < last_block {
            return Err(RunnerError::BlockOrder {
                index,
                block: step.block,
                previous: last_block,
            });
        }
        last_block = step.block;

        let result = Dispatcher::apply(state, &step.transaction(), step.block);
        let kind = outcome_kind(&result);

        match &result.error {
            None => info!("#{} block {} {} ✓", index, step.block, result.call),
            Some(error) => info!("#{} block {} {} ✗ {}", index, step.block, result.call, error),
        }

        if let Some(expected) = &step.expect {
            if expected != kind {
                let mismatch = format!(
                    "step {} ({} at block {}): expected {}, got {}",
                    index, result.call, step.block, expected, kind
                );
                warn!("{}", mismatch);
                mismatches.push(mismatch);
            }
        }

        results.push(result);
    }

    let state_root = state.state_root(last_block)?;
    info!(
        "Replay done: {} steps, state root {} at block {}",
        results.len(),
        state_root.root,
        last_block
    );

    Ok(ReplayReport {
        results,
        mismatches,
        state_root,
    })
}
