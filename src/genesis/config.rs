// Configuration du ledger - paramètres réseau et bornes de subnet
use crate::consensus::epoch::OverwatchSchedule;
use crate::contracts::unbonding::DEFAULT_MAX_UNBONDINGS;
use crate::types::{Balance, BlockNumber, PERCENTAGE_FACTOR, TOKEN};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Blocs par epoch
pub const DEFAULT_EPOCH_LENGTH: BlockNumber = 100;

/// Epochs per overwatch epoch
pub const DEFAULT_OVERWATCH_EPOCH_MULTIPLIER: u64 = 10;

/// Commit window share of an overwatch epoch (50%)
pub const DEFAULT_OVERWATCH_CUTOFF_PERCENT: u128 = PERCENTAGE_FACTOR / 2;

/// Blocks a queued swap waits before it can execute
pub const DEFAULT_SWAP_DELAY: BlockNumber = 100;

pub const DEFAULT_MIN_DELEGATE_DEPOSIT: Balance = 1000;

pub const DEFAULT_OVERWATCH_RETENTION_EPOCHS: u64 = 4;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("epoch length must be non-zero")]
    ZeroEpochLength,

    #[error("overwatch epoch multiplier must be non-zero")]
    ZeroMultiplier,

    #[error("overwatch cutoff {0} must lie strictly between 0 and 1e18")]
    InvalidCutoff(u128),

    #[error("unbonding capacity must be non-zero")]
    ZeroUnbondingCapacity,

    #[error("min stake {min} exceeds max stake {max}")]
    InvalidStakeBounds { min: Balance, max: Balance },

    #[error("genesis: {0}")]
    Genesis(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Paramètres réseau, communs à tous les subnets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkParams {
    pub epoch_length: BlockNumber,

    pub overwatch_epoch_multiplier: u64,

    /// 1e18 = 100%
    pub overwatch_cutoff_percent: u128,

    pub swap_delay: BlockNumber,

    pub min_delegate_deposit: Balance,

    /// Per-account unbonding capacity
    pub max_unbondings: usize,

    /// Unbonding period for swaps whose target can no longer accept them
    pub fallback_unbonding_period: BlockNumber,

    /// Overwatch epochs kept before `prune` removes them
    pub overwatch_retention_epochs: u64,
}

impl NetworkParams {
    pub fn mainnet() -> Self {
        Self {
            epoch_length: DEFAULT_EPOCH_LENGTH,
            overwatch_epoch_multiplier: DEFAULT_OVERWATCH_EPOCH_MULTIPLIER,
            overwatch_cutoff_percent: DEFAULT_OVERWATCH_CUTOFF_PERCENT,
            swap_delay: DEFAULT_SWAP_DELAY,
            min_delegate_deposit: DEFAULT_MIN_DELEGATE_DEPOSIT,
            max_unbondings: DEFAULT_MAX_UNBONDINGS,
            fallback_unbonding_period: DEFAULT_EPOCH_LENGTH,
            overwatch_retention_epochs: DEFAULT_OVERWATCH_RETENTION_EPOCHS,
        }
    }

    pub fn overwatch_schedule(&self) -> OverwatchSchedule {
        OverwatchSchedule::new(
            self.epoch_length,
            self.overwatch_epoch_multiplier,
            self.overwatch_cutoff_percent,
        )
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.epoch_length == 0 {
            return Err(ConfigError::ZeroEpochLength);
        }
        if self.overwatch_epoch_multiplier == 0 {
            return Err(ConfigError::ZeroMultiplier);
        }
        if self.overwatch_cutoff_percent == 0 || self.overwatch_cutoff_percent >= PERCENTAGE_FACTOR {
            return Err(ConfigError::InvalidCutoff(self.overwatch_cutoff_percent));
        }
        if self.max_unbondings == 0 {
            return Err(ConfigError::ZeroUnbondingCapacity);
        }
        Ok(())
    }
}

impl Default for NetworkParams {
    fn default() -> Self {
        Self::mainnet()
    }
}

/// Bornes de stake d'un subnet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubnetParams {
    pub min_stake: Balance,
    pub max_stake: Balance,
    /// Blocks between a withdrawal and its claim
    pub unbonding_period: BlockNumber,
}

impl SubnetParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_stake > self.max_stake {
            return Err(ConfigError::InvalidStakeBounds {
                min: self.min_stake,
                max: self.max_stake,
            });
        }
        Ok(())
    }
}

impl Default for SubnetParams {
    fn default() -> Self {
        Self {
            min_stake: 100 * TOKEN,
            max_stake: 1_000_000 * TOKEN,
            unbonding_period: DEFAULT_EPOCH_LENGTH,
        }
    }
}

/// Configuration du ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub network: NetworkParams,

    /// Used by genesis subnets that do not set their own bounds
    #[serde(default)]
    pub subnet_defaults: SubnetParams,
}

impl LedgerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        self.subnet_defaults.validate()
    }

    /// Charge depuis un fichier JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Sauvegarde vers un fichier JSON
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
