// Primitives - Types fondamentaux du ledger
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Hash universel (Blake3)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Hash([u8; 32]);

impl Hash {
    pub const ZERO: Hash = Hash([0u8; 32]);

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Hash des données avec Blake3
    pub fn hash(data: &[u8]) -> Self {
        Hash(hash256(data))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

/// `hash256(bytes) -> [u8; 32]` used for commitments, transaction ids and state roots
pub fn hash256(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 32]> for Hash {
    fn from(bytes: [u8; 32]) -> Self {
        Hash(bytes)
    }
}

impl FromStr for Hash {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_32(s).map(Hash)
    }
}

impl TryFrom<String> for Hash {
    type Error = ParseHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Hash> for String {
    fn from(hash: Hash) -> Self {
        hash.to_hex()
    }
}

/// Parses a 32-byte value written as 64 hex characters, with or without `0x`
pub(crate) fn parse_hex_32(s: &str) -> Result<[u8; 32], ParseHexError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| ParseHexError::Invalid(e.to_string()))?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| ParseHexError::WrongLength(len))
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseHexError {
    #[error("invalid hex: {0}")]
    Invalid(String),

    #[error("expected 32 bytes, got {0}")]
    WrongLength(usize),
}

/// Numéro de bloc
pub type BlockNumber = u64;

/// Balance (u128, 18 decimals)
pub type Balance = u128;

/// Pool shares share the balance width so conversions never truncate
pub type Shares = u128;

/// Identifiant de subnet, assigné par le registre externe
pub type SubnetId = u32;

/// Identifiant de noeud dans un subnet
pub type SubnetNodeId = u32;

/// Identifiant de noeud overwatch
pub type OverwatchNodeId = u32;

/// Numéro d'epoch overwatch
pub type EpochNumber = u64;

/// Identifiant d'une entrée de la swap queue
pub type SwapId = u64;

/// Constantes monétaires
pub const TOKEN: Balance = 1_000_000_000_000_000_000; // 10^18
pub const MILLITOKEN: Balance = 1_000_000_000_000_000; // 10^15

/// 100% in fixed point, used by cutoff percentages and overwatch weights
pub const PERCENTAGE_FACTOR: u128 = 1_000_000_000_000_000_000;
