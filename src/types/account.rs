// Account - Identifiants de comptes et balance libre
use super::primitives::{parse_hex_32, Balance, ParseHexError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// AccountId = 32 bytes opaques
/// Le format d'adresse (ss58, h160, ...) est résolu hors du ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountId([u8; 32]);

impl AccountId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "0x{}", hex::encode(&self.0[..8]))
    }
}

impl From<[u8; 32]> for AccountId {
    fn from(bytes: [u8; 32]) -> Self {
        AccountId(bytes)
    }
}

impl FromStr for AccountId {
    type Err = ParseHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex_32(s).map(AccountId)
    }
}

impl TryFrom<String> for AccountId {
    type Error = ParseHexError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AccountId> for String {
    fn from(id: AccountId) -> Self {
        id.to_hex()
    }
}

/// Balance libre d'un compte, tenue par la runtime (hors du ledger)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    /// Balance libre
    pub free: Balance,
}

impl AccountInfo {
    pub fn new(free: Balance) -> Self {
        Self { free }
    }

    /// Peut débiter ce montant?
    pub fn can_debit(&self, amount: Balance) -> bool {
        self.free >= amount
    }

    pub fn debit(&mut self, amount: Balance) -> Result<(), AccountError> {
        if !self.can_debit(amount) {
            return Err(AccountError::InsufficientBalance);
        }
        self.free -= amount;
        Ok(())
    }

    pub fn credit(&mut self, amount: Balance) {
        self.free = self.free.saturating_add(amount);
    }
}

/// Erreurs de compte
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccountError {
    #[error("Balance insuffisante")]
    InsufficientBalance,
}
