// Math - Share price conversions in widened integer arithmetic
//
// All conversions floor. Rounding dust stays in the pool: a depositor never
// receives more shares than the amount buys, and a withdrawer never receives
// more balance than the shares are worth.

use crate::types::{Balance, LedgerError, Shares, PERCENTAGE_FACTOR};
use primitive_types::U256;

/// `floor(x * y / z)` computed in 256 bits. `None` when `z == 0` or the
/// quotient does not fit back into a u128.
pub fn mul_div_floor(x: u128, y: u128, z: u128) -> Option<u128> {
    if z == 0 {
        return None;
    }
    let result = U256::from(x) * U256::from(y) / U256::from(z);
    if result > U256::from(u128::MAX) {
        return None;
    }
    Some(result.as_u128())
}

/// Shares minted for `amount` against a pool of `total_shares` / `total_balance`.
///
/// An empty pool (no shares) bootstraps at 1:1. A pool holding shares but no
/// balance cannot price a deposit and also falls back to 1:1.
pub fn convert_to_shares(
    amount: Balance,
    total_shares: Shares,
    total_balance: Balance,
) -> Result<Shares, LedgerError> {
    if total_shares == 0 || total_balance == 0 {
        return Ok(amount);
    }
    mul_div_floor(amount, total_shares, total_balance).ok_or(LedgerError::Overflow)
}

/// Balance redeemed by `shares`
pub fn convert_to_balance(
    shares: Shares,
    total_shares: Shares,
    total_balance: Balance,
) -> Result<Balance, LedgerError> {
    if total_shares == 0 {
        return Ok(0);
    }
    mul_div_floor(shares, total_balance, total_shares).ok_or(LedgerError::Overflow)
}

/// `x * y / 1e18`, floored. `y` is a fixed-point percentage.
pub fn percent_mul(x: u128, y: u128) -> u128 {
    mul_div_floor(x, y, PERCENTAGE_FACTOR).unwrap_or(u128::MAX)
}
