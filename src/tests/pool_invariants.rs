// Pool Invariants - Property tests over random operation sequences
//
// Checked after every step:
//   sum(holder shares) == total_shares
//   balance_of == floor(shares * total_balance / total_shares)
//   free + pending unbonding + pooled balance is conserved (no rewards)

#[cfg(test)]
mod invariant_tests {
    use crate::contracts::math::mul_div_floor;
    use crate::contracts::DelegatePool;
    use crate::genesis::{dev_account, GenesisBuilder, GenesisSpec, LedgerConfig};
    use crate::runtime::{Currency, MemoryRuntime};
    use crate::storage::LedgerState;
    use crate::types::{AccountId, LedgerError, TOKEN};
    use proptest::prelude::*;

    const POOL: u32 = 1;

    #[derive(Debug, Clone)]
    enum PoolOp {
        Deposit(u8, u128),
        /// Percent of the holding
        Withdraw(u8, u8),
        Reward(u128),
    }

    fn pool_op() -> impl Strategy<Value = PoolOp> {
        prop_oneof![
            (0u8..3, 1u128..1_000_000 * TOKEN).prop_map(|(a, x)| PoolOp::Deposit(a, x)),
            (0u8..3, 1u8..=100).prop_map(|(a, p)| PoolOp::Withdraw(a, p)),
            (1u128..1_000 * TOKEN).prop_map(PoolOp::Reward),
        ]
    }

    fn holder(index: u8) -> AccountId {
        dev_account(index + 1)
    }

    fn assert_pool_invariants(pool: &DelegatePool) {
        let state = pool.pool(POOL);
        let holders = pool.holders(POOL);

        let sum: u128 = holders.iter().map(|(_, shares)| *shares).sum();
        assert_eq!(sum, state.total_shares);

        let mut redeemable = 0u128;
        for (account, shares) in holders {
            let expected =
                mul_div_floor(shares, state.total_balance, state.total_shares).unwrap_or(0);
            assert_eq!(pool.balance_of(&account, POOL), expected);
            redeemable += expected;
        }
        assert!(redeemable <= state.total_balance);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_share_accounting_holds(ops in prop::collection::vec(pool_op(), 1..40)) {
            let mut pool = DelegatePool::new();

            for op in ops {
                match op {
                    PoolOp::Deposit(a, amount) => {
                        let before = pool.pool(POOL);
                        match pool.deposit(&holder(a), POOL, amount, 0) {
                            Ok(shares) => prop_assert!(shares > 0),
                            Err(LedgerError::ZeroShares) => prop_assert_eq!(pool.pool(POOL), before),
                            Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                        }
                    }
                    PoolOp::Withdraw(a, percent) => {
                        let held = pool.shares_of(&holder(a), POOL);
                        let shares = held * percent as u128 / 100;
                        if shares == 0 {
                            prop_assert_eq!(
                                pool.withdraw(&holder(a), POOL, shares),
                                Err(LedgerError::InsufficientShares)
                            );
                        } else {
                            let worth = pool.balance_of(&holder(a), POOL);
                            let amount = pool.withdraw(&holder(a), POOL, shares).unwrap();
                            prop_assert!(amount <= worth);
                        }
                    }
                    PoolOp::Reward(amount) => {
                        let before = pool.pool(POOL);
                        match pool.distribute(POOL, amount) {
                            Ok(()) => prop_assert!(before.total_shares > 0),
                            Err(LedgerError::InsufficientShares) => {
                                prop_assert_eq!(before.total_shares, 0);
                                prop_assert_eq!(pool.pool(POOL), before);
                            }
                            Err(e) => prop_assert!(false, "unexpected error {:?}", e),
                        }
                    }
                }
                assert_pool_invariants(&pool);
            }
        }

        #[test]
        fn prop_value_is_conserved(
            steps in prop::collection::vec((0u8..3, 1_000u128..500 * TOKEN, any::<bool>()), 1..30)
        ) {
            let mut state: LedgerState<MemoryRuntime> =
                GenesisBuilder::new(LedgerConfig::default(), GenesisSpec::dev())
                    .build()
                    .unwrap();
            let accounts: Vec<AccountId> = (0..3).map(holder).collect();

            let total = |state: &LedgerState<MemoryRuntime>| -> u128 {
                let held: u128 = accounts
                    .iter()
                    .map(|a| {
                        state.runtime().free_balance(a)
                            + state.store().unbonding.total_pending(a)
                    })
                    .sum();
                held + state.total_delegate_stake()
            };
            let initial = total(&state);

            for (block, (a, amount, withdraw)) in steps.into_iter().enumerate() {
                let block = block as u64 * 25;
                let account = holder(a);

                if withdraw {
                    let shares = state.delegate_shares_of(&account, POOL);
                    let _ = state.remove_delegate_stake(&account, POOL, shares / 2, block);
                } else {
                    let _ = state.add_delegate_stake(&account, POOL, amount);
                }
                state.claim_unbondings(&account, block);

                prop_assert_eq!(total(&state), initial);
            }
        }
    }
}
