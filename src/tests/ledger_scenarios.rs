// Ledger Scenarios - End-to-end flows through LedgerState
// Unbonding lifecycle, swap queue, overwatch commit-reveal, atomicity of rejects

#[cfg(test)]
mod scenario_tests {
    use crate::contracts::{OverwatchReveal, SwapTarget};
    use crate::genesis::{dev_account, GenesisBuilder, GenesisSpec, LedgerConfig};
    use crate::runtime::{Currency, MemoryRuntime, SubnetRegistry};
    use crate::storage::{LedgerState, PoolId, SwapOutcome};
    use crate::types::{AccountId, LedgerError, SwapId, PERCENTAGE_FACTOR, TOKEN};

    // ===== HELPER FUNCTIONS =====

    const GENESIS_FREE: u128 = 1_000_000 * TOKEN;

    fn accounts() -> (AccountId, AccountId, AccountId) {
        (dev_account(1), dev_account(2), dev_account(3))
    }

    fn dev_state() -> LedgerState<MemoryRuntime> {
        GenesisBuilder::new(LedgerConfig::default(), GenesisSpec::dev())
            .build()
            .unwrap()
    }

    fn state_with(config: LedgerConfig) -> LedgerState<MemoryRuntime> {
        GenesisBuilder::new(config, GenesisSpec::dev()).build().unwrap()
    }

    fn free(state: &LedgerState<MemoryRuntime>, account: &AccountId) -> u128 {
        state.runtime().free_balance(account)
    }

    fn queue_swap_to_subnet_2(state: &mut LedgerState<MemoryRuntime>, block: u64) -> SwapId {
        let (alice, _, _) = accounts();
        state.add_delegate_stake(&alice, 1, 100 * TOKEN).unwrap();
        let shares = state.delegate_shares_of(&alice, 1);
        state.swap_delegate_stake(&alice, 1, 2, shares, block).unwrap()
    }

    // ===== TEST 1: UNBONDING LIFECYCLE =====
    // deposit → withdraw → locked → claim

    #[test]
    fn test_withdrawn_balance_unlocks_after_period() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        let shares = state.add_delegate_stake(&alice, 1, 100 * TOKEN).unwrap();
        assert_eq!(shares, 100 * TOKEN);
        assert_eq!(free(&state, &alice), GENESIS_FREE - 100 * TOKEN);

        let amount = state.remove_delegate_stake(&alice, 1, shares, 20).unwrap();
        assert_eq!(amount, 100 * TOKEN);
        assert_eq!(state.delegate_shares_of(&alice, 1), 0);
        assert!(state.pool(PoolId::Subnet(1)).is_empty());

        // Subnet default unbonding period is 100 blocks
        assert_eq!(state.claim_unbondings(&alice, 119), 0);
        assert_eq!(state.pending_unbondings(&alice).len(), 1);

        assert_eq!(state.claim_unbondings(&alice, 120), 100 * TOKEN);
        assert!(state.pending_unbondings(&alice).is_empty());
        assert_eq!(free(&state, &alice), GENESIS_FREE);
    }

    #[test]
    fn test_direct_stake_round_trip() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        assert_eq!(state.add_stake(&alice, 1, 500 * TOKEN).unwrap(), 500 * TOKEN);
        assert_eq!(state.subnet_stake(1), 500 * TOKEN);

        let unlock = state.remove_stake(&alice, 1, 200 * TOKEN, 50).unwrap();
        assert_eq!(unlock, 150);
        assert_eq!(state.balance_of(&alice, 1), 300 * TOKEN);

        // Leaving a dust position below the minimum is refused
        assert!(matches!(
            state.remove_stake(&alice, 1, 250 * TOKEN, 60),
            Err(LedgerError::BelowMinStake { .. })
        ));
        assert_eq!(state.balance_of(&alice, 1), 300 * TOKEN);

        assert_eq!(state.claim_unbondings(&alice, 150), 200 * TOKEN);
        assert_eq!(free(&state, &alice), GENESIS_FREE - 300 * TOKEN);
    }

    #[test]
    fn test_full_unbonding_ledger_releases_matured_entries() {
        let mut config = LedgerConfig::default();
        config.network.max_unbondings = 2;
        let mut state = state_with(config);
        let (alice, _, _) = accounts();

        state.add_delegate_stake(&alice, 1, 100 * TOKEN).unwrap();
        state.remove_delegate_stake(&alice, 1, 10 * TOKEN, 10).unwrap();
        state.remove_delegate_stake(&alice, 1, 10 * TOKEN, 20).unwrap();

        // Nothing has matured yet: the third withdrawal is refused in full
        assert_eq!(
            state.remove_delegate_stake(&alice, 1, 10 * TOKEN, 30),
            Err(LedgerError::LedgerFull { capacity: 2 })
        );
        assert_eq!(state.delegate_shares_of(&alice, 1), 80 * TOKEN);

        // At block 115 the first entry (unlock 110) is released to make room
        state.remove_delegate_stake(&alice, 1, 10 * TOKEN, 115).unwrap();
        let pending = state.pending_unbondings(&alice);
        assert_eq!(pending.len(), 2);
        assert!(pending.iter().all(|entry| entry.unlock_block > 115));
        assert_eq!(free(&state, &alice), GENESIS_FREE - 90 * TOKEN);
    }

    // ===== TEST 2: REWARDS AND SHARE PRICE =====

    #[test]
    fn test_rewards_raise_share_price() {
        let mut state = dev_state();
        let (alice, bob, carol) = accounts();

        state.add_delegate_stake(&alice, 1, 100 * TOKEN).unwrap();
        state.add_delegate_stake(&bob, 1, 100 * TOKEN).unwrap();
        state.distribute_delegate_rewards(1, 100 * TOKEN).unwrap();

        assert_eq!(state.delegate_balance_of(&alice, 1), 150 * TOKEN);
        assert_eq!(state.delegate_balance_of(&bob, 1), 150 * TOKEN);

        let bob_shares = state.delegate_shares_of(&bob, 1);
        assert_eq!(
            state.remove_delegate_stake(&bob, 1, bob_shares, 10).unwrap(),
            150 * TOKEN
        );

        // Late depositor pays the current price
        let shares = state.add_delegate_stake(&carol, 1, 150 * TOKEN).unwrap();
        assert_eq!(shares, 100 * TOKEN);
        assert_eq!(state.delegate_balance_of(&carol, 1), 150 * TOKEN);
    }

    #[test]
    fn test_rewards_into_unheld_pool_rejected() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();
        let root = state.state_root(0).unwrap();

        assert_eq!(
            state.distribute_delegate_rewards(1, 1_000 * TOKEN),
            Err(LedgerError::InsufficientShares)
        );
        assert_eq!(
            state.distribute_node_delegate_rewards(1, 1, 1_000 * TOKEN),
            Err(LedgerError::InsufficientShares)
        );
        assert_eq!(state.state_root(0).unwrap(), root);

        // The first depositor gets exactly what they put in
        state.add_delegate_stake(&alice, 1, TOKEN).unwrap();
        assert_eq!(state.delegate_balance_of(&alice, 1), TOKEN);
        assert_eq!(state.total_delegate_stake(), TOKEN);
    }

    #[test]
    fn test_node_delegate_transfer_respects_minimum() {
        let mut state = dev_state();
        let (alice, bob, _) = accounts();

        state.add_node_delegate_stake(&alice, 1, 1, 10 * TOKEN).unwrap();
        state
            .transfer_node_delegate_stake(&alice, 1, 1, &bob, 5 * TOKEN)
            .unwrap();
        assert_eq!(state.node_delegate_shares_of(&bob, 1, 1), 5 * TOKEN);
        assert_eq!(state.node_delegate_balance_of(&alice, 1, 1), 5 * TOKEN);

        // Default minimum deposit is 1000 units
        assert!(matches!(
            state.transfer_node_delegate_stake(&alice, 1, 1, &bob, 500),
            Err(LedgerError::BelowMinDelegateDeposit { amount: 500, .. })
        ));
        assert_eq!(state.total_node_delegate_stake(), 10 * TOKEN);
    }

    // ===== TEST 3: SWAP QUEUE =====
    // swap → retarget → wait → execute

    #[test]
    fn test_swap_retarget_then_execute() {
        let mut state = dev_state();
        let (alice, bob, _) = accounts();

        let id = queue_swap_to_subnet_2(&mut state, 10);
        assert_eq!(state.delegate_shares_of(&alice, 1), 0);
        assert_eq!(state.delegate_shares_of(&alice, 2), 0);
        assert_eq!(state.queued_swap(id).unwrap().execute_after_block, 110);

        let to_node = SwapTarget::ToNodeDelegateStake {
            subnet_id: 2,
            subnet_node_id: 1,
        };
        assert_eq!(
            state.update_swap_queue(&bob, id, to_node, 50),
            Err(LedgerError::Unauthorized)
        );
        state.update_swap_queue(&alice, id, to_node, 50).unwrap();

        assert!(matches!(
            state.execute_swap(id, 109),
            Err(LedgerError::NotMatured { .. })
        ));
        assert!(matches!(
            state.update_swap_queue(&alice, id, to_node, 110),
            Err(LedgerError::QueueLocked { .. })
        ));

        assert_eq!(state.node_delegate_balance_of(&alice, 2, 1), 0);
        assert_eq!(
            state.execute_swap(id, 110).unwrap(),
            SwapOutcome::Deposited {
                shares: 100 * TOKEN
            }
        );
        assert_eq!(state.node_delegate_balance_of(&alice, 2, 1), 100 * TOKEN);
        assert_eq!(state.delegate_balance_of(&alice, 2), 0);
        assert!(state.queued_swap(id).is_none());
        assert_eq!(state.execute_swap(id, 111), Err(LedgerError::SwapNotFound(id)));
    }

    #[test]
    fn test_swap_to_deactivated_subnet_falls_back_to_unbonding() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        let id = queue_swap_to_subnet_2(&mut state, 10);
        state.runtime_mut().deactivate_subnet(2);

        let fallback = state.runtime().network_params().fallback_unbonding_period;
        assert_eq!(
            state.execute_swap(id, 110).unwrap(),
            SwapOutcome::Unbonded {
                unlock_block: 110 + fallback
            }
        );
        assert_eq!(state.pending_unbondings(&alice).len(), 1);
        assert_eq!(state.claim_unbondings(&alice, 110 + fallback), 100 * TOKEN);
        assert_eq!(free(&state, &alice), GENESIS_FREE);
    }

    #[test]
    fn test_node_to_node_swap() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        state.add_node_delegate_stake(&alice, 1, 1, 50 * TOKEN).unwrap();
        let id = state
            .swap_node_delegate_stake(&alice, 1, 1, 2, 2, 50 * TOKEN, 10)
            .unwrap();
        assert_eq!(state.node_delegate_shares_of(&alice, 1, 1), 0);
        assert_eq!(
            state.queued_swap(id).unwrap().target,
            SwapTarget::ToNodeDelegateStake {
                subnet_id: 2,
                subnet_node_id: 2
            }
        );

        assert!(matches!(
            state.execute_swap(id, 109),
            Err(LedgerError::NotMatured { .. })
        ));
        assert_eq!(state.node_delegate_shares_of(&alice, 2, 2), 0);

        assert_eq!(
            state.execute_swap(id, 110).unwrap(),
            SwapOutcome::Deposited {
                shares: 50 * TOKEN
            }
        );
        assert_eq!(state.node_delegate_balance_of(&alice, 2, 2), 50 * TOKEN);
        assert_eq!(state.total_node_delegate_stake(), 50 * TOKEN);
        assert_eq!(free(&state, &alice), GENESIS_FREE - 50 * TOKEN);
    }

    #[test]
    fn test_retarget_to_inactive_pool_rejected() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        let id = queue_swap_to_subnet_2(&mut state, 10);
        let queued = state.queued_swap(id).cloned();

        assert_eq!(
            state.update_swap_queue(
                &alice,
                id,
                SwapTarget::ToSubnetDelegateStake { subnet_id: 9 },
                20
            ),
            Err(LedgerError::SubnetNotActive(9))
        );
        assert_eq!(
            state.update_swap_queue(
                &alice,
                id,
                SwapTarget::ToNodeDelegateStake {
                    subnet_id: 2,
                    subnet_node_id: 9
                },
                20
            ),
            Err(LedgerError::SubnetNodeNotActive {
                subnet_id: 2,
                subnet_node_id: 9
            })
        );
        assert_eq!(state.queued_swap(id).cloned(), queued);
    }

    #[test]
    fn test_swap_to_deactivated_node_falls_back_to_unbonding() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        let id = queue_swap_to_subnet_2(&mut state, 10);
        let to_node = SwapTarget::ToNodeDelegateStake {
            subnet_id: 2,
            subnet_node_id: 1,
        };
        state.update_swap_queue(&alice, id, to_node, 50).unwrap();
        state.runtime_mut().deactivate_node(2, 1);

        let fallback = state.runtime().network_params().fallback_unbonding_period;
        assert_eq!(
            state.execute_swap(id, 110).unwrap(),
            SwapOutcome::Unbonded {
                unlock_block: 110 + fallback
            }
        );
        assert!(state.queued_swap(id).is_none());
        assert_eq!(state.total_node_delegate_stake(), 0);
        assert_eq!(state.claim_unbondings(&alice, 110 + fallback), 100 * TOKEN);
        assert_eq!(free(&state, &alice), GENESIS_FREE);
    }

    #[test]
    fn test_swap_minting_zero_shares_falls_back_to_unbonding() {
        let mut state = dev_state();
        let (alice, bob, _) = accounts();

        let id = queue_swap_to_subnet_2(&mut state, 10);

        // 1000 units backed by a large reward: 100 TOKEN buys less than one share
        state.add_delegate_stake(&bob, 2, 1_000).unwrap();
        state.distribute_delegate_rewards(2, 200_000 * TOKEN).unwrap();
        let before = state.pool(PoolId::Subnet(2));

        let fallback = state.runtime().network_params().fallback_unbonding_period;
        assert_eq!(
            state.execute_swap(id, 110).unwrap(),
            SwapOutcome::Unbonded {
                unlock_block: 110 + fallback
            }
        );
        assert_eq!(state.pool(PoolId::Subnet(2)), before);
        assert_eq!(state.delegate_shares_of(&alice, 2), 0);
        assert_eq!(state.pending_unbondings(&alice)[0].amount, 100 * TOKEN);
    }

    #[test]
    fn test_swap_fallback_into_full_ledger_stays_queued() {
        let mut config = LedgerConfig::default();
        config.network.max_unbondings = 1;
        let mut state = state_with(config);
        let (alice, _, _) = accounts();

        state.add_delegate_stake(&alice, 1, 200 * TOKEN).unwrap();
        let id = state
            .swap_delegate_stake(&alice, 1, 2, 100 * TOKEN, 10)
            .unwrap();
        // Unlocks at block 150, still pending when the swap matures
        state.remove_delegate_stake(&alice, 1, 10 * TOKEN, 50).unwrap();
        state.runtime_mut().deactivate_subnet(2);

        assert_eq!(
            state.execute_swap(id, 110),
            Err(LedgerError::LedgerFull { capacity: 1 })
        );
        assert_eq!(state.queued_swap(id).unwrap().balance, 100 * TOKEN);
        assert_eq!(state.pending_unbondings(&alice).len(), 1);

        // Once the withdrawal matures it is released to make room
        let fallback = state.runtime().network_params().fallback_unbonding_period;
        assert_eq!(
            state.execute_swap(id, 160).unwrap(),
            SwapOutcome::Unbonded {
                unlock_block: 160 + fallback
            }
        );
        assert!(state.queued_swap(id).is_none());
        assert_eq!(free(&state, &alice), GENESIS_FREE - 190 * TOKEN);
    }

    #[test]
    fn test_ready_swaps_run_in_queue_order() {
        let mut state = dev_state();
        let (alice, bob, _) = accounts();

        state.add_delegate_stake(&alice, 1, 100 * TOKEN).unwrap();
        state.add_delegate_stake(&bob, 1, 100 * TOKEN).unwrap();
        let first = state.swap_delegate_stake(&alice, 1, 2, 40 * TOKEN, 10).unwrap();
        let second = state.swap_delegate_stake(&bob, 1, 2, 40 * TOKEN, 20).unwrap();

        // Only the first has matured at block 115
        let results = state.execute_ready_swaps(115, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, first);

        let results = state.execute_ready_swaps(200, 10);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, second);
        assert!(results[0].1.is_ok());
        assert_eq!(state.pool(PoolId::Subnet(2)).total_balance, 80 * TOKEN);
    }

    // ===== TEST 4: OVERWATCH COMMIT-REVEAL =====
    // Default overwatch epoch: 1000 blocks, reveals open at block 500

    #[test]
    fn test_overwatch_commit_reveal_cycle() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        let reveal = OverwatchReveal {
            subnet_id: 1,
            weight: PERCENTAGE_FACTOR / 2,
            salt: b"pepper".to_vec(),
        };

        assert_eq!(
            state
                .commit_overwatch_weights(&alice, 1, &[reveal.commit()], 10)
                .unwrap(),
            0
        );
        assert_eq!(state.commit_of(0, 1, 1), Some(reveal.commit().hash));

        // Still in the commit window
        assert_eq!(
            state.reveal_overwatch_weights(&alice, 1, &[reveal.clone()], 10),
            Err(LedgerError::OutOfWindow)
        );

        let wrong = OverwatchReveal {
            weight: PERCENTAGE_FACTOR / 4,
            ..reveal.clone()
        };
        assert_eq!(
            state.reveal_overwatch_weights(&alice, 1, &[reveal.clone(), wrong], 600),
            Err(LedgerError::HashMismatch)
        );
        assert_eq!(state.reveal_of(0, 1, 1), None);

        assert_eq!(
            state
                .reveal_overwatch_weights(&alice, 1, &[reveal.clone()], 600)
                .unwrap(),
            0
        );
        assert_eq!(state.reveal_of(0, 1, 1), Some(PERCENTAGE_FACTOR / 2));

        // Commits are closed once reveals open
        assert_eq!(
            state.commit_overwatch_weights(&alice, 1, &[reveal.commit()], 600),
            Err(LedgerError::OutOfWindow)
        );
    }

    #[test]
    fn test_overwatch_records_pruned_after_retention() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();
        let reveal = OverwatchReveal {
            subnet_id: 2,
            weight: PERCENTAGE_FACTOR,
            salt: vec![1, 2, 3],
        };

        state
            .commit_overwatch_weights(&alice, 1, &[reveal.commit()], 100)
            .unwrap();
        state
            .reveal_overwatch_weights(&alice, 1, &[reveal], 700)
            .unwrap();

        // Retention is four epochs
        assert_eq!(state.prune_overwatch(4_999), 0);
        assert_eq!(state.prune_overwatch(5_000), 2);
        assert_eq!(state.commit_of(0, 1, 2), None);
        assert_eq!(state.reveal_of(0, 2, 1), None);
    }

    #[test]
    fn test_commit_to_inactive_subnet_rejected() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();
        let reveal = OverwatchReveal {
            subnet_id: 9,
            weight: 1,
            salt: vec![],
        };

        assert_eq!(
            state.commit_overwatch_weights(&alice, 1, &[reveal.commit()], 10),
            Err(LedgerError::SubnetNotActive(9))
        );
    }

    // ===== TEST 5: ATOMICITY =====
    // Every rejected call leaves the state root and free balances untouched

    #[test]
    fn test_rejected_calls_leave_state_untouched() {
        let mut state = dev_state();
        let (alice, bob, _) = accounts();
        state.add_delegate_stake(&alice, 1, 100 * TOKEN).unwrap();

        let root = state.state_root(50).unwrap();
        let alice_free = free(&state, &alice);
        let bob_free = free(&state, &bob);

        assert!(state.add_stake(&alice, 1, 50 * TOKEN).is_err());
        assert!(state.add_stake(&alice, 1, 2_000_000 * TOKEN).is_err());
        assert!(state.add_delegate_stake(&bob, 1, 999).is_err());
        assert!(state.add_delegate_stake(&bob, 7, 100 * TOKEN).is_err());
        assert!(state.remove_delegate_stake(&bob, 1, 1, 50).is_err());
        assert!(state.swap_delegate_stake(&alice, 1, 7, TOKEN, 50).is_err());
        assert!(state
            .swap_from_subnet_to_node(&alice, 1, 1, 9, TOKEN, 50)
            .is_err());
        assert!(state.transfer_delegate_stake(&alice, 1, &bob, 0).is_err());
        assert!(state.distribute_node_delegate_rewards(1, 9, TOKEN).is_err());

        assert_eq!(state.state_root(50).unwrap(), root);
        assert_eq!(free(&state, &alice), alice_free);
        assert_eq!(free(&state, &bob), bob_free);
    }

    #[test]
    fn test_node_to_subnet_swap_keeps_value() {
        let mut state = dev_state();
        let (alice, _, _) = accounts();

        state.add_node_delegate_stake(&alice, 1, 2, 30 * TOKEN).unwrap();
        let id = state
            .swap_from_node_to_subnet(&alice, 1, 2, 2, 30 * TOKEN, 5)
            .unwrap();
        assert_eq!(state.total_node_delegate_stake(), 0);

        state.execute_swap(id, 105).unwrap();
        assert_eq!(state.delegate_balance_of(&alice, 2), 30 * TOKEN);
        assert_eq!(free(&state, &alice), GENESIS_FREE - 30 * TOKEN);
    }
}
