// Tests module
// Scenario tests across ledger components, plus share pool invariants

pub mod ledger_scenarios;
pub mod pool_invariants;
