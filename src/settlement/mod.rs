//! Balance aggregation and the two settlement strategies.

pub mod aggregator;
pub mod direct;
pub mod simplified;
pub mod strategy;

use crate::core::balance::BalanceSheet;
use crate::core::error::Result;
use crate::core::expense::ExpenseSet;
use crate::core::transaction::Transaction;

pub use aggregator::{AggregationOptions, BalanceAggregator};
pub use direct::{direct_reimbursements, DebtGraph};
pub use simplified::suggested_reimbursements;
pub use strategy::{GroupSettings, SettlementEngine, SettlementPlan, SettlementStrategy};

/// Net balances of every participant across `expenses`, reimbursements included.
pub fn aggregate_balances(expenses: &ExpenseSet) -> Result<BalanceSheet> {
    BalanceAggregator::new().aggregate(expenses)
}

/// Settle `expenses` with the given strategy.
pub fn settle(expenses: &ExpenseSet, strategy: SettlementStrategy) -> Result<Vec<Transaction>> {
    SettlementEngine::settle(expenses, &GroupSettings::default().with_strategy(strategy))
}
