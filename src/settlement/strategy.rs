use crate::core::balance::BalanceSheet;
use crate::core::error::Result;
use crate::core::expense::ExpenseSet;
use crate::core::transaction::{total_transferred, Transaction};
use crate::settlement::aggregator::BalanceAggregator;
use crate::settlement::direct::direct_reimbursements;
use crate::settlement::simplified::suggested_reimbursements;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which settlement algorithm a group uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementStrategy {
    /// Keep the debts each expense created between payer and beneficiaries.
    Direct,
    /// Settle net balances with the fewest transactions the greedy rule finds.
    Simplified,
}

impl SettlementStrategy {
    pub fn from_simplify_flag(simplify_debts: bool) -> Self {
        if simplify_debts {
            SettlementStrategy::Simplified
        } else {
            SettlementStrategy::Direct
        }
    }
}

impl fmt::Display for SettlementStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementStrategy::Direct => f.write_str("direct"),
            SettlementStrategy::Simplified => f.write_str("simplified"),
        }
    }
}

impl FromStr for SettlementStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "direct" => Ok(SettlementStrategy::Direct),
            "simplified" | "simplify" => Ok(SettlementStrategy::Simplified),
            other => Err(format!("unknown settlement strategy '{other}'")),
        }
    }
}

/// Group-level settlement configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupSettings {
    /// Settle net balances (simplified) instead of the original debts (direct).
    pub simplify_debts: bool,
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self {
            simplify_debts: true,
        }
    }
}

impl GroupSettings {
    pub fn strategy(&self) -> SettlementStrategy {
        SettlementStrategy::from_simplify_flag(self.simplify_debts)
    }

    pub fn with_strategy(mut self, strategy: SettlementStrategy) -> Self {
        self.simplify_debts = strategy == SettlementStrategy::Simplified;
        self
    }
}

/// Balances of a group together with the transactions that settle them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementPlan {
    pub strategy: SettlementStrategy,
    pub balances: BalanceSheet,
    pub transactions: Vec<Transaction>,
}

impl SettlementPlan {
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    pub fn total_transferred(&self) -> i64 {
        total_transferred(&self.transactions)
    }

    pub fn is_settled(&self) -> bool {
        self.transactions.is_empty()
    }
}

impl fmt::Display for SettlementPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Settlement ({}) ===", self.strategy)?;
        writeln!(f, "Participants:  {}", self.balances.len())?;
        writeln!(f, "Transactions:  {}", self.transaction_count())?;
        writeln!(f, "Transferred:   {}", self.total_transferred())?;
        for t in &self.transactions {
            writeln!(f, "  {:<12} -> {:<12} {:>12}", t.from, t.to, t.amount)?;
        }
        Ok(())
    }
}

/// Entry point tying aggregation and both settlement strategies together.
pub struct SettlementEngine;

impl SettlementEngine {
    /// Settle a group's expenses with the strategy its settings select.
    pub fn settle(expenses: &ExpenseSet, settings: &GroupSettings) -> Result<Vec<Transaction>> {
        Ok(Self::plan(expenses, settings)?.transactions)
    }

    /// Settle already aggregated balances; always the simplified strategy.
    pub fn settle_balances(balances: &BalanceSheet) -> Result<Vec<Transaction>> {
        suggested_reimbursements(balances)
    }

    /// Aggregate balances and settle them.
    ///
    /// Balances include reimbursements, and the returned transactions settle
    /// exactly those balances whichever strategy is used.
    pub fn plan(expenses: &ExpenseSet, settings: &GroupSettings) -> Result<SettlementPlan> {
        let balances = BalanceAggregator::new().aggregate(expenses)?;
        let strategy = settings.strategy();
        let transactions = match strategy {
            SettlementStrategy::Direct => direct_reimbursements(expenses)?,
            SettlementStrategy::Simplified => suggested_reimbursements(&balances)?,
        };
        Ok(SettlementPlan {
            strategy,
            balances,
            transactions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expense::{Expense, SplitPolicy};
    use crate::core::participant::ParticipantId;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn chain() -> ExpenseSet {
        vec![
            Expense::new(100, SplitPolicy::Evenly)
                .paid_by(pid("A"), 100)
                .paid_for(pid("B"), 1),
            Expense::new(100, SplitPolicy::Evenly)
                .paid_by(pid("B"), 100)
                .paid_for(pid("C"), 1),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_flag_selects_strategy() {
        assert_eq!(GroupSettings::default().strategy(), SettlementStrategy::Simplified);
        let settings = GroupSettings {
            simplify_debts: false,
        };
        assert_eq!(settings.strategy(), SettlementStrategy::Direct);
        assert_eq!(
            settings.with_strategy(SettlementStrategy::Simplified).strategy(),
            SettlementStrategy::Simplified
        );
    }

    #[test]
    fn test_strategy_parsing() {
        assert_eq!("direct".parse::<SettlementStrategy>(), Ok(SettlementStrategy::Direct));
        assert_eq!(
            "Simplified".parse::<SettlementStrategy>(),
            Ok(SettlementStrategy::Simplified)
        );
        assert!("fastest".parse::<SettlementStrategy>().is_err());
    }

    #[test]
    fn test_both_strategies_on_same_expenses() {
        let expenses = chain();
        let simplified = SettlementEngine::plan(&expenses, &GroupSettings::default()).unwrap();
        assert_eq!(
            simplified.transactions,
            vec![Transaction::new(pid("C"), pid("A"), 100)]
        );

        let direct = SettlementEngine::plan(
            &expenses,
            &GroupSettings::default().with_strategy(SettlementStrategy::Direct),
        )
        .unwrap();
        assert_eq!(direct.transaction_count(), 2);
        assert_eq!(direct.balances, simplified.balances);

        for plan in [simplified, direct] {
            let mut balances = plan.balances.clone();
            balances.apply_transactions(&plan.transactions).unwrap();
            assert!(balances.is_settled());
        }
    }

    #[test]
    fn test_settings_deserialize_with_defaults() {
        let settings: GroupSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings, GroupSettings::default());
        let settings: GroupSettings =
            serde_json::from_str(r#"{"simplify_debts": false}"#).unwrap();
        assert_eq!(settings.strategy(), SettlementStrategy::Direct);
    }

    #[test]
    fn test_paid_back_debt_is_not_charged_again() {
        // A pays 200 for A and B, then B pays A back its 100.
        let expenses: ExpenseSet = vec![
            Expense::new(200, SplitPolicy::Evenly)
                .paid_by(pid("A"), 200)
                .paid_for(pid("A"), 1)
                .paid_for(pid("B"), 1),
            Expense::reimbursement(pid("B"), pid("A"), 100),
        ]
        .into_iter()
        .collect();

        for strategy in [SettlementStrategy::Direct, SettlementStrategy::Simplified] {
            let settings = GroupSettings::default().with_strategy(strategy);
            let plan = SettlementEngine::plan(&expenses, &settings).unwrap();
            assert!(plan.balances.is_settled());
            assert!(plan.transactions.is_empty(), "{strategy}: {:?}", plan.transactions);
        }
    }

    #[test]
    fn test_plan_transactions_settle_plan_balances() {
        let mut expenses = chain();
        expenses.add(Expense::reimbursement(pid("C"), pid("B"), 40));
        expenses.add(Expense::reimbursement(pid("B"), pid("A"), 130));

        for strategy in [SettlementStrategy::Direct, SettlementStrategy::Simplified] {
            let settings = GroupSettings::default().with_strategy(strategy);
            let plan = SettlementEngine::plan(&expenses, &settings).unwrap();
            let mut balances = plan.balances.clone();
            balances.apply_transactions(&plan.transactions).unwrap();
            assert!(balances.is_settled(), "{strategy} left balances open");
        }
    }

    #[test]
    fn test_empty_group() {
        let plan = SettlementEngine::plan(&ExpenseSet::new(), &GroupSettings::default()).unwrap();
        assert!(plan.is_settled());
        assert_eq!(plan.total_transferred(), 0);
    }
}
