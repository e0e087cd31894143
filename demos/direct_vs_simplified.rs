//! Direct versus simplified settlement of the same history.
//!
//! The direct strategy keeps every debt between the people who incurred it;
//! the simplified strategy only looks at final balances and needs fewer
//! transfers.

use split_engine::core::expense::{Expense, ExpenseSet, SplitPolicy};
use split_engine::core::participant::ParticipantId;
use split_engine::settlement::{
    DebtGraph, GroupSettings, SettlementEngine, SettlementStrategy,
};
use split_engine::simulation::expense_generator::{generate_random_expenses, ExpenseNetworkConfig};

fn main() {
    println!("╔════════════════════════════════════════════════╗");
    println!("║  split-engine: Direct vs Simplified Settlement  ║");
    println!("╚════════════════════════════════════════════════╝\n");

    let a = ParticipantId::new("A");
    let b = ParticipantId::new("B");
    let c = ParticipantId::new("C");

    // A chain of debts: B owes A, C owes B.
    println!("Expenses:");
    println!("  A pays 30.00 for A and B");
    println!("  B pays 30.00 for B and C\n");

    let chain: ExpenseSet = vec![
        Expense::new(3_000, SplitPolicy::Evenly)
            .paid_by(a.clone(), 3_000)
            .paid_for(a.clone(), 1)
            .paid_for(b.clone(), 1),
        Expense::new(3_000, SplitPolicy::Evenly)
            .paid_by(b.clone(), 3_000)
            .paid_for(b.clone(), 1)
            .paid_for(c.clone(), 1),
    ]
    .into_iter()
    .collect();

    let mut graph = DebtGraph::new();
    for expense in chain.iter() {
        graph.add_expense(expense).expect("valid expense");
    }
    println!("Pairwise debts:");
    println!("  B owes A: {}", graph.debt(&b, &a));
    println!("  C owes B: {}", graph.debt(&c, &b));
    println!();

    for strategy in [SettlementStrategy::Direct, SettlementStrategy::Simplified] {
        let settings = GroupSettings::default().with_strategy(strategy);
        let plan = SettlementEngine::plan(&chain, &settings).expect("chain settles");
        println!("{}", plan);
    }

    // --- Random group ---
    println!("━━━ Random group (12 people, 200 expenses) ━━━\n");

    let config = ExpenseNetworkConfig {
        participant_count: 12,
        expense_count: 200,
        reimbursement_ratio: 0.15,
        seed: Some(2024),
        ..Default::default()
    };
    let group = generate_random_expenses(&config);

    let direct = GroupSettings::default().with_strategy(SettlementStrategy::Direct);
    let direct = SettlementEngine::plan(&group, &direct).expect("group settles");
    let simplified =
        SettlementEngine::plan(&group, &GroupSettings::default()).expect("group settles");

    println!(
        "  {:<12} {:>14} {:>14}",
        "Strategy", "Transactions", "Transferred"
    );
    for plan in [&direct, &simplified] {
        println!(
            "  {:<12} {:>14} {:>14}",
            plan.strategy.to_string(),
            plan.transaction_count(),
            plan.total_transferred()
        );
    }
}
