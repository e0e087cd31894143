//! Splitting a few shared expenses and settling up.
//!
//! Shows every split policy, the deterministic remainder placement and the
//! resulting balances.

use chrono::NaiveDate;
use split_engine::allocation::allocate_shares;
use split_engine::analysis::spending::SpendingSummary;
use split_engine::core::amount::format_minor;
use split_engine::core::expense::{Expense, ExpenseSet, SplitPolicy};
use split_engine::core::participant::ParticipantId;
use split_engine::settlement::{GroupSettings, SettlementEngine};

fn main() {
    println!("╔══════════════════════════════════════╗");
    println!("║  split-engine: Basic Split Example   ║");
    println!("╚══════════════════════════════════════╝\n");

    let alice = ParticipantId::new("alice");
    let bob = ParticipantId::new("bob");
    let carol = ParticipantId::new("carol");
    let day = |d| NaiveDate::from_ymd_opt(2024, 7, d).expect("valid date");

    // --- Scenario 1: Remainder placement ---
    println!("━━━ Scenario 1: 100.00 split three ways ━━━\n");

    let dinner = Expense::new(10_000, SplitPolicy::Evenly)
        .paid_by(alice.clone(), 10_000)
        .paid_for(alice.clone(), 1)
        .paid_for(bob.clone(), 1)
        .paid_for(carol.clone(), 1)
        .with_date(day(5));
    let shares = allocate_shares(&dinner).expect("dinner splits");
    for (participant, share) in shares.iter() {
        println!("  {:<8} {:>10}", participant, format_minor(share, 2));
    }
    println!();

    // --- Scenario 2: A whole trip ---
    println!("━━━ Scenario 2: Trip with every policy ━━━\n");

    let mut trip = ExpenseSet::new();
    trip.add(dinner);
    trip.add(
        Expense::new(45_000, SplitPolicy::ByShares)
            .paid_by(bob.clone(), 45_000)
            .paid_for(alice.clone(), 2)
            .paid_for(bob.clone(), 2)
            .paid_for(carol.clone(), 1)
            .with_date(day(5)),
    );
    trip.add(
        Expense::new(6_000, SplitPolicy::ByPercentage)
            .paid_by(carol.clone(), 6_000)
            .paid_for(alice.clone(), 5_000)
            .paid_for(carol.clone(), 5_000)
            .with_date(day(6)),
    );
    trip.add(
        Expense::new(3_250, SplitPolicy::ByAmount)
            .paid_by(alice.clone(), 3_250)
            .paid_for(bob.clone(), 1_250)
            .paid_for(carol.clone(), 2_000)
            .with_date(day(6)),
    );
    trip.add(Expense::reimbursement(carol.clone(), bob.clone(), 5_000).with_date(day(7)));

    let summary = SpendingSummary::from_expenses(&trip).expect("trip aggregates");
    println!("{}", summary);

    let plan = SettlementEngine::plan(&trip, &GroupSettings::default()).expect("trip settles");

    println!("━━━ Balances ━━━\n");
    for (participant, balance) in plan.balances.iter() {
        let total = balance.net().expect("totals fit in minor units");
        let status = if total > 0 {
            "GETS BACK"
        } else if total < 0 {
            "OWES"
        } else {
            "EVEN"
        };
        println!("  {:<8} {:>10}  [{}]", participant, format_minor(total, 2), status);
    }
    println!();

    println!("{}", plan);
}
