//! Random expense histories for stress testing and benchmarks.
//!
//! Every generated expense is valid: payers cover the amount, percentages
//! add up to 100% and `ByAmount` weights add up to the amount.

use crate::core::expense::{Expense, ExpenseSet, SplitPolicy, PERCENTAGE_SCALE};
use crate::core::participant::ParticipantId;
use chrono::{Days, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Configuration for generating a random expense history.
#[derive(Debug, Clone)]
pub struct ExpenseNetworkConfig {
    /// Number of participants in the group.
    pub participant_count: usize,
    /// Number of expenses to generate.
    pub expense_count: usize,
    /// Minimum expense amount, in minor units.
    pub min_amount: i64,
    /// Maximum expense amount, in minor units.
    pub max_amount: i64,
    /// Probability that an expense is a reimbursement.
    pub reimbursement_ratio: f64,
    /// Probability that an expense has two payers.
    pub shared_payment_ratio: f64,
    /// Fixed seed for a reproducible history.
    pub seed: Option<u64>,
    /// Date of the first expense.
    pub start_date: NaiveDate,
}

impl Default for ExpenseNetworkConfig {
    fn default() -> Self {
        Self {
            participant_count: 5,
            expense_count: 20,
            min_amount: 100,
            max_amount: 50_000,
            reimbursement_ratio: 0.1,
            shared_payment_ratio: 0.1,
            seed: None,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default(),
        }
    }
}

/// Generate a random expense history for testing.
pub fn generate_random_expenses(config: &ExpenseNetworkConfig) -> ExpenseSet {
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut set = ExpenseSet::new();
    if config.participant_count == 0 {
        return set;
    }

    let participants: Vec<ParticipantId> = (0..config.participant_count)
        .map(|i| ParticipantId::new(format!("P{:03}", i)))
        .collect();
    let min_amount = config.min_amount.max(1);
    let max_amount = config.max_amount.max(min_amount);

    for day in 0..config.expense_count {
        let amount = rng.gen_range(min_amount..=max_amount);
        let date = config
            .start_date
            .checked_add_days(Days::new(day as u64))
            .unwrap_or(config.start_date);

        if participants.len() > 1 && rng.gen_bool(config.reimbursement_ratio.clamp(0.0, 1.0)) {
            let pair: Vec<&ParticipantId> = participants.choose_multiple(&mut rng, 2).collect();
            let reimbursement = Expense::reimbursement(pair[0].clone(), pair[1].clone(), amount);
            set.add(reimbursement.with_date(date));
            continue;
        }

        let mut beneficiaries = participants.clone();
        beneficiaries.shuffle(&mut rng);
        beneficiaries.truncate(rng.gen_range(1..=participants.len()));

        let policy = match rng.gen_range(0..4) {
            0 => SplitPolicy::Evenly,
            1 => SplitPolicy::ByAmount,
            2 => SplitPolicy::ByPercentage,
            _ => SplitPolicy::ByShares,
        };
        let weights: Vec<i64> = match policy {
            SplitPolicy::Evenly => vec![1; beneficiaries.len()],
            SplitPolicy::ByAmount => partition(&mut rng, amount, beneficiaries.len()),
            SplitPolicy::ByPercentage => partition(&mut rng, PERCENTAGE_SCALE, beneficiaries.len()),
            SplitPolicy::ByShares => (0..beneficiaries.len())
                .map(|_| rng.gen_range(1..=4))
                .collect(),
        };

        let mut expense = Expense::new(amount, policy).with_date(date);
        let payer_count = if participants.len() > 1
            && rng.gen_bool(config.shared_payment_ratio.clamp(0.0, 1.0))
        {
            2
        } else {
            1
        };
        let payers: Vec<&ParticipantId> =
            participants.choose_multiple(&mut rng, payer_count).collect();
        for (payer, paid) in payers.iter().zip(partition(&mut rng, amount, payers.len())) {
            expense = expense.paid_by((*payer).clone(), paid);
        }
        for (participant, weight) in beneficiaries.into_iter().zip(weights) {
            expense = expense.paid_for(participant, weight);
        }
        set.add(expense);
    }

    set
}

/// Split `total` into `parts` non-negative integers that add up to `total`.
fn partition(rng: &mut StdRng, total: i64, parts: usize) -> Vec<i64> {
    if parts <= 1 {
        return vec![total; parts];
    }
    let mut cuts: Vec<i64> = (0..parts - 1).map(|_| rng.gen_range(0..=total)).collect();
    cuts.push(0);
    cuts.push(total);
    cuts.sort_unstable();
    cuts.windows(2).map(|w| w[1] - w[0]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settlement::aggregate_balances;

    #[test]
    fn test_random_expense_generation() {
        let config = ExpenseNetworkConfig {
            participant_count: 4,
            expense_count: 30,
            ..Default::default()
        };
        let set = generate_random_expenses(&config);
        assert_eq!(set.len(), 30);
        assert!(set.participants().len() <= 4);
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let config = ExpenseNetworkConfig {
            seed: Some(42),
            ..Default::default()
        };
        let a = generate_random_expenses(&config);
        let b = generate_random_expenses(&config);
        let amounts = |s: &ExpenseSet| s.iter().map(|e| e.amount()).collect::<Vec<_>>();
        assert_eq!(amounts(&a), amounts(&b));
    }

    #[test]
    fn test_generated_expenses_are_valid() {
        let config = ExpenseNetworkConfig {
            participant_count: 8,
            expense_count: 200,
            reimbursement_ratio: 0.2,
            shared_payment_ratio: 0.3,
            seed: Some(7),
            ..Default::default()
        };
        let set = generate_random_expenses(&config);
        let balances = aggregate_balances(&set).unwrap();
        assert!(balances.is_balanced());
    }

    #[test]
    fn test_partition_sums() {
        let mut rng = StdRng::seed_from_u64(1);
        for parts in 1..10 {
            let split = partition(&mut rng, 10_000, parts);
            assert_eq!(split.len(), parts);
            assert_eq!(split.iter().sum::<i64>(), 10_000);
            assert!(split.iter().all(|p| *p >= 0));
        }
    }

    #[test]
    fn test_no_participants() {
        let config = ExpenseNetworkConfig {
            participant_count: 0,
            ..Default::default()
        };
        assert!(generate_random_expenses(&config).is_empty());
    }
}
