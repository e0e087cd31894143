use crate::allocation::hash_sequence::HashSequence;
use crate::core::error::{Result, SplitError};
use crate::core::expense::{Expense, SplitPolicy, PERCENTAGE_SCALE};
use crate::core::participant::ParticipantId;
use crate::core::rational::Rational;
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Exact per-participant split of one expense, in minor units.
///
/// The shares of a successful allocation always sum to the expense amount.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShareAllocation {
    shares: BTreeMap<ParticipantId, i64>,
}

impl ShareAllocation {
    /// Share of a participant; zero if the participant is not part of the split.
    pub fn share_of(&self, participant: &ParticipantId) -> i64 {
        self.shares.get(participant).copied().unwrap_or(0)
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<i64> {
        self.shares.get(participant).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, i64)> {
        self.shares.iter().map(|(p, s)| (p, *s))
    }

    pub fn len(&self) -> usize {
        self.shares.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shares.is_empty()
    }

    /// Sum of all shares, widened to avoid overflow.
    pub fn total(&self) -> i128 {
        self.shares.values().map(|s| *s as i128).sum()
    }
}

/// Turns one expense into exact integer shares.
///
/// # Algorithm
///
/// 1. Compute each beneficiary's ideal share as an exact [`Rational`]
///    according to the split policy.
/// 2. Round every ideal share toward zero.
/// 3. The rounded shares fall short of the amount by a small `diff`:
///    - `ByAmount` gives all of it to the first payer (or first beneficiary);
///    - every other policy hands it out one unit at a time to beneficiaries
///      picked by a [`HashSequence`] seeded from the amount, the ordered
///      beneficiary ids and the expense date.
///
/// The result is a pure function of the expense.
pub struct ShareAllocator;

impl ShareAllocator {
    pub fn allocate(expense: &Expense) -> Result<ShareAllocation> {
        let beneficiaries = expense.beneficiaries();
        if beneficiaries.is_empty() {
            if expense.is_reimbursement() {
                return Ok(ShareAllocation::default());
            }
            return Err(SplitError::invalid(expense.id(), "expense has no beneficiaries"));
        }

        let mut seen = HashSet::new();
        for entry in beneficiaries {
            if !seen.insert(&entry.participant) {
                return Err(SplitError::invalid(
                    expense.id(),
                    format!("{} is listed twice as beneficiary", entry.participant),
                ));
            }
        }

        let amount = expense.amount() as i128;
        let mut raw = Self::rounded_shares(expense)?;
        let rounded_sum: i128 = raw.iter().sum();
        let diff = amount - rounded_sum;

        let mut shares: BTreeMap<ParticipantId, i128> = beneficiaries
            .iter()
            .map(|entry| entry.participant.clone())
            .zip(raw.iter().copied())
            .collect();

        if diff != 0 {
            if expense.split_policy() == SplitPolicy::ByAmount {
                let absorber = expense
                    .payers()
                    .first()
                    .map(|p| &p.participant)
                    .unwrap_or(&beneficiaries[0].participant);
                trace!("expense {}: {} absorbs {}", expense.id(), absorber, diff);
                *shares.entry(absorber.clone()).or_insert(0) += diff;
            } else {
                Self::redistribute(expense, &mut raw, diff);
                for (entry, share) in beneficiaries.iter().zip(raw) {
                    shares.insert(entry.participant.clone(), share);
                }
            }
        }

        let mut result = BTreeMap::new();
        for (participant, share) in shares {
            let share = i64::try_from(share).map_err(|_| {
                SplitError::invalid(expense.id(), format!("share of {participant} overflows"))
            })?;
            result.insert(participant, share);
        }
        let allocation = ShareAllocation { shares: result };

        let total = allocation.total();
        if total != amount {
            return Err(SplitError::conservation(
                format!("allocation of expense {}", expense.id()),
                expense.amount(),
                i64::try_from(total).unwrap_or(i64::MAX),
            ));
        }

        debug!(
            "allocated expense {} ({} {}) across {} participants, remainder {}",
            expense.id(),
            expense.amount(),
            expense.split_policy(),
            allocation.len(),
            diff
        );
        Ok(allocation)
    }

    /// Per-beneficiary shares rounded toward zero, in `paid_for` order.
    fn rounded_shares(expense: &Expense) -> Result<Vec<i128>> {
        let amount = expense.amount() as i128;
        let beneficiaries = expense.beneficiaries();

        match expense.split_policy() {
            SplitPolicy::Evenly => {
                let count = beneficiaries.len() as i128;
                let share = exact(expense, amount, count)?.round_toward_zero();
                Ok(vec![share; beneficiaries.len()])
            }
            SplitPolicy::ByAmount => Ok(beneficiaries.iter().map(|e| e.weight as i128).collect()),
            SplitPolicy::ByPercentage => {
                Self::ensure_non_negative_weights(expense)?;
                let total: i128 = beneficiaries.iter().map(|e| e.weight as i128).sum();
                if total != PERCENTAGE_SCALE as i128 {
                    return Err(SplitError::invalid(
                        expense.id(),
                        format!("percentages add up to {total}, expected {PERCENTAGE_SCALE}"),
                    ));
                }
                beneficiaries
                    .iter()
                    .map(|e| {
                        exact(expense, amount * e.weight as i128, PERCENTAGE_SCALE as i128)
                            .map(|r| r.round_toward_zero())
                    })
                    .collect()
            }
            SplitPolicy::ByShares => {
                Self::ensure_non_negative_weights(expense)?;
                let total: i128 = beneficiaries.iter().map(|e| e.weight as i128).sum();
                if total == 0 {
                    if amount != 0 {
                        return Err(SplitError::invalid(
                            expense.id(),
                            "total share weight is zero",
                        ));
                    }
                    return Ok(vec![0; beneficiaries.len()]);
                }
                beneficiaries
                    .iter()
                    .map(|e| {
                        exact(expense, amount * e.weight as i128, total)
                            .map(|r| r.round_toward_zero())
                    })
                    .collect()
            }
        }
    }

    fn ensure_non_negative_weights(expense: &Expense) -> Result<()> {
        match expense.beneficiaries().iter().find(|e| e.weight < 0) {
            Some(entry) => Err(SplitError::invalid(
                expense.id(),
                format!("negative weight {} for {}", entry.weight, entry.participant),
            )),
            None => Ok(()),
        }
    }

    /// Hand out `diff` one unit at a time to pseudo-randomly chosen beneficiaries.
    fn redistribute(expense: &Expense, shares: &mut [i128], mut diff: i128) {
        let step = diff.signum();
        let mut sequence = HashSequence::from_seed(&remainder_seed(expense));
        while diff != 0 {
            let (index, next) = sequence.pick(shares.len());
            shares[index] += step;
            diff -= step;
            sequence = next;
            trace!(
                "expense {}: remainder unit {:+} to {}",
                expense.id(),
                step,
                expense.beneficiaries()[index].participant
            );
        }
    }
}

/// Seed for remainder placement: amount, beneficiary ids in order, then date.
pub fn remainder_seed(expense: &Expense) -> String {
    let mut seed = expense.amount().to_string();
    for entry in expense.beneficiaries() {
        seed.push_str(entry.participant.as_str());
    }
    if let Some(date) = expense.date() {
        seed.push_str(&date.to_string());
    }
    seed
}

fn exact(expense: &Expense, numer: i128, denom: i128) -> Result<Rational> {
    Rational::new(numer, denom)
        .ok_or_else(|| SplitError::invalid(expense.id(), "division by zero while splitting"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn split(amount: i64, policy: SplitPolicy, weights: &[(&str, i64)]) -> Expense {
        let payer = weights.first().map(|(p, _)| *p).unwrap_or("payer");
        weights.iter().fold(
            Expense::new(amount, policy).paid_by(pid(payer), amount),
            |e, (p, w)| e.paid_for(pid(p), *w),
        )
    }

    #[test]
    fn test_evenly_three_ways() {
        let expense = split(100, SplitPolicy::Evenly, &[("A", 1), ("B", 1), ("C", 1)]);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(shares.total(), 100);
        // Seed "100ABC" picks index 1 for the single leftover unit.
        assert_eq!(shares.share_of(&pid("A")), 33);
        assert_eq!(shares.share_of(&pid("B")), 34);
        assert_eq!(shares.share_of(&pid("C")), 33);
    }

    #[test]
    fn test_evenly_ignores_weights() {
        let expense = split(90, SplitPolicy::Evenly, &[("A", 7), ("B", 0), ("C", -3)]);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert!(shares.iter().all(|(_, s)| s == 30));
    }

    #[test]
    fn test_remainder_is_deterministic() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
        let expense = split(
            1001,
            SplitPolicy::Evenly,
            &[("A", 1), ("B", 1), ("C", 1), ("D", 1), ("E", 1), ("F", 1)],
        )
        .with_date(date);
        let first = ShareAllocator::allocate(&expense).unwrap();
        let second = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.total(), 1001);
        assert!(first.iter().all(|(_, s)| (166..=171).contains(&s)));
    }

    #[test]
    fn test_seed_includes_date() {
        let expense = split(100, SplitPolicy::Evenly, &[("A", 1), ("B", 1), ("C", 1)]);
        assert_eq!(remainder_seed(&expense), "100ABC");
        let dated = expense.with_date(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(remainder_seed(&dated), "100ABC2024-03-15");
    }

    #[test]
    fn test_by_percentage_exact() {
        let expense = split(1000, SplitPolicy::ByPercentage, &[("A", 2500), ("B", 7500)]);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(shares.share_of(&pid("A")), 250);
        assert_eq!(shares.share_of(&pid("B")), 750);
    }

    #[test]
    fn test_by_percentage_must_total_hundred() {
        let expense = split(1000, SplitPolicy::ByPercentage, &[("A", 2500), ("B", 2500)]);
        assert!(matches!(
            ShareAllocator::allocate(&expense),
            Err(SplitError::InvalidSplitInput { .. })
        ));
    }

    #[test]
    fn test_by_shares_exact() {
        let expense = split(600, SplitPolicy::ByShares, &[("A", 1), ("B", 2), ("C", 3)]);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(shares.share_of(&pid("A")), 100);
        assert_eq!(shares.share_of(&pid("B")), 200);
        assert_eq!(shares.share_of(&pid("C")), 300);
    }

    #[test]
    fn test_by_shares_zero_weight_participant() {
        let expense = split(500, SplitPolicy::ByShares, &[("A", 0), ("B", 1)]);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(shares.share_of(&pid("A")), 0);
        assert_eq!(shares.share_of(&pid("B")), 500);
    }

    #[test]
    fn test_by_shares_zero_total_weight() {
        let expense = split(500, SplitPolicy::ByShares, &[("A", 0), ("B", 0)]);
        assert!(ShareAllocator::allocate(&expense).is_err());

        let free = split(0, SplitPolicy::ByShares, &[("A", 0), ("B", 0)]);
        let shares = ShareAllocator::allocate(&free).unwrap();
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|(_, s)| s == 0));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let expense = split(500, SplitPolicy::ByShares, &[("A", -1), ("B", 2)]);
        assert!(ShareAllocator::allocate(&expense).is_err());
    }

    #[test]
    fn test_by_amount_slop_goes_to_first_payer() {
        let expense = Expense::new(1000, SplitPolicy::ByAmount)
            .paid_by(pid("P"), 1000)
            .paid_for(pid("A"), 300)
            .paid_for(pid("B"), 699);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(shares.share_of(&pid("A")), 300);
        assert_eq!(shares.share_of(&pid("B")), 699);
        assert_eq!(shares.share_of(&pid("P")), 1);
        assert_eq!(shares.total(), 1000);
    }

    #[test]
    fn test_by_amount_without_payer_uses_first_beneficiary() {
        let expense = Expense::new(1000, SplitPolicy::ByAmount)
            .paid_for(pid("A"), 300)
            .paid_for(pid("B"), 600);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(shares.share_of(&pid("A")), 400);
        assert_eq!(shares.share_of(&pid("B")), 600);
    }

    #[test]
    fn test_negative_amount_keeps_sign() {
        let expense = split(-1000, SplitPolicy::Evenly, &[("A", 1), ("B", 1), ("C", 1)]);
        let shares = ShareAllocator::allocate(&expense).unwrap();
        assert_eq!(shares.total(), -1000);
        assert!(shares.iter().all(|(_, s)| s == -333 || s == -334));
    }

    #[test]
    fn test_single_participant_gets_everything() {
        for policy in [
            SplitPolicy::Evenly,
            SplitPolicy::ByShares,
            SplitPolicy::ByPercentage,
        ] {
            let weight = if policy == SplitPolicy::ByPercentage {
                PERCENTAGE_SCALE
            } else {
                3
            };
            let expense = split(777, policy, &[("A", weight)]);
            let shares = ShareAllocator::allocate(&expense).unwrap();
            assert_eq!(shares.share_of(&pid("A")), 777, "policy {policy}");
        }
        let expense = split(777, SplitPolicy::ByAmount, &[("A", 777)]);
        assert_eq!(ShareAllocator::allocate(&expense).unwrap().share_of(&pid("A")), 777);
    }

    #[test]
    fn test_empty_beneficiaries() {
        let expense = Expense::new(100, SplitPolicy::Evenly).paid_by(pid("A"), 100);
        assert!(matches!(
            ShareAllocator::allocate(&expense),
            Err(SplitError::InvalidSplitInput { .. })
        ));

        let reimbursement = expense.as_reimbursement();
        assert!(ShareAllocator::allocate(&reimbursement).unwrap().is_empty());
    }

    #[test]
    fn test_duplicate_beneficiary_rejected() {
        let expense = split(100, SplitPolicy::Evenly, &[("A", 1), ("A", 1)]);
        assert!(ShareAllocator::allocate(&expense).is_err());
    }
}
