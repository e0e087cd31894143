use crate::allocation::ShareAllocator;
use crate::core::balance::BalanceSheet;
use crate::core::error::{Result, SplitError};
use crate::core::expense::Expense;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// What the aggregator counts toward `paid` and `owed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationOptions {
    /// Reimbursements move money between participants; they belong in net
    /// balances but not in spending figures.
    pub include_reimbursements: bool,
}

impl Default for AggregationOptions {
    fn default() -> Self {
        Self {
            include_reimbursements: true,
        }
    }
}

/// Sums payments and allocated shares of many expenses into a [`BalanceSheet`].
///
/// Aggregation is order-independent: every expense contributes its own
/// `paid`/`owed` deltas and addition commutes.
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceAggregator {
    options: AggregationOptions,
}

impl BalanceAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: AggregationOptions) -> Self {
        Self { options }
    }

    /// Leave reimbursement expenses out of the totals.
    pub fn excluding_reimbursements() -> Self {
        Self::with_options(AggregationOptions {
            include_reimbursements: false,
        })
    }

    /// Aggregate a list of expenses. Fails on the first invalid expense and
    /// verifies that the resulting totals sum to zero.
    pub fn aggregate<'a>(
        &self,
        expenses: impl IntoIterator<Item = &'a Expense>,
    ) -> Result<BalanceSheet> {
        let mut sheet = BalanceSheet::new();
        let mut counted = 0usize;
        for expense in expenses {
            if expense.is_reimbursement() && !self.options.include_reimbursements {
                continue;
            }
            sheet.merge(&expense_balances(expense)?)?;
            counted += 1;
        }
        sheet.ensure_balanced("balance aggregation")?;
        debug!(
            "aggregated {} expenses into {} balances",
            counted,
            sheet.len()
        );
        Ok(sheet)
    }
}

/// The `paid`/`owed` deltas of a single expense.
///
/// Validates what allocation alone does not: the expense must have payers
/// whose amounts add up to the expense amount, and a non-zero expense must
/// have beneficiaries.
pub fn expense_balances(expense: &Expense) -> Result<BalanceSheet> {
    if expense.payers().is_empty() {
        return Err(SplitError::invalid(expense.id(), "expense has no payers"));
    }
    let mut seen = HashSet::new();
    if let Some(payer) = expense.payers().iter().find(|p| !seen.insert(&p.participant)) {
        return Err(SplitError::invalid(
            expense.id(),
            format!("{} is listed twice as payer", payer.participant),
        ));
    }
    let paid: i128 = expense.payers().iter().map(|p| p.amount as i128).sum();
    if paid != expense.amount() as i128 {
        return Err(SplitError::invalid(
            expense.id(),
            format!(
                "payers cover {} but the expense amount is {}",
                paid,
                expense.amount()
            ),
        ));
    }
    if expense.beneficiaries().is_empty() && expense.amount() != 0 {
        return Err(SplitError::invalid(expense.id(), "expense has no beneficiaries"));
    }

    let shares = ShareAllocator::allocate(expense)?;

    let mut sheet = BalanceSheet::new();
    for payer in expense.payers() {
        sheet.record_paid(&payer.participant, payer.amount)?;
    }
    for (participant, share) in shares.iter() {
        sheet.record_owed(participant, share)?;
    }
    Ok(sheet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::expense::SplitPolicy;
    use crate::core::participant::ParticipantId;

    fn pid(s: &str) -> ParticipantId {
        ParticipantId::new(s)
    }

    fn dinner() -> Expense {
        Expense::new(300, SplitPolicy::Evenly)
            .paid_by(pid("A"), 300)
            .paid_for(pid("A"), 1)
            .paid_for(pid("B"), 1)
            .paid_for(pid("C"), 1)
    }

    #[test]
    fn test_aggregate_single_expense() {
        let sheet = BalanceAggregator::new().aggregate(&[dinner()]).unwrap();
        let a = sheet.get(&pid("A")).unwrap();
        assert_eq!(a.paid, 300);
        assert_eq!(a.owed, 100);
        assert_eq!(a.total(), 200);
        assert_eq!(sheet.total_of(&pid("B")), -100);
        assert_eq!(sheet.total_of(&pid("C")), -100);
        assert!(sheet.is_balanced());
    }

    #[test]
    fn test_reimbursement_handling() {
        let expenses = vec![dinner(), Expense::reimbursement(pid("B"), pid("A"), 100)];

        let sheet = BalanceAggregator::new().aggregate(&expenses).unwrap();
        assert_eq!(sheet.total_of(&pid("A")), 100);
        assert_eq!(sheet.total_of(&pid("B")), 0);

        let spending = BalanceAggregator::excluding_reimbursements()
            .aggregate(&expenses)
            .unwrap();
        assert_eq!(spending.total_of(&pid("A")), 200);
        assert_eq!(spending.total_of(&pid("B")), -100);
    }

    #[test]
    fn test_order_does_not_matter() {
        let other = Expense::new(1000, SplitPolicy::ByShares)
            .paid_by(pid("C"), 400)
            .paid_by(pid("B"), 600)
            .paid_for(pid("A"), 1)
            .paid_for(pid("B"), 3);
        let forward = BalanceAggregator::new()
            .aggregate(&[dinner(), other.clone()])
            .unwrap();
        let backward = BalanceAggregator::new().aggregate(&[other, dinner()]).unwrap();
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_payers_must_cover_amount() {
        let expense = Expense::new(300, SplitPolicy::Evenly)
            .paid_by(pid("A"), 200)
            .paid_for(pid("B"), 1);
        assert!(matches!(
            expense_balances(&expense),
            Err(SplitError::InvalidSplitInput { .. })
        ));
    }

    #[test]
    fn test_duplicate_payer_rejected() {
        let expense = Expense::new(300, SplitPolicy::Evenly)
            .paid_by(pid("A"), 100)
            .paid_by(pid("A"), 200)
            .paid_for(pid("B"), 1);
        assert!(matches!(
            expense_balances(&expense),
            Err(SplitError::InvalidSplitInput { .. })
        ));
    }

    #[test]
    fn test_missing_payers_rejected() {
        let expense = Expense::new(300, SplitPolicy::Evenly).paid_for(pid("B"), 1);
        assert!(expense_balances(&expense).is_err());
    }

    #[test]
    fn test_reimbursement_without_beneficiary_rejected() {
        let expense = Expense::new(50, SplitPolicy::Evenly)
            .as_reimbursement()
            .paid_by(pid("A"), 50);
        assert!(expense_balances(&expense).is_err());
    }

    #[test]
    fn test_empty_input() {
        let sheet = BalanceAggregator::new().aggregate(&[]).unwrap();
        assert!(sheet.is_empty());
    }
}
