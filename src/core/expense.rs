use crate::core::participant::ParticipantId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// Scale of `ByPercentage` weights: `10000` is 100%.
pub const PERCENTAGE_SCALE: i64 = 10_000;

/// How an expense's amount maps onto its beneficiaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitPolicy {
    /// Equal parts; weights are ignored.
    Evenly,
    /// Each weight is the participant's share in minor units.
    ByAmount,
    /// Each weight is a percentage scaled by [`PERCENTAGE_SCALE`].
    ByPercentage,
    /// Each weight is a relative number of shares.
    ByShares,
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitPolicy::Evenly => "evenly",
            SplitPolicy::ByAmount => "by_amount",
            SplitPolicy::ByPercentage => "by_percentage",
            SplitPolicy::ByShares => "by_shares",
        };
        f.write_str(name)
    }
}

/// A participant who funded (part of) an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    pub participant: ParticipantId,
    /// Amount funded, in minor units.
    pub amount: i64,
}

/// A beneficiary of an expense with its policy-specific weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidFor {
    pub participant: ParticipantId,
    pub weight: i64,
}

/// An immutable expense record.
///
/// `amount` is in minor units and may be negative for refunds. `payers`
/// say who funded it and `paid_for` who benefits from it; both lists keep
/// the order they were given in, which matters for remainder placement.
///
/// # Examples
///
/// ```
/// use split_engine::core::expense::{Expense, SplitPolicy};
/// use split_engine::core::participant::ParticipantId;
///
/// let dinner = Expense::new(9000, SplitPolicy::Evenly)
///     .paid_by(ParticipantId::new("alice"), 9000)
///     .paid_for(ParticipantId::new("alice"), 1)
///     .paid_for(ParticipantId::new("bob"), 1)
///     .paid_for(ParticipantId::new("carol"), 1);
///
/// assert_eq!(dinner.amount(), 9000);
/// assert_eq!(dinner.beneficiaries().len(), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    id: Uuid,
    amount: i64,
    #[serde(default)]
    is_reimbursement: bool,
    split_policy: SplitPolicy,
    payers: Vec<Payer>,
    paid_for: Vec<PaidFor>,
    /// Only used to seed remainder placement.
    #[serde(default)]
    date: Option<NaiveDate>,
}

impl Expense {
    /// Create an expense with a fresh id and no payers or beneficiaries.
    pub fn new(amount: i64, split_policy: SplitPolicy) -> Self {
        Self::with_id(Uuid::new_v4(), amount, split_policy)
    }

    /// Create an expense with a specific ID (useful for testing / determinism).
    pub fn with_id(id: Uuid, amount: i64, split_policy: SplitPolicy) -> Self {
        Self {
            id,
            amount,
            is_reimbursement: false,
            split_policy,
            payers: Vec::new(),
            paid_for: Vec::new(),
            date: None,
        }
    }

    /// A reimbursement: `from` hands `amount` back to `to`.
    pub fn reimbursement(from: ParticipantId, to: ParticipantId, amount: i64) -> Self {
        Self::new(amount, SplitPolicy::Evenly)
            .as_reimbursement()
            .paid_by(from, amount)
            .paid_for(to, 1)
    }

    pub fn paid_by(mut self, participant: ParticipantId, amount: i64) -> Self {
        self.payers.push(Payer {
            participant,
            amount,
        });
        self
    }

    pub fn paid_for(mut self, participant: ParticipantId, weight: i64) -> Self {
        self.paid_for.push(PaidFor {
            participant,
            weight,
        });
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn as_reimbursement(mut self) -> Self {
        self.is_reimbursement = true;
        self
    }

    // --- Accessors ---

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn is_reimbursement(&self) -> bool {
        self.is_reimbursement
    }

    pub fn split_policy(&self) -> SplitPolicy {
        self.split_policy
    }

    pub fn payers(&self) -> &[Payer] {
        &self.payers
    }

    pub fn beneficiaries(&self) -> &[PaidFor] {
        &self.paid_for
    }

    pub fn date(&self) -> Option<NaiveDate> {
        self.date
    }

    /// Every participant named by this expense, sorted and deduplicated.
    pub fn participants(&self) -> Vec<ParticipantId> {
        let set: BTreeSet<&ParticipantId> = self
            .payers
            .iter()
            .map(|p| &p.participant)
            .chain(self.paid_for.iter().map(|p| &p.participant))
            .collect();
        set.into_iter().cloned().collect()
    }
}

/// An ordered collection of expenses, typically one group's history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSet {
    expenses: Vec<Expense>,
}

impl ExpenseSet {
    pub fn new() -> Self {
        Self {
            expenses: Vec::new(),
        }
    }

    pub fn add(&mut self, expense: Expense) {
        self.expenses.push(expense);
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn len(&self) -> usize {
        self.expenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expenses.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Expense> {
        self.expenses.iter()
    }

    /// All unique participants referenced in this set.
    pub fn participants(&self) -> Vec<ParticipantId> {
        let set: BTreeSet<ParticipantId> = self
            .expenses
            .iter()
            .flat_map(|e| e.participants())
            .collect();
        set.into_iter().collect()
    }
}

impl FromIterator<Expense> for ExpenseSet {
    fn from_iter<T: IntoIterator<Item = Expense>>(iter: T) -> Self {
        Self {
            expenses: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ExpenseSet {
    type Item = &'a Expense;
    type IntoIter = std::slice::Iter<'a, Expense>;

    fn into_iter(self) -> Self::IntoIter {
        self.expenses.iter()
    }
}
