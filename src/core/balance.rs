use crate::core::error::{Result, SplitError};
use crate::core::participant::ParticipantId;
use crate::core::transaction::Transaction;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A participant's aggregate position over a set of expenses.
///
/// `total` is always derived as `paid - owed`: positive means the group owes
/// the participant, negative means the participant owes the group.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct Balance {
    pub paid: i64,
    pub owed: i64,
}

impl Balance {
    pub fn new(paid: i64, owed: i64) -> Self {
        Self { paid, owed }
    }

    /// `paid - owed`, widened so that it cannot overflow.
    pub fn total(&self) -> i128 {
        self.paid as i128 - self.owed as i128
    }

    /// The total in minor units, if it fits in an `i64`.
    pub fn net(&self) -> Option<i64> {
        i64::try_from(self.total()).ok()
    }
}

impl Serialize for Balance {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("Balance", 3)?;
        state.serialize_field("paid", &self.paid)?;
        state.serialize_field("owed", &self.owed)?;
        state.serialize_field("total", &self.total())?;
        state.end()
    }
}

/// Balances of every participant, keyed and iterated in participant order.
///
/// The sheet is the output of aggregation and the input of the simplified
/// settlement. A consistent sheet is balanced: all totals sum to zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BalanceSheet {
    balances: BTreeMap<ParticipantId, Balance>,
}

impl BalanceSheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` to what `participant` paid.
    ///
    /// Fails with `ConservationViolation`, leaving the balance untouched, if
    /// `paid` or the resulting total no longer fits in minor units.
    pub fn record_paid(&mut self, participant: &ParticipantId, amount: i64) -> Result<()> {
        let entry = self.balances.entry(participant.clone()).or_default();
        let paid = checked_add(entry.paid, amount, participant)?;
        *entry = fitting(Balance::new(paid, entry.owed), participant)?;
        Ok(())
    }

    /// Add `amount` to what `participant` owes. Same overflow rule as `record_paid`.
    pub fn record_owed(&mut self, participant: &ParticipantId, amount: i64) -> Result<()> {
        let entry = self.balances.entry(participant.clone()).or_default();
        let owed = checked_add(entry.owed, amount, participant)?;
        *entry = fitting(Balance::new(entry.paid, owed), participant)?;
        Ok(())
    }

    pub fn get(&self, participant: &ParticipantId) -> Option<&Balance> {
        self.balances.get(participant)
    }

    /// Net total of a participant; zero for an unknown participant.
    pub fn total_of(&self, participant: &ParticipantId) -> i128 {
        self.balances
            .get(participant)
            .map(Balance::total)
            .unwrap_or(0)
    }

    pub fn contains(&self, participant: &ParticipantId) -> bool {
        self.balances.contains_key(participant)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ParticipantId, &Balance)> {
        self.balances.iter()
    }

    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }

    /// Sum of all totals.
    pub fn net_sum(&self) -> i128 {
        self.balances.values().map(Balance::total).sum()
    }

    pub fn is_balanced(&self) -> bool {
        self.net_sum() == 0
    }

    /// Fail with `ConservationViolation` unless all totals sum to zero.
    pub fn ensure_balanced(&self, context: &str) -> Result<()> {
        let sum = self.net_sum();
        if sum != 0 {
            return Err(SplitError::conservation(context, 0, clamp(sum)));
        }
        Ok(())
    }

    /// True when every participant's total is zero.
    pub fn is_settled(&self) -> bool {
        self.balances.values().all(|b| b.total() == 0)
    }

    /// Participants the group owes money to, with their (positive) totals.
    pub fn creditors(&self) -> Result<Vec<(ParticipantId, i64)>> {
        self.balances
            .iter()
            .filter(|(_, b)| b.total() > 0)
            .map(|(p, b)| Ok((p.clone(), narrow(b, p)?)))
            .collect()
    }

    /// Participants who owe the group, with the amounts they owe (positive).
    pub fn debtors(&self) -> Result<Vec<(ParticipantId, i64)>> {
        self.balances
            .iter()
            .filter(|(_, b)| b.total() < 0)
            .map(|(p, b)| {
                let owes = i64::try_from(-b.total()).map_err(|_| overflow(p, -b.total()))?;
                Ok((p.clone(), owes))
            })
            .collect()
    }

    /// Record a settling payment: `from` pays `to`, moving both totals toward zero.
    ///
    /// Both participants must already be on the sheet.
    pub fn apply_transaction(&mut self, transaction: &Transaction) -> Result<()> {
        for participant in [&transaction.from, &transaction.to] {
            if !self.contains(participant) {
                return Err(SplitError::UnknownParticipant {
                    participant: participant.clone(),
                });
            }
        }
        self.record_paid(&transaction.from, transaction.amount)?;
        self.record_owed(&transaction.to, transaction.amount)
    }

    /// Add every balance of `other` into this sheet.
    pub fn merge(&mut self, other: &BalanceSheet) -> Result<()> {
        for (participant, balance) in other.iter() {
            self.record_paid(participant, balance.paid)?;
            self.record_owed(participant, balance.owed)?;
        }
        Ok(())
    }

    pub fn apply_transactions<'a>(
        &mut self,
        transactions: impl IntoIterator<Item = &'a Transaction>,
    ) -> Result<()> {
        for transaction in transactions {
            self.apply_transaction(transaction)?;
        }
        Ok(())
    }
}

impl FromIterator<(ParticipantId, Balance)> for BalanceSheet {
    fn from_iter<T: IntoIterator<Item = (ParticipantId, Balance)>>(iter: T) -> Self {
        Self {
            balances: iter.into_iter().collect(),
        }
    }
}

fn checked_add(current: i64, amount: i64, participant: &ParticipantId) -> Result<i64> {
    current
        .checked_add(amount)
        .ok_or_else(|| overflow(participant, current as i128 + amount as i128))
}

/// Reject a balance whose total does not fit in minor units.
fn fitting(balance: Balance, participant: &ParticipantId) -> Result<Balance> {
    narrow(&balance, participant)?;
    Ok(balance)
}

fn narrow(balance: &Balance, participant: &ParticipantId) -> Result<i64> {
    balance
        .net()
        .ok_or_else(|| overflow(participant, balance.total()))
}

fn overflow(participant: &ParticipantId, value: i128) -> SplitError {
    SplitError::conservation(
        format!("balance of {participant} overflowed"),
        0,
        clamp(value),
    )
}

/// Saturate an `i128` into the `i64` range for error reporting.
fn clamp(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value > 0 { i64::MAX } else { i64::MIN })
}
