use crate::core::amount::format_minor;
use crate::core::error::{Result, SplitError};
use crate::core::expense::ExpenseSet;
use crate::core::participant::ParticipantId;
use crate::settlement::aggregator::BalanceAggregator;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a group spent and who carried it.
///
/// Reimbursements only move money between participants, so they are left out
/// of every figure here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpendingSummary {
    /// Sum of all non-reimbursement expense amounts.
    pub group_total: i64,
    /// Amount each participant paid out of pocket.
    pub paid: BTreeMap<ParticipantId, i64>,
    /// Each participant's share of the spending.
    pub share: BTreeMap<ParticipantId, i64>,
    /// Decimal places used by the `Display` impl.
    #[serde(skip, default = "default_decimals")]
    pub decimals: u32,
}

fn default_decimals() -> u32 {
    crate::core::amount::DEFAULT_DECIMALS
}

impl SpendingSummary {
    pub fn from_expenses(expenses: &ExpenseSet) -> Result<Self> {
        let sheet = BalanceAggregator::excluding_reimbursements().aggregate(expenses)?;
        let mut group_total: i64 = 0;
        for expense in expenses.iter().filter(|e| !e.is_reimbursement()) {
            group_total = group_total.checked_add(expense.amount()).ok_or_else(|| {
                SplitError::conservation("group spending total", group_total, expense.amount())
            })?;
        }

        let mut paid = BTreeMap::new();
        let mut share = BTreeMap::new();
        for (participant, balance) in sheet.iter() {
            paid.insert(participant.clone(), balance.paid);
            share.insert(participant.clone(), balance.owed);
        }

        Ok(SpendingSummary {
            group_total,
            paid,
            share,
            decimals: default_decimals(),
        })
    }

    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    pub fn paid_by(&self, participant: &ParticipantId) -> i64 {
        self.paid.get(participant).copied().unwrap_or(0)
    }

    pub fn share_of(&self, participant: &ParticipantId) -> i64 {
        self.share.get(participant).copied().unwrap_or(0)
    }

    /// Share of the group total carried by `participant`, in percent.
    ///
    /// Display only; never feed this back into a computation.
    pub fn share_percent(&self, participant: &ParticipantId) -> f64 {
        if self.group_total == 0 {
            return 0.0;
        }
        self.share_of(participant) as f64 * 100.0 / self.group_total as f64
    }
}

impl std::fmt::Display for SpendingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Spending Summary ===")?;
        writeln!(f, "Group Total: {}", format_minor(self.group_total, self.decimals))?;

        writeln!(f, "\nPer Participant:")?;
        for (participant, share) in &self.share {
            writeln!(
                f,
                "  {:<12} paid {:>12}  share {:>12} ({:.1}%)",
                participant,
                format_minor(self.paid_by(participant), self.decimals),
                format_minor(*share, self.decimals),
                self.share_percent(participant)
            )?;
        }
        Ok(())
    }
}
