use crate::core::balance::BalanceSheet;
use crate::core::error::{Result, SplitError};
use crate::core::participant::ParticipantId;
use crate::core::transaction::Transaction;
use log::{debug, trace};
use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Remaining magnitude first, then the smaller participant id.
type Entry = (i64, Reverse<ParticipantId>);

/// Settle net balances with as few transactions as the greedy rule allows.
///
/// # Algorithm
///
/// 1. Split participants into creditors (`total > 0`) and debtors (`total < 0`).
/// 2. Match the largest remaining creditor with the largest remaining debtor;
///    ties go to the lexically smallest participant id.
/// 3. Transfer the smaller of the two remainders and drop whoever reaches zero.
/// 4. Repeat until both sides are empty.
///
/// Every round removes at least one participant and the last round removes
/// two, so at most `participants - 1` transactions are emitted.
///
/// Fails with `ConservationViolation` if the totals do not sum to zero.
pub fn suggested_reimbursements(balances: &BalanceSheet) -> Result<Vec<Transaction>> {
    balances.ensure_balanced("simplified settlement")?;

    let mut creditors: BinaryHeap<Entry> = balances
        .creditors()?
        .into_iter()
        .map(|(participant, credit)| (credit, Reverse(participant)))
        .collect();
    let mut debtors: BinaryHeap<Entry> = balances
        .debtors()?
        .into_iter()
        .map(|(participant, debt)| (debt, Reverse(participant)))
        .collect();

    let mut transactions = Vec::new();
    loop {
        match (creditors.pop(), debtors.pop()) {
            (None, None) => break,
            (Some((credit, Reverse(creditor))), Some((debt, Reverse(debtor)))) => {
                let amount = credit.min(debt);
                trace!("{} pays {} {}", debtor, creditor, amount);
                if credit > amount {
                    creditors.push((credit - amount, Reverse(creditor.clone())));
                }
                if debt > amount {
                    debtors.push((debt - amount, Reverse(debtor.clone())));
                }
                transactions.push(Transaction::new(debtor, creditor, amount));
            }
            (Some((credit, _)), None) => {
                return Err(SplitError::conservation("simplified settlement", 0, credit));
            }
            (None, Some((debt, _))) => {
                return Err(SplitError::conservation("simplified settlement", 0, -debt));
            }
        }
    }

    verify_settles(balances, &transactions, "simplified settlement")?;
    debug!(
        "simplified settlement: {} balances, {} transactions",
        balances.len(),
        transactions.len()
    );
    Ok(transactions)
}

/// Apply `transactions` to a copy of `balances` and require every total to end at zero.
pub(crate) fn verify_settles(
    balances: &BalanceSheet,
    transactions: &[Transaction],
    context: &str,
) -> Result<()> {
    let mut check = balances.clone();
    check.apply_transactions(transactions)?;
    if let Some((participant, balance)) = check.iter().find(|(_, b)| b.total() != 0) {
        return Err(SplitError::conservation(
            format!("{context}: remaining balance of {participant}"),
            0,
            balance.net().unwrap_or(i64::MAX),
        ));
    }
    Ok(())
}
