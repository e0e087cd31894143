use crate::core::balance::BalanceSheet;
use crate::core::error::{Result, SplitError};
use crate::core::expense::Expense;
use crate::core::participant::ParticipantId;
use crate::core::transaction::Transaction;
use crate::settlement::aggregator::expense_balances;
use crate::settlement::simplified::verify_settles;
use log::{debug, trace};
use std::collections::{BTreeMap, BTreeSet};

/// Pairwise debts between participants, netted per pair.
///
/// Each unordered pair holds a single signed amount, so a debt in one
/// direction first cancels any debt in the opposite direction. This is how a
/// reimbursement reduces what its payer owed the recipient.
///
/// # Examples
///
/// ```
/// use split_engine::settlement::direct::DebtGraph;
/// use split_engine::core::participant::ParticipantId;
///
/// let a = ParticipantId::new("A");
/// let b = ParticipantId::new("B");
///
/// let mut graph = DebtGraph::new();
/// graph.add_debt(&a, &b, 100).unwrap();
/// graph.add_debt(&b, &a, 60).unwrap();
///
/// assert_eq!(graph.debt(&a, &b), 40);
/// assert_eq!(graph.debt(&b, &a), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DebtGraph {
    /// (lower id, higher id) -> amount; positive means lower owes higher.
    edges: BTreeMap<(ParticipantId, ParticipantId), i64>,
    participants: BTreeSet<ParticipantId>,
}

impl DebtGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `debtor` owes `creditor` `amount` more.
    pub fn add_debt(
        &mut self,
        debtor: &ParticipantId,
        creditor: &ParticipantId,
        amount: i64,
    ) -> Result<()> {
        if debtor == creditor || amount == 0 {
            return Ok(());
        }
        self.participants.insert(debtor.clone());
        self.participants.insert(creditor.clone());

        let (key, delta) = if debtor < creditor {
            ((debtor.clone(), creditor.clone()), amount)
        } else {
            ((creditor.clone(), debtor.clone()), -amount)
        };
        let current = self.edges.get(&key).copied().unwrap_or(0);
        let updated = current.checked_add(delta).ok_or_else(|| {
            let context = format!("debt between {debtor} and {creditor}");
            SplitError::conservation(context, current, delta)
        })?;
        if updated == 0 {
            self.edges.remove(&key);
        } else {
            self.edges.insert(key, updated);
        }
        Ok(())
    }

    /// Outstanding amount `debtor` owes `creditor` (zero if the pair nets the other way).
    pub fn debt(&self, debtor: &ParticipantId, creditor: &ParticipantId) -> i64 {
        if debtor == creditor {
            return 0;
        }
        let signed = if debtor < creditor {
            self.edges
                .get(&(debtor.clone(), creditor.clone()))
                .copied()
                .unwrap_or(0)
        } else {
            -self
                .edges
                .get(&(creditor.clone(), debtor.clone()))
                .copied()
                .unwrap_or(0)
        };
        signed.max(0)
    }

    /// Number of participants that ever took part in a debt.
    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    /// Number of pairs with an outstanding debt.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Outstanding debts as transactions, ordered by (lower id, higher id).
    pub fn transactions(&self) -> Vec<Transaction> {
        self.edges
            .iter()
            .map(|((low, high), amount)| {
                if *amount > 0 {
                    Transaction::new(low.clone(), high.clone(), *amount)
                } else {
                    Transaction::new(high.clone(), low.clone(), -*amount)
                }
            })
            .collect()
    }

    /// Add the debts created by one expense.
    ///
    /// Each participant's net for the expense is `paid - share`. Every debtor
    /// owes every creditor in proportion to that creditor's net, so with a
    /// single payer each beneficiary owes the payer exactly their share.
    pub fn add_expense(&mut self, expense: &Expense) -> Result<BalanceSheet> {
        let nets = expense_balances(expense)?;
        let context = format!("debts of expense {}", expense.id());
        let debtors = nets.debtors()?;
        let creditors = nets.creditors()?;
        for (debtor, creditor, amount) in pro_rata(&debtors, &creditors, &context)? {
            trace!("expense {}: {} owes {} {}", expense.id(), debtor, creditor, amount);
            self.add_debt(debtor, creditor, amount)?;
        }
        Ok(nets)
    }
}

/// Spread every debt over the creditors in proportion to their credit.
///
/// Each amount starts at the floor of its exact proportional value. The units
/// a debtor still owes go to the creditors with the most credit left
/// unassigned, lower id first, which keeps both every debtor's and every
/// creditor's total exact.
fn pro_rata<'a>(
    debtors: &'a [(ParticipantId, i64)],
    creditors: &'a [(ParticipantId, i64)],
    context: &str,
) -> Result<Vec<(&'a ParticipantId, &'a ParticipantId, i64)>> {
    let credit_total: i128 = creditors.iter().map(|(_, c)| i128::from(*c)).sum();
    let debt_total: i128 = debtors.iter().map(|(_, d)| i128::from(*d)).sum();
    if credit_total != debt_total {
        return Err(SplitError::conservation(
            context,
            clamp(credit_total),
            clamp(debt_total),
        ));
    }
    if credit_total == 0 {
        return Ok(Vec::new());
    }

    let mut rows: Vec<Vec<i128>> = debtors
        .iter()
        .map(|(_, debt)| {
            creditors
                .iter()
                .map(|(_, credit)| i128::from(*debt) * i128::from(*credit) / credit_total)
                .collect()
        })
        .collect();
    let mut room: Vec<i128> = creditors
        .iter()
        .enumerate()
        .map(|(j, (_, credit))| {
            i128::from(*credit) - rows.iter().map(|row| row[j]).sum::<i128>()
        })
        .collect();

    for (row, (_, debt)) in rows.iter_mut().zip(debtors) {
        let left = i128::from(*debt) - row.iter().sum::<i128>();
        let mut order: Vec<usize> = (0..creditors.len()).collect();
        order.sort_by(|&a, &b| room[b].cmp(&room[a]).then(a.cmp(&b)));
        for &j in order.iter().take(usize::try_from(left).unwrap_or(0)) {
            row[j] += 1;
            room[j] -= 1;
        }
        let placed: i128 = row.iter().sum();
        if placed != i128::from(*debt) {
            return Err(SplitError::conservation(context, *debt, clamp(placed)));
        }
    }
    if let Some(left) = room.iter().find(|r| **r != 0) {
        return Err(SplitError::conservation(context, 0, clamp(*left)));
    }

    let mut debts = Vec::new();
    for ((debtor, _), row) in debtors.iter().zip(rows) {
        for ((creditor, _), amount) in creditors.iter().zip(row) {
            if amount != 0 {
                // Bounded by the debtor's own debt.
                debts.push((debtor, creditor, amount as i64));
            }
        }
    }
    Ok(debts)
}

fn clamp(value: i128) -> i64 {
    i64::try_from(value).unwrap_or(if value > 0 { i64::MAX } else { i64::MIN })
}

/// Settle by the original debts: who owes whom because of which expense.
///
/// Every expense contributes its payer/beneficiary debts to a [`DebtGraph`].
/// A reimbursement is an ordinary debt in the opposite direction and nets
/// against what the pair already owes; paying back more than owed flips the
/// direction of the remainder.
///
/// The output is verified against the balances of the same expenses.
pub fn direct_reimbursements<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
) -> Result<Vec<Transaction>> {
    let mut graph = DebtGraph::new();
    let mut balances = BalanceSheet::new();
    for expense in expenses {
        let nets = graph.add_expense(expense)?;
        balances.merge(&nets)?;
    }
    balances.ensure_balanced("direct settlement")?;

    let transactions = graph.transactions();
    verify_settles(&balances, &transactions, "direct settlement")?;
    debug!(
        "direct settlement: {} participants, {} transactions",
        graph.participant_count(),
        transactions.len()
    );
    Ok(transactions)
}
