use crate::core::participant::ParticipantId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A settling payment: `from` owes `to` a positive `amount` of minor units.
///
/// Transactions are computed fresh on every settlement and never stored by
/// the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Transaction {
    pub from: ParticipantId,
    pub to: ParticipantId,
    pub amount: i64,
}

impl Transaction {
    pub fn new(from: ParticipantId, to: ParticipantId, amount: i64) -> Self {
        Self { from, to, amount }
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}: {}", self.from, self.to, self.amount)
    }
}

/// Sum of all transaction amounts.
pub fn total_transferred(transactions: &[Transaction]) -> i64 {
    transactions.iter().map(|t| t.amount).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_display() {
        let t = Transaction::new(ParticipantId::new("B"), ParticipantId::new("A"), 100);
        assert_eq!(t.to_string(), "B -> A: 100");
    }

    #[test]
    fn test_total_transferred() {
        let txs = vec![
            Transaction::new("B".into(), "A".into(), 100),
            Transaction::new("C".into(), "A".into(), 150),
        ];
        assert_eq!(total_transferred(&txs), 250);
        assert_eq!(total_transferred(&[]), 0);
    }
}
