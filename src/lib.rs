//! # split-engine
//!
//! Deterministic expense splitting and debt settlement.
//!
//! Given expenses split between participants under a split policy, this
//! engine computes every participant's exact share in integer minor units,
//! aggregates net balances, and produces the transactions that settle them.
//!
//! ## Architecture
//!
//! - **core** — Foundational types: participants, expenses, balances, transactions, rationals
//! - **allocation** — Exact per-expense shares with deterministic remainder placement
//! - **settlement** — Balance aggregation, direct and simplified settlement strategies
//! - **analysis** — Spending figures per group and participant
//! - **simulation** — Random expense histories for stress testing
//!
//! The engine is pure: no I/O, no shared state, no floating point in any
//! amount computation.

pub mod allocation;
pub mod analysis;
pub mod core;
pub mod settlement;
pub mod simulation;

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::allocation::{allocate_shares, ShareAllocation, ShareAllocator};
    pub use crate::core::balance::{Balance, BalanceSheet};
    pub use crate::core::error::{Result, SplitError};
    pub use crate::core::expense::{Expense, ExpenseSet, PaidFor, Payer, SplitPolicy};
    pub use crate::core::participant::ParticipantId;
    pub use crate::core::transaction::Transaction;
    pub use crate::settlement::{
        aggregate_balances, direct_reimbursements, settle, suggested_reimbursements,
        GroupSettings, SettlementEngine, SettlementPlan, SettlementStrategy,
    };
}
