//! Share allocation: one expense in, exact integer shares out.

pub mod allocator;
pub mod hash_sequence;

use crate::core::error::Result;
use crate::core::expense::Expense;

pub use allocator::{ShareAllocation, ShareAllocator};

/// Split one expense into exact per-participant shares.
///
/// Shorthand for [`ShareAllocator::allocate`].
pub fn allocate_shares(expense: &Expense) -> Result<ShareAllocation> {
    ShareAllocator::allocate(expense)
}
