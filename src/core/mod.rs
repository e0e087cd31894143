pub mod amount;
pub mod balance;
pub mod error;
pub mod expense;
pub mod participant;
pub mod rational;
pub mod transaction;
