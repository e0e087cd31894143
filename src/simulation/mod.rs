pub mod expense_generator;
