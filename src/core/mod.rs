//! Ledgers over the record store.

mod collection;
/// Ledger bundle built once per process.
pub mod inventory;
/// Person CRUD.
pub mod persons;
/// Product CRUD and stock ownership.
pub mod products;
/// Sale recording, re-dating, and cancellation.
pub mod sales;
