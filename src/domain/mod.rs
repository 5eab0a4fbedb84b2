//! Domain model: loans, value types and the ports the ledger persists through.

pub mod account;
pub mod amount;
pub mod command;
pub mod event;
pub mod loan;
pub mod party;
pub mod ports;
pub mod time;
