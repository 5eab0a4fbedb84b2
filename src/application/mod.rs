//! Application layer containing the loan ledger.
//!
//! This module defines the `LoanLedger`, the single entry point for the four
//! loan operations. It serializes operations behind a `tokio` mutex and fans
//! committed notifications out over a broadcast channel.

pub mod ledger;
