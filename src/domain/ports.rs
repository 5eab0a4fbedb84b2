use super::account::PartyAccount;
use super::loan::{Loan, LoanId};
use super::party::PartyId;
use crate::error::Result;
use async_trait::async_trait;

/// Everything one ledger operation writes.
///
/// A store applies a changeset entirely or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct Changeset {
    pub loan: Loan,
    pub accounts: Vec<PartyAccount>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_loan(&self, id: LoanId) -> Result<Option<Loan>>;
    async fn get_account(&self, party: &PartyId) -> Result<Option<PartyAccount>>;
    /// Highest loan id ever stored.
    async fn last_loan_id(&self) -> Result<Option<LoanId>>;
    async fn all_loans(&self) -> Result<Vec<Loan>>;
    async fn all_accounts(&self) -> Result<Vec<PartyAccount>>;
    async fn commit(&self, changes: Changeset) -> Result<()>;
}

pub type LedgerStoreBox = Box<dyn LedgerStore>;
