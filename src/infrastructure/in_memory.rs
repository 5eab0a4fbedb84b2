use crate::domain::account::PartyAccount;
use crate::domain::loan::{Loan, LoanId};
use crate::domain::party::PartyId;
use crate::domain::ports::{Changeset, LedgerStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    loans: BTreeMap<LoanId, Loan>,
    accounts: BTreeMap<PartyId, PartyAccount>,
}

/// A thread-safe in-memory ledger store.
///
/// Loans and accounts live behind one `RwLock`, so a changeset is applied
/// under a single write guard. Ideal for testing or one-off replays where
/// persistence is not required.
#[derive(Default, Clone)]
pub struct InMemoryLedgerStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryLedgerStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn get_loan(&self, id: LoanId) -> Result<Option<Loan>> {
        let tables = self.tables.read().await;
        Ok(tables.loans.get(&id).cloned())
    }

    async fn get_account(&self, party: &PartyId) -> Result<Option<PartyAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.get(party).cloned())
    }

    async fn last_loan_id(&self) -> Result<Option<LoanId>> {
        let tables = self.tables.read().await;
        Ok(tables.loans.keys().next_back().copied())
    }

    async fn all_loans(&self) -> Result<Vec<Loan>> {
        let tables = self.tables.read().await;
        Ok(tables.loans.values().cloned().collect())
    }

    async fn all_accounts(&self) -> Result<Vec<PartyAccount>> {
        let tables = self.tables.read().await;
        Ok(tables.accounts.values().cloned().collect())
    }

    async fn commit(&self, changes: Changeset) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.loans.insert(changes.loan.id, changes.loan);
        for account in changes.accounts {
            tables.accounts.insert(account.party.clone(), account);
        }
        Ok(())
    }
}
