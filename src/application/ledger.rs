use crate::domain::account::PartyAccount;
use crate::domain::amount::{Amount, Balance};
use crate::domain::command::{Call, Operation};
use crate::domain::event::LedgerEvent;
use crate::domain::loan::{Loan, LoanId};
use crate::domain::party::PartyId;
use crate::domain::ports::{Changeset, LedgerStore, LedgerStoreBox};
use crate::domain::time::{Clock, Timestamp};
use crate::error::{LedgerError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, info};

const EVENT_CAPACITY: usize = 1024;

/// What a successful call produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Receipt {
    Requested(LoanId),
    Event(LedgerEvent),
}

/// Final state of a ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerSnapshot {
    pub loans: Vec<Loan>,
    pub accounts: Vec<PartyAccount>,
}

/// Accounts touched by one operation, staged until commit.
///
/// Dropping a unit of work discards every staged transfer.
struct UnitOfWork<'a> {
    store: &'a dyn LedgerStore,
    accounts: BTreeMap<PartyId, PartyAccount>,
}

impl<'a> UnitOfWork<'a> {
    fn new(store: &'a dyn LedgerStore) -> Self {
        Self {
            store,
            accounts: BTreeMap::new(),
        }
    }

    async fn account(&mut self, party: &PartyId) -> Result<&mut PartyAccount> {
        if !self.accounts.contains_key(party) {
            let account = self
                .store
                .get_account(party)
                .await?
                .unwrap_or_else(|| PartyAccount::new(party.clone()));
            self.accounts.insert(party.clone(), account);
        }
        Ok(self
            .accounts
            .entry(party.clone())
            .or_insert_with(|| PartyAccount::new(party.clone())))
    }

    fn finish(self, loan: Loan) -> Changeset {
        Changeset {
            loan,
            accounts: self.accounts.into_values().collect(),
        }
    }
}

/// The collateralized loan ledger.
///
/// Operations are serialized through `sequencer`, which also holds the last
/// loan id handed out. Each operation validates against a private copy of the
/// loan, stages its value transfers and commits both in one changeset;
/// notifications go out only after the commit.
pub struct LoanLedger {
    store: LedgerStoreBox,
    clock: Arc<dyn Clock>,
    sequencer: Mutex<LoanId>,
    events: broadcast::Sender<LedgerEvent>,
}

impl LoanLedger {
    /// Opens a ledger over `store`, continuing the id sequence it already holds.
    pub async fn open(store: LedgerStoreBox, clock: Arc<dyn Clock>) -> Result<Self> {
        let last_id = store.last_loan_id().await?.unwrap_or(0);
        debug!(last_id, "ledger opened");
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            store,
            clock,
            sequencer: Mutex::new(last_id),
            events,
        })
    }

    /// Receives every notification committed after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Locks `value` as collateral and opens a loan against it.
    pub async fn request_loan(
        &self,
        caller: &PartyId,
        value: Balance,
        interest_rate: u32,
        duration_secs: u64,
    ) -> Result<LoanId> {
        let mut last_id = self.sequencer.lock().await;

        let collateral = Amount::new(value.value())?;
        let id = last_id
            .checked_add(1)
            .ok_or_else(|| LedgerError::InternalError("loan id space exhausted".into()))?;
        let loan = Loan::request(
            id,
            caller.clone(),
            collateral,
            interest_rate,
            duration_secs,
            self.clock.now(),
        )?;

        let mut work = UnitOfWork::new(&*self.store);
        work.account(caller).await?.lock(collateral.into());

        let due_date = loan.due_date;
        self.store.commit(work.finish(loan)).await?;
        *last_id = id;

        info!(
            loan = id,
            borrower = %caller,
            collateral = %collateral,
            interest_rate,
            %due_date,
            "loan requested"
        );
        Ok(id)
    }

    /// Funds a requested loan; the value goes straight to the borrower.
    pub async fn fund_loan(
        &self,
        caller: &PartyId,
        id: LoanId,
        value: Balance,
    ) -> Result<LedgerEvent> {
        let _guard = self.sequencer.lock().await;
        let value = value.validated()?;

        let mut loan = self.load(id).await?;
        loan.fund(caller, value)?;

        let mut work = UnitOfWork::new(&*self.store);
        work.account(caller).await?.pay(value);
        work.account(&loan.borrower).await?.receive(value);

        let event = LedgerEvent::LoanFunded {
            id,
            lender: caller.clone(),
            amount: loan.collateral_amount,
        };
        self.commit(work, loan, event).await
    }

    /// Repays a funded loan. Anyone may repay on the borrower's behalf.
    ///
    /// The whole attached value goes to the lender and the collateral goes
    /// back to the borrower.
    pub async fn repay_loan(
        &self,
        caller: &PartyId,
        id: LoanId,
        value: Balance,
    ) -> Result<LedgerEvent> {
        let _guard = self.sequencer.lock().await;
        let value = value.validated()?;

        let mut loan = self.load(id).await?;
        let lender = loan.repay(value)?;
        let collateral = Balance::from(loan.collateral_amount);

        let mut work = UnitOfWork::new(&*self.store);
        work.account(caller).await?.pay(value);
        work.account(&loan.borrower).await?.release(collateral)?;
        work.account(&lender).await?.receive(value);

        let event = LedgerEvent::LoanRepaid {
            id,
            collateral: loan.collateral_amount,
            lender,
            borrower: loan.borrower.clone(),
            repayment_amount: value,
        };
        self.commit(work, loan, event).await
    }

    /// Hands the collateral of an overdue loan to its lender.
    pub async fn claim_collateral(&self, caller: &PartyId, id: LoanId) -> Result<LedgerEvent> {
        let _guard = self.sequencer.lock().await;

        let mut loan = self.load(id).await?;
        let lender = loan.claim(caller, self.clock.now())?;
        let collateral = Balance::from(loan.collateral_amount);

        let mut work = UnitOfWork::new(&*self.store);
        work.account(&loan.borrower).await?.forfeit(collateral)?;
        work.account(&lender).await?.receive(collateral);

        let event = LedgerEvent::CollateralClaimed {
            id,
            lender,
            collateral: loan.collateral_amount,
        };
        self.commit(work, loan, event).await
    }

    /// Routes a validated call to its operation.
    pub async fn dispatch(&self, call: Call) -> Result<Receipt> {
        let Call {
            caller,
            value,
            operation,
            ..
        } = call;
        match operation {
            Operation::RequestLoan {
                interest_rate,
                duration_secs,
            } => self
                .request_loan(&caller, value, interest_rate, duration_secs)
                .await
                .map(Receipt::Requested),
            Operation::FundLoan { id } => {
                self.fund_loan(&caller, id, value).await.map(Receipt::Event)
            }
            Operation::RepayLoan { id } => {
                self.repay_loan(&caller, id, value).await.map(Receipt::Event)
            }
            Operation::ClaimCollateral { id } => {
                self.claim_collateral(&caller, id).await.map(Receipt::Event)
            }
        }
    }

    pub async fn loan(&self, id: LoanId) -> Result<Option<Loan>> {
        self.store.get_loan(id).await
    }

    /// Principal plus interest owed to close loan `id`.
    pub async fn required_repayment(&self, id: LoanId) -> Result<Balance> {
        self.load(id).await?.required_repayment()
    }

    pub async fn loans(&self) -> Result<Vec<Loan>> {
        self.store.all_loans().await
    }

    pub async fn accounts(&self) -> Result<Vec<PartyAccount>> {
        self.store.all_accounts().await
    }

    /// Consumes the ledger and returns the final state of all loans and accounts.
    pub async fn into_results(self) -> Result<LedgerSnapshot> {
        Ok(LedgerSnapshot {
            loans: self.store.all_loans().await?,
            accounts: self.store.all_accounts().await?,
        })
    }

    async fn load(&self, id: LoanId) -> Result<Loan> {
        self.store
            .get_loan(id)
            .await?
            .ok_or(LedgerError::NotFound(id))
    }

    async fn commit(
        &self,
        work: UnitOfWork<'_>,
        loan: Loan,
        event: LedgerEvent,
    ) -> Result<LedgerEvent> {
        self.store.commit(work.finish(loan)).await?;
        info!(event = event.name(), loan = event.loan_id(), "loan event committed");
        // No subscribers is fine.
        let _ = self.events.send(event.clone());
        Ok(event)
    }
}
