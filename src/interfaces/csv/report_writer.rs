use crate::domain::account::PartyAccount;
use crate::domain::loan::{Loan, LoanId, LoanOutcome};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct LoanRow<'a> {
    id: LoanId,
    borrower: &'a str,
    lender: Option<&'a str>,
    collateral_amount: Decimal,
    interest_rate: u32,
    due_date: u64,
    is_funded: bool,
    is_repaid: bool,
    outcome: LoanOutcome,
}

impl<'a> From<&'a Loan> for LoanRow<'a> {
    fn from(loan: &'a Loan) -> Self {
        Self {
            id: loan.id,
            borrower: loan.borrower.as_str(),
            lender: loan.lender.as_ref().map(|l| l.as_str()),
            collateral_amount: loan.collateral_amount.value().normalize(),
            interest_rate: loan.interest_rate,
            due_date: loan.due_date.seconds(),
            is_funded: loan.is_funded(),
            is_repaid: loan.is_repaid(),
            outcome: loan.outcome,
        }
    }
}

#[derive(Serialize)]
struct AccountRow<'a> {
    party: &'a str,
    spent: Decimal,
    locked: Decimal,
    received: Decimal,
}

impl<'a> From<&'a PartyAccount> for AccountRow<'a> {
    fn from(account: &'a PartyAccount) -> Self {
        Self {
            party: account.party.as_str(),
            spent: account.spent.value().normalize(),
            locked: account.locked.value().normalize(),
            received: account.received.value().normalize(),
        }
    }
}

/// Writes end-of-run ledger reports as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One row per loan, ordered by id.
    pub fn write_loans(&mut self, mut loans: Vec<Loan>) -> Result<()> {
        loans.sort_by_key(|l| l.id);
        for loan in &loans {
            self.writer.serialize(LoanRow::from(loan))?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// One row per party, ordered by party id.
    pub fn write_accounts(&mut self, mut accounts: Vec<PartyAccount>) -> Result<()> {
        accounts.sort_by(|a, b| a.party.cmp(&b.party));
        for account in &accounts {
            self.writer.serialize(AccountRow::from(account))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
