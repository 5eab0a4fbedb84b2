use crate::domain::amount::{Amount, Balance};
use crate::domain::party::PartyId;
use crate::domain::time::Timestamp;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type LoanId = u64;

/// How a loan was closed, if it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanOutcome {
    #[default]
    Open,
    Repaid,
    Claimed,
}

impl fmt::Display for LoanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanOutcome::Open => "open",
            LoanOutcome::Repaid => "repaid",
            LoanOutcome::Claimed => "claimed",
        };
        f.write_str(s)
    }
}

/// Position of a loan in its lifecycle: `Requested -> Funded -> Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanState {
    Requested,
    Funded,
    Resolved,
}

impl fmt::Display for LoanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanState::Requested => "not funded",
            LoanState::Funded => "already funded",
            LoanState::Resolved => "already resolved",
        };
        f.write_str(s)
    }
}

/// A single collateralized loan.
///
/// Transition methods check every precondition before touching a field, so a
/// failed transition leaves the loan exactly as it was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub borrower: PartyId,
    pub lender: Option<PartyId>,
    pub collateral_amount: Amount,
    pub interest_rate: u32,
    pub due_date: Timestamp,
    pub outcome: LoanOutcome,
}

impl Loan {
    /// Opens a new, unfunded loan backed by `collateral`.
    pub fn request(
        id: LoanId,
        borrower: PartyId,
        collateral: Amount,
        interest_rate: u32,
        duration_secs: u64,
        now: Timestamp,
    ) -> Result<Self> {
        // A loan whose repayment cannot be represented could never be repaid.
        collateral.with_interest(interest_rate)?;
        Ok(Self {
            id,
            borrower,
            lender: None,
            collateral_amount: collateral,
            interest_rate,
            due_date: now.after(duration_secs)?,
            outcome: LoanOutcome::Open,
        })
    }

    pub fn is_funded(&self) -> bool {
        self.lender.is_some()
    }

    /// True once the loan is closed, whether by repayment or by claim.
    pub fn is_repaid(&self) -> bool {
        self.outcome != LoanOutcome::Open
    }

    pub fn state(&self) -> LoanState {
        if self.is_repaid() {
            LoanState::Resolved
        } else if self.is_funded() {
            LoanState::Funded
        } else {
            LoanState::Requested
        }
    }

    pub fn required_repayment(&self) -> Result<Balance> {
        self.collateral_amount.with_interest(self.interest_rate)
    }

    fn expect_state(&self, expected: LoanState, operation: &'static str) -> Result<()> {
        let state = self.state();
        if state == expected {
            Ok(())
        } else {
            Err(LedgerError::InvalidState {
                id: self.id,
                state,
                operation,
            })
        }
    }

    fn lender_or_err(&self, operation: &'static str) -> Result<&PartyId> {
        self.lender.as_ref().ok_or(LedgerError::InvalidState {
            id: self.id,
            state: LoanState::Requested,
            operation,
        })
    }

    /// Records `lender` as the funder. The value must match the collateral exactly.
    pub fn fund(&mut self, lender: &PartyId, value: Balance) -> Result<()> {
        self.expect_state(LoanState::Requested, "fund")?;
        if value != self.collateral_amount {
            return Err(LedgerError::InvalidValue(format!(
                "loan {} must be funded with exactly {}, got {}",
                self.id, self.collateral_amount, value
            )));
        }
        self.lender = Some(lender.clone());
        Ok(())
    }

    /// Closes the loan cooperatively. Returns the lender to be paid.
    pub fn repay(&mut self, value: Balance) -> Result<PartyId> {
        self.expect_state(LoanState::Funded, "repay")?;
        let required = self.required_repayment()?;
        if value < required {
            return Err(LedgerError::InvalidValue(format!(
                "loan {} requires a repayment of {}, got {}",
                self.id, required, value
            )));
        }
        let lender = self.lender_or_err("repay")?.clone();
        self.outcome = LoanOutcome::Repaid;
        Ok(lender)
    }

    /// Closes the loan by default. Only the lender may claim, and only once due.
    pub fn claim(&mut self, caller: &PartyId, now: Timestamp) -> Result<PartyId> {
        self.expect_state(LoanState::Funded, "claim collateral of")?;
        let lender = self.lender_or_err("claim collateral of")?;
        if lender != caller {
            return Err(LedgerError::Unauthorized {
                id: self.id,
                caller: caller.clone(),
            });
        }
        if now < self.due_date {
            return Err(LedgerError::NotDue {
                id: self.id,
                due_date: self.due_date,
                now,
            });
        }
        let lender = lender.clone();
        self.outcome = LoanOutcome::Claimed;
        Ok(lender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const DAY: u64 = 24 * 3600;

    fn party(name: &str) -> PartyId {
        PartyId::new(name).unwrap()
    }

    fn requested() -> Loan {
        Loan::request(
            1,
            party("borrower"),
            Amount::new(dec!(1.5)).unwrap(),
            10,
            10 * DAY,
            Timestamp(1_000),
        )
        .unwrap()
    }

    fn funded() -> Loan {
        let mut loan = requested();
        loan.fund(&party("lender"), Balance::new(dec!(1.5))).unwrap();
        loan
    }

    #[test]
    fn test_request_initial_state() {
        let loan = requested();
        assert_eq!(loan.collateral_amount, Amount::new(dec!(1.5)).unwrap());
        assert_eq!(loan.due_date, Timestamp(1_000 + 10 * DAY));
        assert!(!loan.is_funded());
        assert!(!loan.is_repaid());
        assert_eq!(loan.lender, None);
        assert_eq!(loan.state(), LoanState::Requested);
    }

    #[test]
    fn test_request_with_unrepresentable_repayment_is_rejected() {
        let result = Loan::request(
            1,
            party("borrower"),
            Amount::new(dec!(70000000000000000000000000000)).unwrap(),
            50,
            DAY,
            Timestamp(1_000),
        );
        assert!(matches!(result, Err(LedgerError::InvalidValue(_))));
    }

    #[test]
    fn test_fund_sets_lender_once() {
        let mut loan = funded();
        assert_eq!(loan.lender, Some(party("lender")));
        assert_eq!(loan.state(), LoanState::Funded);

        let err = loan
            .fund(&party("other"), Balance::new(dec!(1.5)))
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidState {
                state: LoanState::Funded,
                ..
            }
        ));
        assert_eq!(loan.lender, Some(party("lender")));
    }

    #[test]
    fn test_fund_value_mismatch_leaves_loan_untouched() {
        let mut loan = requested();
        for value in [dec!(1.4), dec!(1.6), dec!(0)] {
            let err = loan.fund(&party("lender"), Balance::new(value)).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidValue(_)));
        }
        assert_eq!(loan, requested());
    }

    #[test]
    fn test_repay_boundary() {
        let mut loan = funded();
        assert_eq!(loan.required_repayment().unwrap(), Balance::new(dec!(1.65)));

        let err = loan.repay(Balance::new(dec!(1.649999))).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidValue(_)));
        assert!(!loan.is_repaid());

        let lender = loan.repay(Balance::new(dec!(1.65))).unwrap();
        assert_eq!(lender, party("lender"));
        assert_eq!(loan.outcome, LoanOutcome::Repaid);
        assert!(loan.is_repaid());
    }

    #[test]
    fn test_repay_overpayment_accepted() {
        let mut loan = funded();
        assert!(loan.repay(Balance::new(dec!(2))).is_ok());
    }

    #[test]
    fn test_repay_requires_funding() {
        let mut loan = requested();
        let err = loan.repay(Balance::new(dec!(100))).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InvalidState {
                state: LoanState::Requested,
                ..
            }
        ));
    }

    #[test]
    fn test_claim_before_due_fails() {
        let mut loan = funded();
        let just_before = Timestamp(loan.due_date.0 - 1);
        let err = loan.claim(&party("lender"), just_before).unwrap_err();
        assert!(matches!(err, LedgerError::NotDue { .. }));
        assert!(!loan.is_repaid());
    }

    #[test]
    fn test_claim_at_due_date_succeeds() {
        let mut loan = funded();
        let due = loan.due_date;
        loan.claim(&party("lender"), due).unwrap();
        assert_eq!(loan.outcome, LoanOutcome::Claimed);
        assert!(loan.is_repaid());
    }

    #[test]
    fn test_claim_by_non_lender_is_unauthorized() {
        let mut loan = funded();
        let due = loan.due_date;
        let err = loan.claim(&party("borrower"), due).unwrap_err();
        assert!(matches!(err, LedgerError::Unauthorized { .. }));
    }

    #[test]
    fn test_claim_requires_funding() {
        let mut loan = requested();
        let err = loan.claim(&party("lender"), Timestamp(u64::MAX)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidState { .. }));
    }

    #[test]
    fn test_terminal_state_blocks_everything() {
        let mut repaid = funded();
        repaid.repay(Balance::new(dec!(1.65))).unwrap();
        let mut claimed = funded();
        let due = claimed.due_date;
        claimed.claim(&party("lender"), due).unwrap();

        for loan in [&mut repaid, &mut claimed] {
            let before = loan.clone();
            let resolved = |e: LedgerError| {
                matches!(
                    e,
                    LedgerError::InvalidState {
                        state: LoanState::Resolved,
                        ..
                    }
                )
            };
            assert!(resolved(
                loan.fund(&party("x"), Balance::new(dec!(1.5))).unwrap_err()
            ));
            assert!(resolved(loan.repay(Balance::new(dec!(10))).unwrap_err()));
            assert!(resolved(
                loan.claim(&party("lender"), Timestamp(u64::MAX)).unwrap_err()
            ));
            assert_eq!(*loan, before);
        }
    }

    #[test]
    fn test_zero_duration_is_due_immediately() {
        let mut loan = Loan::request(
            1,
            party("borrower"),
            Amount::new(dec!(1.5)).unwrap(),
            10,
            0,
            Timestamp(500),
        )
        .unwrap();
        loan.fund(&party("lender"), Balance::new(dec!(1.5))).unwrap();
        assert!(loan.claim(&party("lender"), Timestamp(500)).is_ok());
    }
}
