use crate::domain::amount::{Amount, Balance};
use crate::domain::loan::LoanId;
use crate::domain::party::PartyId;
use serde::{Deserialize, Serialize};

/// Notifications emitted by committed ledger operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    LoanFunded {
        id: LoanId,
        lender: PartyId,
        amount: Amount,
    },
    LoanRepaid {
        id: LoanId,
        collateral: Amount,
        lender: PartyId,
        borrower: PartyId,
        repayment_amount: Balance,
    },
    CollateralClaimed {
        id: LoanId,
        lender: PartyId,
        collateral: Amount,
    },
}

impl LedgerEvent {
    pub fn loan_id(&self) -> LoanId {
        match self {
            LedgerEvent::LoanFunded { id, .. }
            | LedgerEvent::LoanRepaid { id, .. }
            | LedgerEvent::CollateralClaimed { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LedgerEvent::LoanFunded { .. } => "LoanFunded",
            LedgerEvent::LoanRepaid { .. } => "LoanRepaid",
            LedgerEvent::CollateralClaimed { .. } => "CollateralClaimed",
        }
    }
}
