use crate::domain::amount::Balance;
use crate::domain::loan::LoanId;
use crate::domain::party::PartyId;
use crate::domain::time::Timestamp;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Debug, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum CommandType {
    Request,
    Fund,
    Repay,
    Claim,
}

/// One row of command input, as read from CSV.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct Command {
    pub op: CommandType,
    pub caller: String,
    pub loan: Option<LoanId>,
    #[serde(default, deserialize_with = "deserialize_decimal")]
    pub value: Option<Decimal>,
    pub rate: Option<u32>,
    pub duration: Option<u64>,
    pub at: Option<u64>,
}

// Parse from the raw text so no digit of precision passes through a float.
fn deserialize_decimal<'de, D>(deserializer: D) -> std::result::Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.filter(|s| !s.is_empty())
        .map(|s| Decimal::from_str(&s).map_err(serde::de::Error::custom))
        .transpose()
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum Operation {
    RequestLoan {
        interest_rate: u32,
        duration_secs: u64,
    },
    FundLoan {
        id: LoanId,
    },
    RepayLoan {
        id: LoanId,
    },
    ClaimCollateral {
        id: LoanId,
    },
}

/// A validated call on the ledger.
#[derive(Debug, PartialEq, Clone)]
pub struct Call {
    pub caller: PartyId,
    pub value: Balance,
    pub operation: Operation,
    /// Instant the call is made at, when the input pins one.
    pub at: Option<Timestamp>,
}

impl Command {
    /// Checks that the fields the operation needs are present.
    pub fn into_call(self) -> Result<Call> {
        let caller = PartyId::new(self.caller)?;
        let value = Balance::attached(self.value.unwrap_or(Decimal::ZERO))?;

        let loan = |op: &str| {
            self.loan
                .ok_or_else(|| LedgerError::MalformedCommand(format!("{op} requires a loan id")))
        };

        let operation = match self.op {
            CommandType::Request => Operation::RequestLoan {
                interest_rate: self.rate.ok_or_else(|| {
                    LedgerError::MalformedCommand("request requires a rate".to_string())
                })?,
                duration_secs: self.duration.ok_or_else(|| {
                    LedgerError::MalformedCommand("request requires a duration".to_string())
                })?,
            },
            CommandType::Fund => Operation::FundLoan { id: loan("fund")? },
            CommandType::Repay => Operation::RepayLoan { id: loan("repay")? },
            CommandType::Claim => {
                if !value.is_zero() {
                    return Err(LedgerError::MalformedCommand(
                        "claim does not take a value".to_string(),
                    ));
                }
                Operation::ClaimCollateral { id: loan("claim")? }
            }
        };

        Ok(Call {
            caller,
            value,
            operation,
            at: self.at.map(Timestamp),
        })
    }
}
