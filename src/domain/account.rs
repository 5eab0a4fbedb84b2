use crate::domain::amount::Balance;
use crate::domain::party::PartyId;
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

/// Value bookkeeping for one party.
///
/// Across all parties, everything spent is either still locked as collateral
/// or has been received by someone: `sum(spent) == sum(received) + sum(locked)`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct PartyAccount {
    /// The party this account belongs to.
    pub party: PartyId,
    /// Value the party attached to successful calls.
    pub spent: Balance,
    /// The party's collateral currently held by the ledger.
    pub locked: Balance,
    /// Value the ledger has paid out to the party.
    pub received: Balance,
}

impl PartyAccount {
    pub fn new(party: PartyId) -> Self {
        Self {
            party,
            spent: Balance::ZERO,
            locked: Balance::ZERO,
            received: Balance::ZERO,
        }
    }

    /// Records value attached by this party to a call.
    pub fn pay(&mut self, amount: Balance) {
        self.spent += amount;
    }

    /// Posts collateral: the attached value stays with the ledger.
    pub fn lock(&mut self, amount: Balance) {
        self.spent += amount;
        self.locked += amount;
    }

    /// Credits a payout.
    pub fn receive(&mut self, amount: Balance) {
        self.received += amount;
    }

    /// Returns locked collateral to its owner.
    pub fn release(&mut self, amount: Balance) -> Result<()> {
        self.unlock(amount)?;
        self.received += amount;
        Ok(())
    }

    /// Gives up locked collateral; the caller credits whoever seized it.
    pub fn forfeit(&mut self, amount: Balance) -> Result<()> {
        self.unlock(amount)
    }

    fn unlock(&mut self, amount: Balance) -> Result<()> {
        if self.locked >= amount {
            self.locked -= amount;
            Ok(())
        } else {
            Err(LedgerError::InternalError(
                format!(
                    "{} has {} locked, cannot unlock {}",
                    self.party, self.locked, amount
                )
                .into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn account() -> PartyAccount {
        PartyAccount::new(PartyId::new("alice").unwrap())
    }

    #[test]
    fn test_lock_and_release() {
        let mut account = account();
        account.lock(Balance::new(dec!(1.5)));
        assert_eq!(account.spent, Balance::new(dec!(1.5)));
        assert_eq!(account.locked, Balance::new(dec!(1.5)));

        account.release(Balance::new(dec!(1.5))).unwrap();
        assert_eq!(account.locked, Balance::ZERO);
        assert_eq!(account.received, Balance::new(dec!(1.5)));
        assert_eq!(account.spent, Balance::new(dec!(1.5)));
    }

    #[test]
    fn test_forfeit_does_not_credit() {
        let mut account = account();
        account.lock(Balance::new(dec!(2)));
        account.forfeit(Balance::new(dec!(2))).unwrap();
        assert_eq!(account.locked, Balance::ZERO);
        assert_eq!(account.received, Balance::ZERO);
    }

    #[test]
    fn test_unlock_more_than_locked_fails() {
        let mut account = account();
        account.lock(Balance::new(dec!(1)));
        let result = account.release(Balance::new(dec!(2)));
        assert!(matches!(result, Err(LedgerError::InternalError(_))));
        assert_eq!(account.locked, Balance::new(dec!(1)));
        assert_eq!(account.received, Balance::ZERO);
    }

    #[test]
    fn test_pay_and_receive() {
        let mut account = account();
        account.pay(Balance::new(dec!(3)));
        account.receive(Balance::new(dec!(1.25)));
        assert_eq!(account.spent, Balance::new(dec!(3)));
        assert_eq!(account.received, Balance::new(dec!(1.25)));
        assert_eq!(account.locked, Balance::ZERO);
    }
}
