use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// Number of fractional digits in the smallest indivisible value unit.
pub const AMOUNT_SCALE: u32 = 18;

fn check_precision(value: Decimal) -> Result<()> {
    if value.normalize().scale() > AMOUNT_SCALE {
        return Err(LedgerError::InvalidValue(format!(
            "{value} is finer than {AMOUNT_SCALE} decimal places"
        )));
    }
    Ok(())
}

/// A non-negative quantity of value, e.g. what a caller attaches to a call
/// or what a party has been paid out.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Balance(Decimal);

/// A strictly positive quantity of value.
///
/// Collateral is always an `Amount`: a zero-value loan cannot exist.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::InvalidValue(
                "Amount must be positive".to_string(),
            ));
        }
        check_precision(value)?;
        Ok(Self(value))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Principal plus `rate_percent` interest, truncated toward zero at
    /// [`AMOUNT_SCALE`] digits.
    ///
    /// Computed on the integer mantissa so no intermediate rounding can occur.
    /// Fails when the result does not fit a `Decimal` at base-unit precision.
    pub fn with_interest(&self, rate_percent: u32) -> Result<Balance> {
        let overflow = || LedgerError::InvalidValue(format!("repayment for {} overflows", self.0));

        let principal = self.0.normalize();
        let factor = 100i128 + i128::from(rate_percent);
        // mantissa * factor / 100 at `scale` is mantissa * factor at `scale + 2`.
        let mut units = principal
            .mantissa()
            .checked_mul(factor)
            .ok_or_else(overflow)?;
        let mut scale = principal.scale() + 2;
        if scale > AMOUNT_SCALE {
            units /= 10i128.pow(scale - AMOUNT_SCALE);
            scale = AMOUNT_SCALE;
        }
        while scale > 0 && units % 10 == 0 {
            units /= 10;
            scale -= 1;
        }

        let owed = Decimal::try_from_i128_with_scale(units, scale).map_err(|_| overflow())?;
        Ok(Balance(owed))
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl From<Amount> for Balance {
    fn from(amount: Amount) -> Self {
        Self(amount.0)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Balance {
    pub const ZERO: Self = Self(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Validates a value attached to a call.
    pub fn attached(value: Decimal) -> Result<Self> {
        Self(value).validated()
    }

    /// Checks that the balance is non-negative and holds whole base units.
    pub fn validated(self) -> Result<Self> {
        let value = self.0;
        if value < Decimal::ZERO {
            return Err(LedgerError::InvalidValue(format!(
                "attached value {value} is negative"
            )));
        }
        check_precision(value)?;
        Ok(self)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

impl Add for Balance {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Balance {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl AddAssign for Balance {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl SubAssign for Balance {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}

impl PartialEq<Amount> for Balance {
    fn eq(&self, other: &Amount) -> bool {
        self.0 == other.0
    }
}
