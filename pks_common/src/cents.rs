use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, Mul, Neg, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const PKS_CURRENCY_CODE: &str = "RUB";
pub const PKS_CURRENCY_CODE_LOWER: &str = "rub";

//--------------------------------------       Cents         ---------------------------------------------------------
/// A monetary amount in hundredths of the platform currency. All prices and invoice amounts are stored and
/// transported as `Cents`; floating point only ever appears at the display / rate-calculation edges.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, SubAssign, sub_assign);
op!(unary Cents, Neg, neg);

impl Mul<i64> for Cents {
    type Output = Self;

    fn mul(self, rhs: i64) -> Self::Output {
        Self::from(self.value() * rhs)
    }
}

impl Sum for Cents {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl PartialEq for Cents {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for Cents {}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {} is too large to convert to Cents", value)))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let whole = self.0 as f64 / 100.0;
        write!(f, "{whole:0.2} {PKS_CURRENCY_CODE}")
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_whole(units: i64) -> Self {
        Self(units * 100)
    }

    /// Rounds a fractional cent amount (e.g. minutes × per-minute rate) to the nearest whole cent.
    pub fn from_fractional(cents: f64) -> Self {
        Self(cents.round() as i64)
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn arithmetic_and_display() {
        let a = Cents::from_whole(10);
        let b = Cents::from(50);
        assert_eq!(a + b, Cents::from(1050));
        assert_eq!(a - b, Cents::from(950));
        assert_eq!(b * 3, Cents::from(150));
        assert_eq!(format!("{}", a + b), "10.50 RUB");
    }

    #[test]
    fn fractional_rounding() {
        assert_eq!(Cents::from_fractional(99.4), Cents::from(99));
        assert_eq!(Cents::from_fractional(99.5), Cents::from(100));
        assert_eq!(Cents::from_fractional(-0.6), Cents::from(-1));
    }
}
