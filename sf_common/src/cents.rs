use std::{
    fmt::Display,
    ops::{Add, AddAssign, Sub},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "USD";

//--------------------------------------       Cents         ---------------------------------------------------------
/// An amount of money in the minor unit of its currency (cents for USD).
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct Cents(i64);

op!(binary Cents, Add, add);
op!(binary Cents, Sub, sub);
op!(inplace Cents, AddAssign, add_assign);

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in cents: {0}")]
pub struct CentsConversionError(String);

impl From<i64> for Cents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for Cents {
    type Error = CentsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(CentsConversionError(format!("Value {value} is too large to convert to Cents")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl Display for Cents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Cents {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// The price of `quantity` units, or `None` if the result would overflow.
    pub fn checked_mul(&self, quantity: i64) -> Option<Self> {
        self.0.checked_mul(quantity).map(Self)
    }

    pub fn checked_add(&self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Adds up the amounts, or returns `None` if the sum would overflow.
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts.into_iter().try_fold(Self::default(), |acc, amount| acc.checked_add(amount))
    }
}
