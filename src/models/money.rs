use std::fmt;
use std::ops::{Add, Sub};

use bigdecimal::{BigDecimal, ToPrimitive};
use serde::{Deserialize, Serialize};

/// A US dollar amount held as integer cents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(transparent)]
pub struct Usd(i64);

impl Usd {
    pub const ZERO: Usd = Usd(0);

    pub const fn from_cents(cents: i64) -> Self {
        Usd(cents)
    }

    pub const fn from_dollars(dollars: i64) -> Self {
        Usd(dollars * 100)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Rounds a provider price to the nearest cent, half away from zero.
    /// Returns `None` for negative prices or values that do not fit.
    pub fn from_decimal(value: &BigDecimal) -> Option<Self> {
        if value < &BigDecimal::from(0) {
            return None;
        }
        let scaled = value * BigDecimal::from(100);
        let truncated = scaled.with_scale(0);
        let remainder = &scaled - &truncated;
        let half = BigDecimal::new(5.into(), 1);
        let cents = if remainder >= half {
            truncated + BigDecimal::from(1)
        } else {
            truncated
        };
        cents.to_i64().map(Usd)
    }

    /// `shares × self`, or `None` on overflow.
    pub fn checked_mul_shares(self, shares: i64) -> Option<Usd> {
        self.0.checked_mul(shares).map(Usd)
    }

    pub fn checked_add(self, other: Usd) -> Option<Usd> {
        self.0.checked_add(other.0).map(Usd)
    }
}

impl Add for Usd {
    type Output = Usd;

    fn add(self, rhs: Usd) -> Usd {
        Usd(self.0 + rhs.0)
    }
}

impl Sub for Usd {
    type Output = Usd;

    fn sub(self, rhs: Usd) -> Usd {
        Usd(self.0 - rhs.0)
    }
}

impl std::iter::Sum for Usd {
    fn sum<I: Iterator<Item = Usd>>(iter: I) -> Usd {
        iter.fold(Usd::ZERO, |acc, v| acc + v)
    }
}

// $1,234.56 / -$0.50
impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = (abs / 100).to_string();
        let cents = abs % 100;

        let mut grouped = String::with_capacity(dollars.len() + dollars.len() / 3);
        for (i, ch) in dollars.chars().enumerate() {
            if i > 0 && (dollars.len() - i) % 3 == 0 {
                grouped.push(',');
            }
            grouped.push(ch);
        }

        write!(f, "{}${}.{:02}", sign, grouped, cents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_groups_thousands() {
        assert_eq!(Usd::from_cents(0).to_string(), "$0.00");
        assert_eq!(Usd::from_cents(5).to_string(), "$0.05");
        assert_eq!(Usd::from_dollars(10_000).to_string(), "$10,000.00");
        assert_eq!(Usd::from_cents(123_456_789).to_string(), "$1,234,567.89");
        assert_eq!(Usd::from_cents(99_999).to_string(), "$999.99");
        assert_eq!(Usd::from_cents(-150).to_string(), "-$1.50");
    }

    #[test]
    fn test_from_decimal_rounds_to_cents() {
        let d = |s: &str| BigDecimal::from_str(s).unwrap();

        assert_eq!(Usd::from_decimal(&d("100")), Some(Usd::from_dollars(100)));
        assert_eq!(Usd::from_decimal(&d("189.984")), Some(Usd::from_cents(18998)));
        assert_eq!(Usd::from_decimal(&d("189.985")), Some(Usd::from_cents(18999)));
        assert_eq!(Usd::from_decimal(&d("0.004")), Some(Usd::ZERO));
        assert_eq!(Usd::from_decimal(&d("-1.00")), None);
    }

    #[test]
    fn test_checked_mul_detects_overflow() {
        assert_eq!(Usd::from_dollars(100).checked_mul_shares(10), Some(Usd::from_dollars(1000)));
        assert_eq!(Usd::from_cents(i64::MAX).checked_mul_shares(2), None);
    }
}
