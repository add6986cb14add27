use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::str::FromStr;

use crate::errors::{CrmError, Result};

/// minor units per major unit (paise per rupee)
pub const MINOR_PER_MAJOR: i64 = 100;

/// Money held as an integer count of minor currency units (paise).
///
/// Arithmetic never touches floating point. Conversion to and from major
/// units (rupees) goes through `Decimal` and only happens at the
/// input/display boundary.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// create from minor units (paise)
    pub const fn from_minor(paise: i64) -> Self {
        Money(paise)
    }

    /// create from whole major units (rupees)
    pub const fn from_major(rupees: i64) -> Self {
        Money(rupees * MINOR_PER_MAJOR)
    }

    /// create from a decimal major-unit amount, rounding half away from zero to the paisa
    pub fn from_decimal(amount: Decimal) -> Result<Self> {
        let minor = (amount * Decimal::from(MINOR_PER_MAJOR))
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        minor
            .to_i64()
            .map(Money)
            .ok_or_else(|| CrmError::validation("amount", format!("{} is out of range", amount)))
    }

    /// parse user input such as "1234.50" or "₹ 1,234.5"
    pub fn from_major_str(input: &str) -> Result<Self> {
        let cleaned: String = input
            .trim()
            .trim_start_matches('₹')
            .chars()
            .filter(|c| *c != ',' && !c.is_whitespace())
            .collect();
        if cleaned.is_empty() {
            return Err(CrmError::validation("amount", "amount is required"));
        }
        let amount = Decimal::from_str(&cleaned)
            .map_err(|_| CrmError::validation("amount", format!("'{}' is not a number", input.trim())))?;
        Money::from_decimal(amount)
    }

    /// amount in minor units
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// amount in major units
    pub fn to_major(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn min(self, other: Self) -> Self {
        Money(self.0.min(other.0))
    }

    pub fn max(self, other: Self) -> Self {
        Money(self.0.max(other.0))
    }

    /// reject negative amounts, naming the field in the error
    pub fn ensure_non_negative(self, field: &str) -> Result<Self> {
        if self.is_negative() {
            return Err(CrmError::validation(
                field,
                format!("amount cannot be negative, got {}", self),
            ));
        }
        Ok(self)
    }

    /// render with rupee sign and Indian digit grouping, e.g. ₹12,34,567.89
    pub fn format_inr(&self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let rupees = (abs / MINOR_PER_MAJOR as u64).to_string();
        let paise = abs % MINOR_PER_MAJOR as u64;

        let grouped = if rupees.len() <= 3 {
            rupees
        } else {
            let (head, tail) = rupees.split_at(rupees.len() - 3);
            let mut parts: Vec<&str> = Vec::new();
            let mut end = head.len();
            while end > 2 {
                parts.push(&head[end - 2..end]);
                end -= 2;
            }
            parts.push(&head[..end]);
            parts.reverse();
            format!("{},{}", parts.join(","), tail)
        };

        format!("{}₹{}.{:02}", sign, grouped, paise)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

impl FromStr for Money {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self> {
        Money::from_major_str(s)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, other: Money) -> Money {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Money) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, other: Money) -> Money {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Money) {
        self.0 -= other.0;
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Money {
        iter.copied().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_major_minor_conversion() {
        assert_eq!(Money::from_major(1_500).minor(), 150_000);
        assert_eq!(Money::from_minor(123_450).to_major(), dec!(1234.50));
        assert_eq!(Money::from_minor(123_450).to_string(), "1234.50");
    }

    #[test]
    fn test_parse_major_input() {
        assert_eq!(Money::from_major_str("1234.50").unwrap(), Money::from_minor(123_450));
        assert_eq!(Money::from_major_str("₹ 1,234.5").unwrap(), Money::from_minor(123_450));
        // rounds to the paisa, half away from zero
        assert_eq!(Money::from_major_str("0.005").unwrap(), Money::from_minor(1));
        assert_eq!(Money::from_major_str("99.994").unwrap(), Money::from_minor(9_999));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = Money::from_major_str("twelve").unwrap_err();
        assert_eq!(err.field(), Some("amount"));
        assert!(Money::from_major_str("   ").is_err());
    }

    #[test]
    fn test_indian_grouping() {
        assert_eq!(Money::from_minor(0).format_inr(), "₹0.00");
        assert_eq!(Money::from_minor(99_900).format_inr(), "₹999.00");
        assert_eq!(Money::from_minor(123_450).format_inr(), "₹1,234.50");
        assert_eq!(Money::from_minor(123_456_789).format_inr(), "₹12,34,567.89");
        assert_eq!(Money::from_minor(-150_000).format_inr(), "-₹1,500.00");
    }

    #[test]
    fn test_sum_and_non_negative_guard() {
        let total: Money = [Money::from_major(10), Money::from_major(5)].iter().sum();
        assert_eq!(total, Money::from_major(15));

        assert!(Money::from_minor(-1).ensure_non_negative("total_amount").is_err());
        assert_eq!(Money::ZERO.ensure_non_negative("total_amount").unwrap(), Money::ZERO);
    }
}
