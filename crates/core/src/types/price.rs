//! Type-safe price representation using decimal arithmetic.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A price with currency information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Amount in the currency's standard unit (e.g., reais, not centavos).
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency_code: CurrencyCode,
}

impl Price {
    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal, currency_code: CurrencyCode) -> Self {
        Self {
            amount,
            currency_code,
        }
    }

    /// Create a price in the storefront's default currency.
    #[must_use]
    pub fn from_amount(amount: Decimal) -> Self {
        Self::new(amount, CurrencyCode::default())
    }

    /// Format for display, e.g. `R$ 1.234,56` or `$1,234.56`.
    #[must_use]
    pub fn display(&self) -> String {
        let rounded = self
            .amount
            .abs()
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let text = format!("{rounded:.2}");
        let (units, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));

        let (thousands, decimal) = self.currency_code.separators();
        let grouped = group_digits(units, thousands);
        let sign = if self.amount.is_sign_negative() && !rounded.is_zero() {
            "-"
        } else {
            ""
        };

        format!(
            "{sign}{}{grouped}{decimal}{cents}",
            self.currency_code.prefix()
        )
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    BRL,
    USD,
    EUR,
}

impl CurrencyCode {
    /// Symbol and spacing placed before the amount.
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::BRL => "R$\u{a0}",
            Self::USD => "$",
            Self::EUR => "€",
        }
    }

    /// Thousands and decimal separators.
    #[must_use]
    pub const fn separators(self) -> (char, char) {
        match self {
            Self::BRL | Self::EUR => ('.', ','),
            Self::USD => (',', '.'),
        }
    }

    /// ISO 4217 code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::BRL => "BRL",
            Self::USD => "USD",
            Self::EUR => "EUR",
        }
    }
}

/// Serde adapter writing a `Decimal` as a plain JSON number.
///
/// Whole values are written as integers (`100`, not `100.0`) so snapshots
/// round-trip byte for byte whatever client produced them.
pub mod json_number {
    use rust_decimal::Decimal;
    use rust_decimal::prelude::ToPrimitive;
    use serde::{Deserializer, Serializer};

    /// # Errors
    ///
    /// Returns the serializer's error.
    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract().is_zero()
            && let Some(whole) = value.to_i64()
        {
            return serializer.serialize_i64(whole);
        }
        rust_decimal::serde::float::serialize(value, serializer)
    }

    /// # Errors
    ///
    /// Returns an error if the value is not a number.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        rust_decimal::serde::float::deserialize(deserializer)
    }
}

fn group_digits(digits: &str, separator: char) -> String {
    let len = digits.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(separator);
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_brl() {
        let price = Price::from_amount(Decimal::new(1799, 1));
        assert_eq!(price.display(), "R$\u{a0}179,90");
    }

    #[test]
    fn test_display_groups_thousands() {
        let price = Price::new(Decimal::new(123_456_789, 2), CurrencyCode::BRL);
        assert_eq!(price.display(), "R$\u{a0}1.234.567,89");

        let price = Price::new(Decimal::new(123_456_789, 2), CurrencyCode::USD);
        assert_eq!(price.display(), "$1,234,567.89");
    }

    #[test]
    fn test_display_rounds_half_away_from_zero() {
        let price = Price::new(Decimal::new(10_005, 3), CurrencyCode::USD);
        assert_eq!(price.display(), "$10.01");
    }

    #[test]
    fn test_display_zero_and_negative() {
        assert_eq!(
            Price::new(Decimal::ZERO, CurrencyCode::USD).display(),
            "$0.00"
        );
        assert_eq!(
            Price::new(Decimal::new(-250, 2), CurrencyCode::USD).display(),
            "-$2.50"
        );
    }
}
