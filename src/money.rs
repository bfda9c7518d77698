//! Money helpers

use rusty_money::{Findable, Money, iso::Currency};

/// Looks up an ISO 4217 currency by its alphabetic code, ignoring case and surrounding spaces.
pub fn currency_for_code(code: &str) -> Option<&'static Currency> {
    Currency::find(&code.trim().to_ascii_uppercase())
}

/// Converts an unsigned minor-unit amount, saturating at `i64::MAX`.
pub fn money_from_unsigned(minor: u64, currency: &Currency) -> Money<'_, Currency> {
    Money::from_minor(i64::try_from(minor).unwrap_or(i64::MAX), currency)
}

/// Converts a money value to unsigned minor units, flooring negatives at zero.
pub fn unsigned_minor(money: &Money<'_, Currency>) -> u64 {
    u64::try_from(money.to_minor_units()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use rusty_money::iso::{RUB, USD};

    use super::*;

    #[test]
    fn currency_lookup_is_case_insensitive() {
        assert_eq!(currency_for_code("rub"), Some(RUB));
        assert_eq!(currency_for_code(" USD "), Some(USD));
        assert_eq!(currency_for_code("XYZ"), None);
    }

    #[test]
    fn unsigned_conversions_saturate() {
        assert_eq!(money_from_unsigned(u64::MAX, RUB).to_minor_units(), i64::MAX);
        assert_eq!(unsigned_minor(&Money::from_minor(-5, RUB)), 0);
        assert_eq!(unsigned_minor(&Money::from_minor(250, RUB)), 250);
    }
}
