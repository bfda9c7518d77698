//! Promotions
//!
//! A promotion code is a user-entered string that the promotion service has validated into a
//! discount rule. Its shape is checked once, when the [`PromotionCode`] is built; the
//! pricing engine trusts it from then on.

use decimal_percentage::Percentage;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while accepting a promotion shape.
#[derive(Debug, Error, PartialEq)]
pub enum PromotionError {
    /// The code string was empty or whitespace.
    #[error("promotion code is empty")]
    EmptyCode,

    /// A percent discount outside `[0, 100]`.
    #[error("percent discount {0} is outside 0..=100")]
    PercentOutOfRange(Decimal),

    /// A fixed discount that is negative, fractional or too large for minor units.
    #[error("fixed discount {0} is not a non-negative whole number of minor units")]
    InvalidFixedAmount(Decimal),

    /// An accepted code came back without a discount type or value.
    #[error("promotion {0} is missing its discount type or value")]
    IncompleteShape(String),
}

/// How a promotion's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// Percentage of the undiscounted subtotal.
    Percent,

    /// Fixed amount in minor units.
    Fixed,

    /// Any type this client does not understand; discounts nothing.
    #[serde(other)]
    Unsupported,
}

/// A validated promotion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionCode {
    code: String,
    discount_type: DiscountType,
    discount_value: Decimal,
}

impl PromotionCode {
    /// Builds a promotion, checking that the value fits its type.
    ///
    /// # Errors
    ///
    /// - [`PromotionError::EmptyCode`]: `code` is blank.
    /// - [`PromotionError::PercentOutOfRange`]: a percent value outside `[0, 100]`.
    /// - [`PromotionError::InvalidFixedAmount`]: a fixed value that is not a non-negative whole
    ///   number of minor units.
    pub fn try_new(
        code: impl Into<String>,
        discount_type: DiscountType,
        discount_value: Decimal,
    ) -> Result<Self, PromotionError> {
        let code = code.into().trim().to_string();

        if code.is_empty() {
            return Err(PromotionError::EmptyCode);
        }

        match discount_type {
            DiscountType::Percent
                if discount_value < Decimal::ZERO || discount_value > Decimal::ONE_HUNDRED =>
            {
                return Err(PromotionError::PercentOutOfRange(discount_value));
            }
            DiscountType::Fixed
                if discount_value.is_sign_negative()
                    || !discount_value.fract().is_zero()
                    || discount_value.to_i64().is_none() =>
            {
                return Err(PromotionError::InvalidFixedAmount(discount_value));
            }
            _ => {}
        }

        Ok(Self {
            code,
            discount_type,
            discount_value,
        })
    }

    /// Percent-off promotion, `percent` in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// See [`PromotionCode::try_new`].
    pub fn percent(code: impl Into<String>, percent: Decimal) -> Result<Self, PromotionError> {
        Self::try_new(code, DiscountType::Percent, percent)
    }

    /// Fixed-amount promotion in minor units.
    ///
    /// # Errors
    ///
    /// See [`PromotionCode::try_new`].
    pub fn fixed(code: impl Into<String>, minor_units: u64) -> Result<Self, PromotionError> {
        Self::try_new(code, DiscountType::Fixed, Decimal::from(minor_units))
    }

    /// The code as entered by the user, trimmed.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// How the value is interpreted.
    pub fn discount_type(&self) -> DiscountType {
        self.discount_type
    }

    /// Percent points or minor units, depending on the type.
    pub fn discount_value(&self) -> Decimal {
        self.discount_value
    }

    /// Calculates the discount in minor units for an undiscounted subtotal.
    ///
    /// Percent discounts are floored; fixed discounts are capped at the subtotal. The result is
    /// always within `0..=subtotal`.
    pub fn discount_on(&self, subtotal_minor: i64) -> i64 {
        let subtotal_minor = subtotal_minor.max(0);

        let discount = match self.discount_type {
            DiscountType::Percent => percent_of_minor(self.discount_value, subtotal_minor),
            DiscountType::Fixed => self.discount_value.to_i64().unwrap_or(i64::MAX),
            DiscountType::Unsupported => 0,
        };

        discount.clamp(0, subtotal_minor)
    }
}

/// `floor(minor × percent / 100)`, saturating when the product does not fit.
fn percent_of_minor(percent: Decimal, minor: i64) -> i64 {
    let fraction = Percentage::from(percent / Decimal::ONE_HUNDRED);
    let applied = fraction * Decimal::from(minor);

    applied.floor().to_i64().unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn percent_discount_is_floored() -> TestResult {
        let promotion = PromotionCode::percent("SPRING", Decimal::from(10))?;

        assert_eq!(promotion.discount_on(2000), 200);
        assert_eq!(promotion.discount_on(1999), 199);

        Ok(())
    }

    #[test]
    fn fractional_percent_discount() -> TestResult {
        let promotion = PromotionCode::percent("HALF", Decimal::new(125, 1))?;

        assert_eq!(promotion.discount_on(1000), 125);
        assert_eq!(promotion.discount_on(999), 124);

        Ok(())
    }

    #[test]
    fn full_percent_discount_equals_subtotal() -> TestResult {
        let promotion = PromotionCode::percent("FREE", Decimal::ONE_HUNDRED)?;

        assert_eq!(promotion.discount_on(1234), 1234);

        Ok(())
    }

    #[test]
    fn fixed_discount_is_capped_at_subtotal() -> TestResult {
        let promotion = PromotionCode::fixed("BIG", 5000)?;

        assert_eq!(promotion.discount_on(2000), 2000);
        assert_eq!(promotion.discount_on(8000), 5000);
        assert_eq!(promotion.discount_on(0), 0);

        Ok(())
    }

    #[test]
    fn unsupported_type_discounts_nothing() -> TestResult {
        let promotion =
            PromotionCode::try_new("ODD", DiscountType::Unsupported, Decimal::from(50))?;

        assert_eq!(promotion.discount_on(2000), 0);

        Ok(())
    }

    #[test]
    fn blank_code_is_rejected() {
        assert_eq!(
            PromotionCode::fixed("   ", 100),
            Err(PromotionError::EmptyCode)
        );
    }

    #[test]
    fn code_is_trimmed() -> TestResult {
        let promotion = PromotionCode::fixed("  WELCOME ", 100)?;

        assert_eq!(promotion.code(), "WELCOME");

        Ok(())
    }

    #[test]
    fn percent_out_of_range_is_rejected() {
        assert_eq!(
            PromotionCode::percent("X", Decimal::from(101)),
            Err(PromotionError::PercentOutOfRange(Decimal::from(101)))
        );
        assert_eq!(
            PromotionCode::percent("X", Decimal::from(-1)),
            Err(PromotionError::PercentOutOfRange(Decimal::from(-1)))
        );
    }

    #[test]
    fn fractional_or_negative_fixed_is_rejected() {
        assert_eq!(
            PromotionCode::try_new("X", DiscountType::Fixed, Decimal::new(105, 1)),
            Err(PromotionError::InvalidFixedAmount(Decimal::new(105, 1)))
        );
        assert_eq!(
            PromotionCode::try_new("X", DiscountType::Fixed, Decimal::from(-5)),
            Err(PromotionError::InvalidFixedAmount(Decimal::from(-5)))
        );
    }

    #[test]
    fn discount_type_deserialises_unknown_values() -> TestResult {
        let percent: DiscountType = serde_json::from_str("\"percent\"")?;
        let fixed: DiscountType = serde_json::from_str("\"fixed\"")?;
        let other: DiscountType = serde_json::from_str("\"bogo\"")?;

        assert_eq!(percent, DiscountType::Percent);
        assert_eq!(fixed, DiscountType::Fixed);
        assert_eq!(other, DiscountType::Unsupported);

        Ok(())
    }
}
