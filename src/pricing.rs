//! Pricing
//!
//! The single pricing pass shared by every caller: the cart page, the checkout summary and
//! order submission. It is a pure function of its inputs, never fails and clamps any
//! out-of-range request to the nearest valid value.
//!
//! Order of operations:
//!
//! 1. `subtotal` is the sum of `effective unit price × quantity`.
//! 2. `discount` comes from the promotion, computed on the undiscounted subtotal and capped at it.
//! 3. `post_discount = subtotal - discount`.
//! 4. Bonuses cover at most 70% of `post_discount`, and never more than requested or available.
//! 5. `total = max(0, post_discount - bonuses_used)`.

use rusty_money::{Money, MoneyError, iso::Currency};

use crate::{
    bonuses::{max_bonuses, redeemable_bonuses},
    cart::Cart,
    items::LineItem,
    promotions::PromotionCode,
};

/// Result of a pricing pass. Recomputed on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBreakdown<'a> {
    subtotal: Money<'a, Currency>,
    discount: Money<'a, Currency>,
    bonuses_used: Money<'a, Currency>,
    total: Money<'a, Currency>,
}

impl<'a> PriceBreakdown<'a> {
    /// Sum of line totals before any promotion or bonuses.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        self.subtotal
    }

    /// Promotion discount.
    pub fn discount(&self) -> Money<'a, Currency> {
        self.discount
    }

    /// Bonuses redeemed against the discounted amount.
    pub fn bonuses_used(&self) -> Money<'a, Currency> {
        self.bonuses_used
    }

    /// Amount to pay.
    pub fn total(&self) -> Money<'a, Currency> {
        self.total
    }

    /// Discount plus bonuses.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] if the addition fails.
    pub fn savings(&self) -> Result<Money<'a, Currency>, MoneyError> {
        self.discount.add(self.bonuses_used)
    }

    /// Whether nothing is left to pay.
    pub fn is_fully_covered(&self) -> bool {
        self.total.to_minor_units() == 0
    }
}

/// Sum of `effective unit price × quantity` over a slice of line items, in minor units.
pub fn subtotal_minor(items: &[LineItem<'_>]) -> i64 {
    items
        .iter()
        .fold(0i64, |acc, item| acc.saturating_add(item.line_total_minor()))
        .max(0)
}

/// Calculates the subtotal of a cart. An empty cart costs zero.
pub fn compute_subtotal<'a>(cart: &Cart<'a>) -> Money<'a, Currency> {
    Money::from_minor(subtotal_minor(cart.items()), cart.currency())
}

/// Calculates the full breakdown for a cart snapshot.
pub fn compute_breakdown<'a>(
    cart: &Cart<'a>,
    promotion: Option<&PromotionCode>,
    bonuses_requested: u64,
    bonuses_available: u64,
) -> PriceBreakdown<'a> {
    let currency = cart.currency();

    let subtotal = subtotal_minor(cart.items());
    let discount = promotion.map_or(0, |promotion| promotion.discount_on(subtotal));
    let post_discount = subtotal - discount;
    let bonuses_used = redeemable_bonuses(post_discount, bonuses_requested, bonuses_available);
    let total = post_discount.saturating_sub(bonuses_used).max(0);

    PriceBreakdown {
        subtotal: Money::from_minor(subtotal, currency),
        discount: Money::from_minor(discount, currency),
        bonuses_used: Money::from_minor(bonuses_used, currency),
        total: Money::from_minor(total, currency),
    }
}

/// Upper bound for a bonus redemption on this cart: what an unlimited request would use.
pub fn max_redeemable_bonuses<'a>(
    cart: &Cart<'a>,
    promotion: Option<&PromotionCode>,
    bonuses_available: u64,
) -> Money<'a, Currency> {
    let subtotal = subtotal_minor(cart.items());
    let discount = promotion.map_or(0, |promotion| promotion.discount_on(subtotal));
    let available = i64::try_from(bonuses_available).unwrap_or(i64::MAX);

    Money::from_minor(
        max_bonuses(subtotal - discount).min(available),
        cart.currency(),
    )
}
