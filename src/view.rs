//! View-models
//!
//! Plain display structs for the cart page and the checkout summary. Built by pure functions from
//! a cart snapshot and its [`PriceBreakdown`], so rendering never re-implements pricing.

use rusty_money::{Money, iso::Currency};
use serde::Serialize;

use crate::{
    cart::Cart,
    items::{LineItem, ProductId},
    money::unsigned_minor,
    pricing::{PriceBreakdown, max_redeemable_bonuses},
    promotions::PromotionCode,
};

/// One cart line, ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLineView {
    /// Product id
    pub product_id: ProductId,

    /// Price the user pays per unit
    pub unit_price: String,

    /// List price shown struck through, when a per-item discount applies
    pub strikethrough_price: Option<String>,

    /// Effective quantity
    pub quantity: u32,

    /// Unit price times quantity
    pub line_total: String,
}

/// The cart page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartSummaryView {
    /// Cart lines in insertion order
    pub lines: Vec<CartLineView>,

    /// Sum of effective quantities
    pub item_count: u64,

    /// Subtotal
    pub subtotal: String,

    /// Applied promotion code
    pub promo_code: Option<String>,

    /// Discount row, present only when non-zero
    pub discount: Option<String>,

    /// Total after discount and bonuses
    pub total: String,
}

/// The checkout summary panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutSummaryView {
    /// Subtotal
    pub subtotal: String,

    /// Applied promotion code
    pub promo_code: Option<String>,

    /// Discount row, present only when non-zero
    pub discount: Option<String>,

    /// Bonus row, present only when non-zero
    pub bonuses_used: Option<String>,

    /// Upper bound of the bonus slider, in minor units
    pub bonus_slider_max: u64,

    /// Bonuses the user holds, in minor units
    pub bonus_balance: u64,

    /// Amount to pay
    pub total: String,

    /// Whether discounts and bonuses cover the whole order
    pub fully_covered: bool,
}

/// Builds the cart page view-model.
pub fn cart_summary(
    cart: &Cart<'_>,
    breakdown: &PriceBreakdown<'_>,
    promotion: Option<&PromotionCode>,
) -> CartSummaryView {
    CartSummaryView {
        lines: cart.items().iter().map(line_view).collect(),
        item_count: cart
            .items()
            .iter()
            .map(|item| u64::from(item.quantity()))
            .sum(),
        subtotal: breakdown.subtotal().to_string(),
        promo_code: promotion.map(|promotion| promotion.code().to_string()),
        discount: non_zero(&breakdown.discount()).map(negated),
        total: breakdown.total().to_string(),
    }
}

/// Builds the checkout summary view-model.
///
/// The slider bound is what an unlimited request could redeem with the current promotion and
/// `bonus_balance`.
pub fn checkout_summary(
    cart: &Cart<'_>,
    breakdown: &PriceBreakdown<'_>,
    promotion: Option<&PromotionCode>,
    bonus_balance: u64,
) -> CheckoutSummaryView {
    let slider_max = max_redeemable_bonuses(cart, promotion, bonus_balance);

    CheckoutSummaryView {
        subtotal: breakdown.subtotal().to_string(),
        promo_code: promotion.map(|promotion| promotion.code().to_string()),
        discount: non_zero(&breakdown.discount()).map(negated),
        bonuses_used: non_zero(&breakdown.bonuses_used()).map(negated),
        bonus_slider_max: unsigned_minor(&slider_max),
        bonus_balance,
        total: breakdown.total().to_string(),
        fully_covered: !cart.is_empty() && breakdown.is_fully_covered(),
    }
}

fn line_view(item: &LineItem<'_>) -> CartLineView {
    let strikethrough_price = item
        .current_price()
        .filter(|current| *current != item.unit_price())
        .map(|_| item.unit_price().to_string());

    CartLineView {
        product_id: item.product_id(),
        unit_price: item.effective_unit_price().to_string(),
        strikethrough_price,
        quantity: item.quantity(),
        line_total: item.line_total().to_string(),
    }
}

fn non_zero<'a, 'm>(money: &'m Money<'a, Currency>) -> Option<&'m Money<'a, Currency>> {
    (money.to_minor_units() != 0).then_some(money)
}

fn negated(money: &Money<'_, Currency>) -> String {
    format!("-{money}")
}
