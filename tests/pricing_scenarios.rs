//! Integration tests for the documented pricing scenarios

use rust_decimal::Decimal;
use rusty_money::{Money, iso::RUB};
use testresult::TestResult;

use famshop::{
    cart::Cart,
    items::{LineItem, ProductId},
    pricing::{PriceBreakdown, compute_breakdown},
    promotions::PromotionCode,
};

fn rub(minor: i64) -> Money<'static, rusty_money::iso::Currency> {
    Money::from_minor(minor, RUB)
}

/// One product at 1000 minor units, quantity two.
fn two_at_a_thousand() -> Result<Cart<'static>, Box<dyn std::error::Error>> {
    let item = LineItem::new(ProductId::new(1), rub(1000))?.with_quantity(2);

    Ok(Cart::with_items([item], RUB)?)
}

fn assert_breakdown(
    breakdown: &PriceBreakdown<'_>,
    subtotal: i64,
    discount: i64,
    bonuses_used: i64,
    total: i64,
) {
    assert_eq!(breakdown.subtotal(), rub(subtotal), "subtotal");
    assert_eq!(breakdown.discount(), rub(discount), "discount");
    assert_eq!(breakdown.bonuses_used(), rub(bonuses_used), "bonuses used");
    assert_eq!(breakdown.total(), rub(total), "total");
}

#[test]
fn plain_cart_costs_its_subtotal() -> TestResult {
    let cart = two_at_a_thousand()?;

    assert_breakdown(&compute_breakdown(&cart, None, 0, 0), 2000, 0, 0, 2000);

    Ok(())
}

#[test]
fn percent_promotion_discounts_subtotal() -> TestResult {
    let cart = two_at_a_thousand()?;
    let promotion = PromotionCode::percent("TEN", Decimal::from(10))?;

    assert_breakdown(
        &compute_breakdown(&cart, Some(&promotion), 0, 0),
        2000,
        200,
        0,
        1800,
    );

    Ok(())
}

#[test]
fn bonuses_are_capped_at_seventy_percent_after_discount() -> TestResult {
    let cart = two_at_a_thousand()?;
    let promotion = PromotionCode::percent("TEN", Decimal::from(10))?;

    assert_breakdown(
        &compute_breakdown(&cart, Some(&promotion), 2000, 5000),
        2000,
        200,
        1260,
        540,
    );

    Ok(())
}

#[test]
fn fixed_promotion_above_subtotal_is_capped() -> TestResult {
    let cart = two_at_a_thousand()?;
    let promotion = PromotionCode::fixed("FIFTY", 5000)?;

    assert_breakdown(
        &compute_breakdown(&cart, Some(&promotion), 0, 0),
        2000,
        2000,
        0,
        0,
    );

    Ok(())
}

#[test]
fn available_balance_limits_bonuses() -> TestResult {
    let cart = two_at_a_thousand()?;

    assert_breakdown(&compute_breakdown(&cart, None, 100, 50), 2000, 0, 50, 1950);

    Ok(())
}

#[test]
fn missing_quantity_counts_as_one() -> TestResult {
    let unset = LineItem::new(ProductId::new(1), rub(1000))?;
    let three = LineItem::new(ProductId::new(2), rub(500))?.with_quantity(3);

    let cart = Cart::with_items([unset, three], RUB)?;

    assert_breakdown(&compute_breakdown(&cart, None, 0, 0), 2500, 0, 0, 2500);

    Ok(())
}

#[test]
fn zero_quantity_counts_as_one() -> TestResult {
    let zero = LineItem::new(ProductId::new(1), rub(1000))?.with_quantity(0);

    let cart = Cart::with_items([zero], RUB)?;

    assert_eq!(compute_breakdown(&cart, None, 0, 0).total(), rub(1000));

    Ok(())
}

#[test]
fn per_item_discount_feeds_promotion_and_bonuses() -> TestResult {
    let on_sale = LineItem::new(ProductId::new(1), rub(1490))?
        .with_current_price(rub(990))?
        .with_quantity(1);
    let regular = LineItem::new(ProductId::new(2), rub(750))?.with_quantity(2);

    let cart = Cart::with_items([on_sale, regular], RUB)?;
    let promotion = PromotionCode::percent("REVIT15", Decimal::from(15))?;

    // 2490 - floor(373.5) = 2117; floor(2117 * 0.7) = 1481
    assert_breakdown(
        &compute_breakdown(&cart, Some(&promotion), 100_000, 60_000),
        2490,
        373,
        1481,
        636,
    );

    Ok(())
}
