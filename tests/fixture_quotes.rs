//! Integration tests pricing the bundled cart fixtures

use rusty_money::{Money, iso::RUB};
use testresult::TestResult;

use famshop::{
    fixtures::CartFixture,
    pricing::{PriceBreakdown, compute_breakdown},
    receipt::BreakdownReceipt,
};

fn quote(name: &str) -> Result<PriceBreakdown<'static>, Box<dyn std::error::Error>> {
    let fixture = CartFixture::from_set(name)?;
    let cart = fixture.cart()?;
    let promotion = fixture.promotion()?;

    Ok(compute_breakdown(
        &cart,
        promotion.as_ref(),
        fixture.bonuses_requested(),
        fixture.bonuses_available(),
    ))
}

fn minor_parts(breakdown: &PriceBreakdown<'_>) -> [i64; 4] {
    [
        breakdown.subtotal().to_minor_units(),
        breakdown.discount().to_minor_units(),
        breakdown.bonuses_used().to_minor_units(),
        breakdown.total().to_minor_units(),
    ]
}

#[test]
fn scenario_fixtures_price_as_documented() -> TestResult {
    let expected = [
        ("scenario_a", [2000, 0, 0, 2000]),
        ("scenario_b", [2000, 200, 0, 1800]),
        ("scenario_c", [2000, 200, 1260, 540]),
        ("scenario_d", [2000, 2000, 0, 0]),
        ("scenario_e", [2000, 0, 50, 1950]),
        ("scenario_f", [2500, 0, 0, 2500]),
    ];

    for (name, parts) in expected {
        assert_eq!(minor_parts(&quote(name)?), parts, "fixture {name}");
    }

    Ok(())
}

#[test]
fn bundle_fixture_prices_and_renders() -> TestResult {
    let fixture = CartFixture::from_set("revit_bundle")?;
    let cart = fixture.cart()?;
    let promotion = fixture.promotion()?;

    let breakdown = compute_breakdown(
        &cart,
        promotion.as_ref(),
        fixture.bonuses_requested(),
        fixture.bonuses_available(),
    );

    // 99000 + 150000 + 32000 = 281000; 15% = 42150; cap floor(238850 * 0.7) = 167195 > 60000.
    assert_eq!(minor_parts(&breakdown), [281_000, 42_150, 60_000, 178_850], "breakdown");
    assert_eq!(breakdown.total(), Money::from_minor(178_850, RUB), "total");

    let mut out = Vec::new();

    BreakdownReceipt::new(&cart, &breakdown, promotion.as_ref()).write_to(&mut out)?;

    let rendered = String::from_utf8(out)?;

    assert!(rendered.contains("REVIT15"), "promotion row: {rendered}");
    assert!(rendered.contains("1042"), "product row: {rendered}");

    Ok(())
}

#[test]
fn missing_fixture_is_an_error() {
    assert!(CartFixture::from_set("no_such_cart").is_err(), "missing fixture");
}
