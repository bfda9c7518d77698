//! Fixtures
//!
//! YAML cart fixtures used by the `quote` command and the integration tests.
//!
//! ```yaml
//! currency: RUB
//! items:
//!   - product_id: 1
//!     price: "10.00 RUB"
//!     current_price: "8.00 RUB"
//!     quantity: 2
//! promotion:
//!   code: SPRING10
//!   type: percent
//!   value: 10
//! bonuses:
//!   requested: 2000
//!   available: 5000
//! ```
//!
//! Prices are `AMOUNT CURRENCY` in major units. Fixed promotion values and bonuses are minor
//! units, matching the store API.

use std::{
    fs,
    path::{Path, PathBuf},
};

use rust_decimal::{Decimal, prelude::ToPrimitive};
use rusty_money::{Money, iso::Currency};
use serde::Deserialize;
use thiserror::Error;

use crate::{
    cart::{Cart, CartError},
    items::{LineItem, LineItemError, ProductId},
    money::currency_for_code,
    promotions::{DiscountType, PromotionCode, PromotionError},
};

/// Fixture Parsing Errors
#[derive(Debug, Error)]
pub enum FixtureError {
    /// IO error reading fixture files
    #[error("Failed to read fixture file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("Invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("Unknown currency code: {0}")]
    UnknownCurrency(String),

    /// A price is in a different currency than the fixture
    #[error("Currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// Line item invariant violated
    #[error(transparent)]
    LineItem(#[from] LineItemError),

    /// Cart creation error
    #[error("Failed to create cart: {0}")]
    Cart(#[from] CartError),

    /// Promotion shape rejected
    #[error("Invalid promotion: {0}")]
    Promotion(#[from] PromotionError),
}

/// A cart with an optional promotion and bonus request.
#[derive(Debug, Clone, Deserialize)]
pub struct CartFixture {
    /// ISO currency code for the cart
    pub currency: String,

    /// Line items
    #[serde(default)]
    pub items: Vec<LineItemFixture>,

    /// Applied promotion
    #[serde(default)]
    pub promotion: Option<PromotionFixture>,

    /// Bonus request and balance
    #[serde(default)]
    pub bonuses: BonusFixture,
}

/// Line Item Fixture
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemFixture {
    /// Product id
    pub product_id: u64,

    /// List price (e.g., "10.00 RUB")
    pub price: String,

    /// Discounted price
    #[serde(default)]
    pub current_price: Option<String>,

    /// Quantity; omitted means unset
    #[serde(default)]
    pub quantity: Option<u32>,
}

/// Promotion Fixture
#[derive(Debug, Clone, Deserialize)]
pub struct PromotionFixture {
    /// Code
    pub code: String,

    /// `percent` or `fixed`
    #[serde(rename = "type")]
    pub discount_type: DiscountType,

    /// Percent points or minor units
    pub value: Decimal,
}

/// Bonus Fixture
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct BonusFixture {
    /// Bonuses the user asks to redeem
    #[serde(default)]
    pub requested: u64,

    /// Bonuses the user holds
    #[serde(default)]
    pub available: u64,
}

impl CartFixture {
    /// Load a fixture from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FixtureError> {
        let contents = fs::read_to_string(path)?;

        Ok(serde_norway::from_str(&contents)?)
    }

    /// Load `./fixtures/carts/{name}.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_set(name: &str) -> Result<Self, FixtureError> {
        Self::from_set_in("./fixtures", name)
    }

    /// Load `{base_path}/carts/{name}.yaml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_set_in(base_path: impl Into<PathBuf>, name: &str) -> Result<Self, FixtureError> {
        let file_path = base_path.into().join("carts").join(format!("{name}.yaml"));

        Self::from_path(file_path)
    }

    /// The fixture's currency.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::UnknownCurrency`] for an unrecognised code.
    pub fn currency(&self) -> Result<&'static Currency, FixtureError> {
        currency_for_code(&self.currency)
            .ok_or_else(|| FixtureError::UnknownCurrency(self.currency.clone()))
    }

    /// Build the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if a price is malformed or in another currency, or if the items do not
    /// form a valid cart.
    pub fn cart(&self) -> Result<Cart<'static>, FixtureError> {
        let currency = self.currency()?;

        let items = self
            .items
            .iter()
            .map(|item| item.to_line_item(currency))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Cart::with_items(items, currency)?)
    }

    /// Build the promotion, if any.
    ///
    /// # Errors
    ///
    /// Returns [`FixtureError::Promotion`] if the value does not fit the type.
    pub fn promotion(&self) -> Result<Option<PromotionCode>, FixtureError> {
        self.promotion
            .as_ref()
            .map(|promotion| {
                PromotionCode::try_new(
                    promotion.code.clone(),
                    promotion.discount_type,
                    promotion.value,
                )
            })
            .transpose()
            .map_err(FixtureError::from)
    }

    /// Bonuses requested, in minor units.
    pub fn bonuses_requested(&self) -> u64 {
        self.bonuses.requested
    }

    /// Bonuses available, in minor units.
    pub fn bonuses_available(&self) -> u64 {
        self.bonuses.available
    }
}

impl LineItemFixture {
    fn to_line_item(&self, currency: &'static Currency) -> Result<LineItem<'static>, FixtureError> {
        let mut item = LineItem::new(
            ProductId::new(self.product_id),
            price_in(&self.price, currency)?,
        )?;

        if let Some(current_price) = &self.current_price {
            item = item.with_current_price(price_in(current_price, currency)?)?;
        }

        if let Some(quantity) = self.quantity {
            item = item.with_quantity(quantity);
        }

        Ok(item)
    }
}

fn price_in(
    s: &str,
    currency: &'static Currency,
) -> Result<Money<'static, Currency>, FixtureError> {
    let (minor_units, price_currency) = parse_price(s)?;

    if price_currency != currency {
        return Err(FixtureError::CurrencyMismatch(
            currency.iso_alpha_code.to_string(),
            price_currency.iso_alpha_code.to_string(),
        ));
    }

    Ok(Money::from_minor(minor_units, currency))
}

/// Parse price string (e.g., "10.00 RUB") into minor units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY",
/// if the amount is not a decimal number, or if the currency code
/// is not recognized.
pub fn parse_price(s: &str) -> Result<(i64, &'static Currency), FixtureError> {
    let parts: Vec<&str> = s.split_whitespace().collect();

    let [amount, currency_code] = parts.as_slice() else {
        return Err(FixtureError::InvalidPrice(format!(
            "Expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<Decimal>()
        .map_err(|_err| FixtureError::InvalidPrice(s.to_string()))?;

    let currency = currency_for_code(currency_code)
        .ok_or_else(|| FixtureError::UnknownCurrency((*currency_code).to_string()))?;

    let minor_units = amount
        .checked_mul(Decimal::from(10_i64.pow(currency.exponent)))
        .and_then(|value| value.round_dp(0).to_i64())
        .ok_or_else(|| FixtureError::InvalidPrice(s.to_string()))?;

    Ok((minor_units, currency))
}
