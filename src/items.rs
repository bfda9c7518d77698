//! Line Items

use std::fmt;

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Catalog identifier of a product; unique within a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Wraps a raw catalog id.
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw catalog id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors raised while building a line item.
#[derive(Debug, Error, PartialEq)]
pub enum LineItemError {
    /// A price was below zero (product id, minor units).
    #[error("product {0} has a negative price of {1} minor units")]
    NegativePrice(ProductId, i64),

    /// The discounted price is higher than the list price (product id, current, unit).
    #[error("product {0} has a current price of {1} above its unit price of {2}")]
    CurrentPriceAboveUnitPrice(ProductId, i64, i64),

    /// The discounted price is in another currency (product id, current, unit).
    #[error("product {0} has a current price in {1}, but its unit price is in {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),
}

/// One product entry in a cart.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LineItem<'a> {
    product_id: ProductId,
    unit_price: Money<'a, Currency>,
    current_price: Option<Money<'a, Currency>>,
    quantity: Option<u32>,
}

impl<'a> LineItem<'a> {
    /// Creates a line item at its list price with no explicit quantity.
    ///
    /// # Errors
    ///
    /// Returns [`LineItemError::NegativePrice`] if `unit_price` is below zero.
    pub fn new(product_id: ProductId, unit_price: Money<'a, Currency>) -> Result<Self, LineItemError> {
        ensure_non_negative(product_id, &unit_price)?;

        Ok(Self {
            product_id,
            unit_price,
            current_price: None,
            quantity: None,
        })
    }

    /// Sets the per-item discounted price.
    ///
    /// # Errors
    ///
    /// - [`LineItemError::NegativePrice`]: `price` is below zero.
    /// - [`LineItemError::CurrencyMismatch`]: `price` is not in the unit price currency.
    /// - [`LineItemError::CurrentPriceAboveUnitPrice`]: `price` is above the unit price.
    pub fn with_current_price(mut self, price: Money<'a, Currency>) -> Result<Self, LineItemError> {
        ensure_non_negative(self.product_id, &price)?;

        if price.currency() != self.unit_price.currency() {
            return Err(LineItemError::CurrencyMismatch(
                self.product_id,
                price.currency().iso_alpha_code,
                self.unit_price.currency().iso_alpha_code,
            ));
        }

        if price.to_minor_units() > self.unit_price.to_minor_units() {
            return Err(LineItemError::CurrentPriceAboveUnitPrice(
                self.product_id,
                price.to_minor_units(),
                self.unit_price.to_minor_units(),
            ));
        }

        self.current_price = Some(price);

        Ok(self)
    }

    /// Sets the raw quantity. See [`LineItem::quantity`] for how `0` is priced.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Returns the product id
    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    /// Returns the list price of a single unit
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Returns the discounted price of a single unit, if one applies
    pub fn current_price(&self) -> Option<&Money<'a, Currency>> {
        self.current_price.as_ref()
    }

    /// Returns the quantity as stored, before defaulting.
    pub fn raw_quantity(&self) -> Option<u32> {
        self.quantity
    }

    /// Returns the quantity used for pricing.
    ///
    /// An absent or zero quantity counts as one unit; it never means "not in cart".
    pub fn quantity(&self) -> u32 {
        match self.quantity {
            Some(0) | None => 1,
            Some(quantity) => quantity,
        }
    }

    /// Returns the price actually charged for one unit.
    pub fn effective_unit_price(&self) -> &Money<'a, Currency> {
        self.current_price.as_ref().unwrap_or(&self.unit_price)
    }

    /// Returns `effective_unit_price × quantity` in minor units, saturating on overflow.
    pub fn line_total_minor(&self) -> i64 {
        self.effective_unit_price()
            .to_minor_units()
            .saturating_mul(i64::from(self.quantity()))
    }

    /// Returns `effective_unit_price × quantity`.
    pub fn line_total(&self) -> Money<'a, Currency> {
        Money::from_minor(self.line_total_minor(), self.unit_price.currency())
    }

    /// Replaces both prices with those of `other`, keeping this item's quantity.
    pub(crate) fn refresh_prices(&mut self, other: &LineItem<'a>) {
        self.unit_price = other.unit_price;
        self.current_price = other.current_price;
    }

    /// Sets the stored quantity.
    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = Some(quantity);
    }
}

fn ensure_non_negative(
    product_id: ProductId,
    price: &Money<'_, Currency>,
) -> Result<(), LineItemError> {
    if price.to_minor_units() < 0 {
        Err(LineItemError::NegativePrice(
            product_id,
            price.to_minor_units(),
        ))
    } else {
        Ok(())
    }
}
