//! Cart

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    items::{LineItem, ProductId},
    pricing::compute_subtotal,
};

/// Errors related to cart construction or mutation.
#[derive(Debug, Error, PartialEq)]
pub enum CartError {
    /// An item's currency differs from the cart currency (index, item currency, cart currency).
    #[error("Item {0} has currency {1}, but cart has currency {2}")]
    CurrencyMismatch(usize, &'static str, &'static str),

    /// The same product appears more than once.
    #[error("Product {0} appears more than once")]
    DuplicateProduct(ProductId),

    /// The product is not in the cart.
    #[error("Product {0} is not in the cart")]
    NotInCart(ProductId),
}

/// Cart
///
/// Line items keyed by product id, in insertion order, all priced in one currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Cart<'a> {
    items: Vec<LineItem<'a>>,
    currency: &'a Currency,
}

impl<'a> Cart<'a> {
    /// Create an empty cart in the given currency.
    pub fn new(currency: &'a Currency) -> Self {
        Cart {
            items: Vec::new(),
            currency,
        }
    }

    /// Create a new cart with the given items.
    ///
    /// # Errors
    ///
    /// Returns a `CartError` if an item is in another currency or a product is repeated.
    pub fn with_items(
        items: impl Into<Vec<LineItem<'a>>>,
        currency: &'a Currency,
    ) -> Result<Self, CartError> {
        let items = items.into();

        items.iter().enumerate().try_for_each(|(i, item)| {
            ensure_currency(i, item, currency)?;

            if items
                .iter()
                .take(i)
                .any(|earlier| earlier.product_id() == item.product_id())
            {
                return Err(CartError::DuplicateProduct(item.product_id()));
            }

            Ok(())
        })?;

        Ok(Cart { items, currency })
    }

    /// Add an item to the cart.
    ///
    /// Adding a product that is already present refreshes its prices and sums the quantities.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::CurrencyMismatch`] if the item is in another currency.
    pub fn add(&mut self, item: LineItem<'a>) -> Result<(), CartError> {
        ensure_currency(self.items.len(), &item, self.currency)?;

        match self
            .items
            .iter_mut()
            .find(|existing| existing.product_id() == item.product_id())
        {
            Some(existing) => {
                let quantity = existing.quantity().saturating_add(item.quantity());

                existing.refresh_prices(&item);
                existing.set_quantity(quantity);
            }
            None => self.items.push(item),
        }

        Ok(())
    }

    /// Remove a product from the cart, returning its line item if it was present.
    pub fn remove(&mut self, product_id: ProductId) -> Option<LineItem<'a>> {
        let position = self
            .items
            .iter()
            .position(|item| item.product_id() == product_id)?;

        Some(self.items.remove(position))
    }

    /// Set the quantity of a product.
    ///
    /// A quantity of `0` is kept and priced as one unit; use [`Cart::remove`] to drop a product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::NotInCart`] if the product is not in the cart.
    pub fn update_quantity(&mut self, product_id: ProductId, quantity: u32) -> Result<(), CartError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.product_id() == product_id)
            .ok_or(CartError::NotInCart(product_id))?;

        item.set_quantity(quantity);

        Ok(())
    }

    /// Remove every item.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Look up a product's line item.
    pub fn get(&self, product_id: ProductId) -> Option<&LineItem<'a>> {
        self.items
            .iter()
            .find(|item| item.product_id() == product_id)
    }

    /// Line items in insertion order.
    pub fn items(&self) -> &[LineItem<'a>] {
        &self.items
    }

    /// Calculate the subtotal of the cart.
    pub fn subtotal(&self) -> Money<'a, Currency> {
        compute_subtotal(self)
    }

    /// Get the number of line items in the cart.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the currency of the cart.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }
}

fn ensure_currency(
    index: usize,
    item: &LineItem<'_>,
    currency: &Currency,
) -> Result<(), CartError> {
    let item_currency = item.unit_price().currency();

    if item_currency == currency {
        Ok(())
    } else {
        Err(CartError::CurrencyMismatch(
            index,
            item_currency.iso_alpha_code,
            currency.iso_alpha_code,
        ))
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso};
    use testresult::TestResult;

    use super::*;

    fn line(id: u64, price: i64) -> Result<LineItem<'static>, crate::items::LineItemError> {
        LineItem::new(ProductId::new(id), Money::from_minor(price, iso::RUB))
    }

    fn test_items() -> Result<[LineItem<'static>; 3], crate::items::LineItemError> {
        Ok([line(1, 100)?, line(2, 200)?, line(3, 300)?])
    }

    #[test]
    fn new_with_currency() {
        let cart = Cart::new(iso::RUB);

        assert_eq!(cart.currency(), iso::RUB);
        assert!(cart.is_empty());
    }

    #[test]
    fn with_items_currency_mismatch_errors() -> TestResult {
        let items = [
            line(1, 100)?,
            LineItem::new(ProductId::new(2), Money::from_minor(100, iso::USD))?,
        ];

        let result = Cart::with_items(items, iso::RUB);

        assert_eq!(
            result,
            Err(CartError::CurrencyMismatch(
                1,
                iso::USD.iso_alpha_code,
                iso::RUB.iso_alpha_code
            ))
        );

        Ok(())
    }

    #[test]
    fn with_items_rejects_duplicate_products() -> TestResult {
        let result = Cart::with_items([line(1, 100)?, line(1, 200)?], iso::RUB);

        assert_eq!(result, Err(CartError::DuplicateProduct(ProductId::new(1))));

        Ok(())
    }

    #[test]
    fn add_existing_product_sums_quantities_and_refreshes_prices() -> TestResult {
        let mut cart = Cart::with_items([line(1, 100)?.with_quantity(2)], iso::RUB)?;

        cart.add(line(1, 150)?)?;

        let item = cart.get(ProductId::new(1)).ok_or("missing item")?;

        assert_eq!(cart.len(), 1);
        assert_eq!(item.quantity(), 3);
        assert_eq!(item.unit_price(), &Money::from_minor(150, iso::RUB));

        Ok(())
    }

    #[test]
    fn add_rejects_other_currency() -> TestResult {
        let mut cart = Cart::new(iso::RUB);

        let result = cart.add(LineItem::new(
            ProductId::new(1),
            Money::from_minor(100, iso::EUR),
        )?);

        assert!(matches!(result, Err(CartError::CurrencyMismatch(0, "EUR", "RUB"))));
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn remove_returns_removed_item() -> TestResult {
        let mut cart = Cart::with_items(test_items()?, iso::RUB)?;

        let removed = cart.remove(ProductId::new(2));

        assert_eq!(removed.map(|item| item.product_id()), Some(ProductId::new(2)));
        assert_eq!(cart.len(), 2);
        assert_eq!(cart.remove(ProductId::new(2)), None);

        Ok(())
    }

    #[test]
    fn update_quantity_unknown_product_errors() -> TestResult {
        let mut cart = Cart::with_items(test_items()?, iso::RUB)?;

        assert_eq!(
            cart.update_quantity(ProductId::new(9), 2),
            Err(CartError::NotInCart(ProductId::new(9)))
        );

        Ok(())
    }

    #[test]
    fn update_quantity_to_zero_keeps_item() -> TestResult {
        let mut cart = Cart::with_items(test_items()?, iso::RUB)?;

        cart.update_quantity(ProductId::new(3), 0)?;

        assert_eq!(cart.len(), 3);
        assert_eq!(cart.subtotal(), Money::from_minor(600, iso::RUB));

        Ok(())
    }

    #[test]
    fn subtotal_with_items() -> TestResult {
        let cart = Cart::with_items(test_items()?, iso::RUB)?;

        assert_eq!(cart.subtotal(), Money::from_minor(600, iso::RUB));

        Ok(())
    }

    #[test]
    fn clear_empties_cart() -> TestResult {
        let mut cart = Cart::with_items(test_items()?, iso::RUB)?;

        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Money::from_minor(0, iso::RUB));

        Ok(())
    }
}
