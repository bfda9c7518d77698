//! Cart Store
//!
//! The persisted cart is the only source of truth for line items. Pricing always reads a fresh
//! snapshot from a [`CartRepository`]; nothing holds a cart in ambient global state.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    cart::{Cart, CartError},
    items::{LineItem, LineItemError, ProductId},
    money::currency_for_code,
};

/// Errors raised while reading or writing the persisted cart.
#[derive(Debug, Error)]
pub enum CartStoreError {
    /// Reading or writing the cart file failed.
    #[error("cart store I/O error: {0}")]
    Io(#[from] io::Error),

    /// The cart file is not valid JSON for a cart.
    #[error("cart store JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The stored currency code is not a known ISO currency.
    #[error("unknown currency code in cart store: {0}")]
    UnknownCurrency(String),

    /// A stored line item violates a line item invariant.
    #[error(transparent)]
    LineItem(#[from] LineItemError),

    /// The stored items do not form a valid cart, or a mutation was rejected.
    #[error(transparent)]
    Cart(#[from] CartError),
}

/// Persistent cart state.
///
/// Implementors provide `load` and `save`; every mutation loads a snapshot, applies the change and
/// saves it back, returning the new snapshot.
pub trait CartRepository {
    /// Reads the current cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the stored cart cannot be read.
    fn load(&self) -> Result<Cart<'static>, CartStoreError>;

    /// Replaces the stored cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] if the cart cannot be written.
    fn save(&mut self, cart: &Cart<'static>) -> Result<(), CartStoreError>;

    /// Adds a line item, merging with an existing entry for the same product.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] on storage failure or a currency mismatch.
    fn add(&mut self, item: LineItem<'static>) -> Result<Cart<'static>, CartStoreError> {
        let mut cart = self.load()?;
        cart.add(item)?;
        self.save(&cart)?;

        Ok(cart)
    }

    /// Removes a product. Removing a product that is not in the cart is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] on storage failure.
    fn remove(&mut self, product_id: ProductId) -> Result<Cart<'static>, CartStoreError> {
        let mut cart = self.load()?;

        if cart.remove(product_id).is_some() {
            self.save(&cart)?;
        }

        Ok(cart)
    }

    /// Sets a product's quantity.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] on storage failure or if the product is not in the cart.
    fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart<'static>, CartStoreError> {
        let mut cart = self.load()?;
        cart.update_quantity(product_id, quantity)?;
        self.save(&cart)?;

        Ok(cart)
    }

    /// Empties the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CartStoreError`] on storage failure.
    fn clear(&mut self) -> Result<Cart<'static>, CartStoreError> {
        let mut cart = self.load()?;
        cart.clear();
        self.save(&cart)?;

        Ok(cart)
    }
}

/// In-process cart store.
#[derive(Debug, Clone)]
pub struct MemoryCartRepository {
    cart: Cart<'static>,
}

impl MemoryCartRepository {
    /// Creates an empty store in the given currency.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            cart: Cart::new(currency),
        }
    }

    /// Creates a store holding `cart`.
    pub fn with_cart(cart: Cart<'static>) -> Self {
        Self { cart }
    }
}

impl CartRepository for MemoryCartRepository {
    fn load(&self) -> Result<Cart<'static>, CartStoreError> {
        Ok(self.cart.clone())
    }

    fn save(&mut self, cart: &Cart<'static>) -> Result<(), CartStoreError> {
        self.cart = cart.clone();

        Ok(())
    }
}

/// Cart store backed by a JSON file, surviving restarts.
#[derive(Debug, Clone)]
pub struct JsonCartRepository {
    path: PathBuf,
    currency: &'static Currency,
}

impl JsonCartRepository {
    /// Creates a store at `path`. A missing file reads as an empty cart in `currency`.
    pub fn new(path: impl Into<PathBuf>, currency: &'static Currency) -> Self {
        Self {
            path: path.into(),
            currency,
        }
    }

    /// Location of the cart file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CartRepository for JsonCartRepository {
    fn load(&self) -> Result<Cart<'static>, CartStoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "cart file missing; starting empty");

                return Ok(Cart::new(self.currency));
            }
            Err(error) => return Err(error.into()),
        };

        let stored: StoredCart = serde_json::from_str(&contents)?;
        let cart = Cart::try_from(stored)?;

        debug!(path = %self.path.display(), items = cart.len(), "cart loaded");

        Ok(cart)
    }

    fn save(&mut self, cart: &Cart<'static>) -> Result<(), CartStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&StoredCart::from(cart))?;
        let staging = self.path.with_extension("json.tmp");

        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;

        debug!(path = %self.path.display(), items = cart.len(), "cart saved");

        Ok(())
    }
}

/// On-disk cart layout; prices are minor units of `currency`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredCart {
    currency: String,

    #[serde(default)]
    items: Vec<StoredLineItem>,
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredLineItem {
    product_id: ProductId,
    unit_price: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    current_price: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
}

impl From<&Cart<'_>> for StoredCart {
    fn from(cart: &Cart<'_>) -> Self {
        Self {
            currency: cart.currency().iso_alpha_code.to_string(),
            items: cart
                .items()
                .iter()
                .map(|item| StoredLineItem {
                    product_id: item.product_id(),
                    unit_price: item.unit_price().to_minor_units(),
                    current_price: item.current_price().map(Money::to_minor_units),
                    quantity: item.raw_quantity(),
                })
                .collect(),
        }
    }
}

impl TryFrom<StoredCart> for Cart<'static> {
    type Error = CartStoreError;

    fn try_from(stored: StoredCart) -> Result<Self, Self::Error> {
        let currency = currency_for_code(&stored.currency)
            .ok_or_else(|| CartStoreError::UnknownCurrency(stored.currency.clone()))?;

        let items = stored
            .items
            .into_iter()
            .map(|stored_item| {
                let mut item = LineItem::new(
                    stored_item.product_id,
                    Money::from_minor(stored_item.unit_price, currency),
                )?;

                if let Some(current_price) = stored_item.current_price {
                    item = item.with_current_price(Money::from_minor(current_price, currency))?;
                }

                if let Some(quantity) = stored_item.quantity {
                    item = item.with_quantity(quantity);
                }

                Ok(item)
            })
            .collect::<Result<Vec<_>, CartStoreError>>()?;

        Ok(Cart::with_items(items, currency)?)
    }
}
