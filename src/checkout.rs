//! Checkout
//!
//! A [`CheckoutSession`] wires the persisted cart, the active promotion and the bonus request to
//! the store API. The breakdown is recomputed from a fresh cart snapshot on every read, so the
//! displayed total always matches the latest promotion and bonus input.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    cart::Cart,
    client::{ApiError, OrderItem, OrderRequest, PaymentDirective, StoreServices},
    items::ProductId,
    money::unsigned_minor,
    pricing::{PriceBreakdown, compute_breakdown},
    promotions::PromotionCode,
    store::{CartRepository, CartStoreError},
    view::{CheckoutSummaryView, checkout_summary},
};

/// Errors raised by the checkout flow. None of them change cart or promotion state.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Orders need at least one line item.
    #[error("cart is empty")]
    EmptyCart,

    /// No payment method was selected.
    #[error("no payment method selected")]
    MissingPaymentMethod,

    /// The contact email is malformed.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// A blank promotion code was submitted.
    #[error("promotion code is empty")]
    EmptyPromotionCode,

    /// The promotion service did not accept the code.
    #[error("promotion code {0} was not accepted")]
    PromotionRejected(String),

    /// Store API failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Cart store failure.
    #[error(transparent)]
    Store(#[from] CartStoreError),
}

/// How the user pays for the remainder after discounts and bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Bank card via the payment provider.
    Card,

    /// Telegram Stars.
    Stars,

    /// Covered by an active subscription.
    Subscription,
}

/// User input collected on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckoutForm {
    /// Selected payment method.
    pub payment_method: Option<PaymentMethod>,

    /// Optional contact email; blank counts as absent.
    pub email: Option<String>,
}

/// Cart, promotion and bonus state for one user's checkout.
#[derive(Debug)]
pub struct CheckoutSession<R> {
    repository: R,
    services: StoreServices,
    promotion: Option<PromotionCode>,
    bonuses_requested: u64,
    bonus_balance: u64,
}

impl<R: CartRepository> CheckoutSession<R> {
    /// Starts a session with no promotion, no bonus request and a zero bonus balance.
    pub fn new(repository: R, services: StoreServices) -> Self {
        Self {
            repository,
            services,
            promotion: None,
            bonuses_requested: 0,
            bonus_balance: 0,
        }
    }

    /// Sets the user's available bonus balance.
    #[must_use]
    pub fn with_bonus_balance(mut self, balance: u64) -> Self {
        self.bonus_balance = balance;
        self
    }

    /// Reads a fresh cart snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the cart cannot be read.
    pub fn cart(&self) -> Result<Cart<'static>, CheckoutError> {
        Ok(self.repository.load()?)
    }

    /// The active promotion.
    pub fn promotion(&self) -> Option<&PromotionCode> {
        self.promotion.as_ref()
    }

    /// Bonuses the user asked to redeem, before clamping.
    pub fn bonuses_requested(&self) -> u64 {
        self.bonuses_requested
    }

    /// The user's available bonus balance.
    pub fn bonus_balance(&self) -> u64 {
        self.bonus_balance
    }

    /// Sets the bonus redemption request. Excess is clamped when pricing, never rejected.
    pub fn set_bonuses_requested(&mut self, bonuses: u64) {
        self.bonuses_requested = bonuses;
    }

    /// Sets the user's available bonus balance.
    pub fn set_bonus_balance(&mut self, balance: u64) {
        self.bonus_balance = balance;
    }

    /// Looks up a product in the catalog and adds it to the cart.
    ///
    /// # Errors
    ///
    /// Returns a [`CheckoutError`] if the lookup fails, the catalog prices are invalid, or the
    /// cart cannot be saved.
    pub async fn add_product(&mut self, product_id: ProductId) -> Result<Cart<'static>, CheckoutError> {
        let details = self.services.catalog.product(product_id).await?;
        let currency = self.repository.load()?.currency();
        let item = details.to_line_item(currency)?;

        let cart = self.repository.add(item)?;

        debug!(%product_id, items = cart.len(), "product added to cart");

        Ok(cart)
    }

    /// Removes a product from the cart.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the cart cannot be updated.
    pub fn remove_product(&mut self, product_id: ProductId) -> Result<Cart<'static>, CheckoutError> {
        Ok(self.repository.remove(product_id)?)
    }

    /// Sets a product's quantity.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the product is not in the cart or the cart cannot be
    /// updated.
    pub fn update_quantity(
        &mut self,
        product_id: ProductId,
        quantity: u32,
    ) -> Result<Cart<'static>, CheckoutError> {
        Ok(self.repository.update_quantity(product_id, quantity)?)
    }

    /// Empties the cart and drops the promotion and bonus request.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the cart cannot be cleared.
    pub fn clear(&mut self) -> Result<(), CheckoutError> {
        self.repository.clear()?;
        self.promotion = None;
        self.bonuses_requested = 0;

        Ok(())
    }

    /// Validates `code` and makes it the active promotion, replacing any previous one.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyPromotionCode`]: `code` is blank; the service is not called.
    /// - [`CheckoutError::PromotionRejected`]: the service did not accept the code.
    /// - [`CheckoutError::Api`]: the request failed or the accepted shape was malformed.
    ///
    /// The active promotion is left untouched on every error.
    pub async fn apply_promotion(&mut self, code: &str) -> Result<&PromotionCode, CheckoutError> {
        let code = code.trim();

        if code.is_empty() {
            return Err(CheckoutError::EmptyPromotionCode);
        }

        let validation = self.services.promotions.validate(code).await?;

        let Some(promotion) = validation
            .into_promotion(code)
            .map_err(ApiError::InvalidPromotion)?
        else {
            info!(code, "promotion code rejected");

            return Err(CheckoutError::PromotionRejected(code.to_string()));
        };

        info!(code = promotion.code(), "promotion applied");

        Ok(self.promotion.insert(promotion))
    }

    /// Drops the active promotion, returning it.
    pub fn remove_promotion(&mut self) -> Option<PromotionCode> {
        self.promotion.take()
    }

    /// Prices the current cart with the active promotion and bonus request.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the cart cannot be read.
    pub fn breakdown(&self) -> Result<PriceBreakdown<'static>, CheckoutError> {
        let cart = self.repository.load()?;

        Ok(self.price(&cart))
    }

    /// Builds the checkout summary view-model for the current state.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::Store`] if the cart cannot be read.
    pub fn summary(&self) -> Result<CheckoutSummaryView, CheckoutError> {
        let cart = self.repository.load()?;
        let breakdown = self.price(&cart);

        Ok(checkout_summary(
            &cart,
            &breakdown,
            self.promotion.as_ref(),
            self.bonus_balance,
        ))
    }

    /// Submits the order.
    ///
    /// The form is validated before any request is made. The cart, promotion and bonus request are
    /// cleared only once the order service has accepted the order; on any failure before that they
    /// are left as they were. Once accepted, the directive is always returned: a cart that cannot
    /// be cleared is logged, not reported.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::EmptyCart`], [`CheckoutError::MissingPaymentMethod`],
    ///   [`CheckoutError::InvalidEmail`]: form validation failed.
    /// - [`CheckoutError::Api`]: the submission failed or the response was unusable.
    /// - [`CheckoutError::Store`]: the cart could not be read.
    pub async fn submit(&mut self, form: &CheckoutForm) -> Result<PaymentDirective, CheckoutError> {
        let cart = self.repository.load()?;

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let payment_method = form
            .payment_method
            .ok_or(CheckoutError::MissingPaymentMethod)?;

        let email = normalise_email(form.email.as_deref())?;
        let breakdown = self.price(&cart);

        let request = order_request(
            &cart,
            &breakdown,
            self.promotion.as_ref(),
            email,
            payment_method,
        );

        let directive = match self.services.orders.create_order(&request).await {
            Ok(response) => response.directive()?,
            Err(error) => {
                warn!(%error, "order submission failed; cart kept");

                return Err(error.into());
            }
        };

        // The order exists server-side from here on; nothing below may turn this into an error.
        self.promotion = None;
        self.bonuses_requested = 0;
        self.bonus_balance = self.bonus_balance.saturating_sub(request.bonuses_used);

        if let Err(error) = self.repository.clear() {
            warn!(%error, "order accepted but the cart could not be cleared");
        }

        info!(
            total = request.total,
            bonuses_used = request.bonuses_used,
            settled = matches!(directive, PaymentDirective::Settled),
            "order submitted"
        );

        Ok(directive)
    }

    fn price(&self, cart: &Cart<'static>) -> PriceBreakdown<'static> {
        compute_breakdown(
            cart,
            self.promotion.as_ref(),
            self.bonuses_requested,
            self.bonus_balance,
        )
    }
}

/// Builds the order body from a cart and its breakdown.
pub fn order_request(
    cart: &Cart<'_>,
    breakdown: &PriceBreakdown<'_>,
    promotion: Option<&PromotionCode>,
    email: Option<String>,
    payment_method: PaymentMethod,
) -> OrderRequest {
    OrderRequest {
        items: cart
            .items()
            .iter()
            .map(|item| OrderItem {
                product_id: item.product_id(),
                quantity: item.quantity(),
            })
            .collect(),
        promo_code: promotion.map(|promotion| promotion.code().to_string()),
        bonuses_used: unsigned_minor(&breakdown.bonuses_used()),
        total: unsigned_minor(&breakdown.total()),
        email,
        payment_method,
    }
}

/// Trims the email; blank means absent. Anything left must look like `local@domain.tld`.
fn normalise_email(email: Option<&str>) -> Result<Option<String>, CheckoutError> {
    let Some(email) = email.map(str::trim).filter(|email| !email.is_empty()) else {
        return Ok(None);
    };

    let plausible = email.split_once('@').is_some_and(|(local, domain)| {
        !local.is_empty()
            && !domain.contains('@')
            && domain
                .split_once('.')
                .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
            && !email.chars().any(char::is_whitespace)
    });

    if plausible {
        Ok(Some(email.to_string()))
    } else {
        Err(CheckoutError::InvalidEmail(email.to_string()))
    }
}
