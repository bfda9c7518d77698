//! Store API client
//!
//! Wire types and service traits for the marketplace HTTP API: catalog lookup, promotion
//! validation and order submission. [`HttpStoreClient`] implements all three over `reqwest`.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use mockall::automock;
use reqwest::{Client, Response, StatusCode};
use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    checkout::PaymentMethod,
    items::{LineItem, LineItemError, ProductId},
    promotions::{DiscountType, PromotionCode, PromotionError},
};

/// Errors that can occur when talking to the store API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An HTTP transport or serialization error occurred.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-2xx status.
    #[error("{operation} failed with status {status}: {body}")]
    Status {
        /// Which call failed
        operation: &'static str,

        /// Response status
        status: StatusCode,

        /// Response body, or why it could not be read
        body: String,
    },

    /// The API returned a 2xx response whose body makes no sense.
    #[error("unexpected response from store API: {0}")]
    UnexpectedResponse(String),

    /// The catalog returned prices that cannot form a line item.
    #[error("catalog returned invalid prices for product {0}")]
    InvalidProduct(ProductId, #[source] LineItemError),

    /// The promotion service accepted a code with a malformed discount.
    #[error(transparent)]
    InvalidPromotion(#[from] PromotionError),
}

/// Catalog product as returned by `GET /products/{id}`. Prices are minor units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDetails {
    /// Product id
    pub id: ProductId,

    /// List price
    pub price: i64,

    /// Discounted price, when a per-item discount is active
    #[serde(default)]
    pub current_price: Option<i64>,

    /// Per-item discount shown on the product card
    #[serde(default)]
    pub discount_percent: Option<Decimal>,

    /// Stock keeping unit
    #[serde(default)]
    pub sku: Option<String>,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Preview image URLs
    #[serde(default)]
    pub preview_images: Vec<String>,
}

impl ProductDetails {
    /// Builds a cart line item (quantity unset) priced in `currency`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidProduct`] if a price is negative or the current price is above
    /// the list price.
    pub fn to_line_item<'a>(&self, currency: &'a Currency) -> Result<LineItem<'a>, ApiError> {
        let build = || -> Result<LineItem<'a>, LineItemError> {
            let item = LineItem::new(self.id, Money::from_minor(self.price, currency))?;

            match self.current_price {
                Some(current) => item.with_current_price(Money::from_minor(current, currency)),
                None => Ok(item),
            }
        };

        build().map_err(|source| ApiError::InvalidProduct(self.id, source))
    }
}

/// Promotion validation result from `POST /promo/validate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromotionValidation {
    /// Whether the code was accepted
    pub valid: bool,

    /// Canonical code, if the service normalised it
    #[serde(default)]
    pub code: Option<String>,

    /// Discount type
    #[serde(default)]
    pub discount_type: Option<DiscountType>,

    /// Percent points or minor units
    #[serde(default)]
    pub discount_value: Option<Decimal>,
}

impl PromotionValidation {
    /// A rejection.
    pub fn invalid() -> Self {
        Self {
            valid: false,
            code: None,
            discount_type: None,
            discount_value: None,
        }
    }

    /// Converts an accepted validation into a [`PromotionCode`]; a rejection yields `None`.
    ///
    /// `entered` is used when the service does not echo the code back.
    ///
    /// # Errors
    ///
    /// Returns a [`PromotionError`] if an accepted code has a malformed discount.
    pub fn into_promotion(self, entered: &str) -> Result<Option<PromotionCode>, PromotionError> {
        if !self.valid {
            return Ok(None);
        }

        let code = self.code.unwrap_or_else(|| entered.to_string());

        let (Some(discount_type), Some(discount_value)) = (self.discount_type, self.discount_value)
        else {
            return Err(PromotionError::IncompleteShape(code));
        };

        PromotionCode::try_new(code, discount_type, discount_value).map(Some)
    }
}

/// One ordered product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product id
    pub product_id: ProductId,

    /// Effective quantity
    pub quantity: u32,
}

/// Order creation body for `POST /orders`. Amounts are minor units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Ordered products
    pub items: Vec<OrderItem>,

    /// Applied promotion code
    pub promo_code: Option<String>,

    /// Bonuses redeemed
    pub bonuses_used: u64,

    /// Amount to charge
    pub total: u64,

    /// Contact email for the receipt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Selected payment method
    pub payment_method: PaymentMethod,
}

/// Order creation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderResponse {
    /// Where to send the user to pay
    #[serde(default)]
    pub payment_url: Option<String>,

    /// Set when nothing is left to pay
    #[serde(default)]
    pub success: bool,
}

/// What to do after an order is accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDirective {
    /// Redirect to the payment page.
    Redirect(String),

    /// Already settled by bonuses or a subscription.
    Settled,
}

impl OrderResponse {
    /// Interprets the response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::UnexpectedResponse`] if there is neither a payment URL nor a success
    /// flag.
    pub fn directive(&self) -> Result<PaymentDirective, ApiError> {
        match self.payment_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(PaymentDirective::Redirect(url.to_string())),
            _ if self.success => Ok(PaymentDirective::Settled),
            _ => Err(ApiError::UnexpectedResponse(
                "order response has neither a payment_url nor success".to_string(),
            )),
        }
    }
}

/// Catalog lookup.
#[automock]
#[async_trait]
pub trait CatalogService: Send + Sync {
    /// Retrieve a single product.
    async fn product(&self, id: ProductId) -> Result<ProductDetails, ApiError>;
}

/// Promotion code validation.
#[automock]
#[async_trait]
pub trait PromotionService: Send + Sync {
    /// Validate a promotion code.
    async fn validate(&self, code: &str) -> Result<PromotionValidation, ApiError>;
}

/// Order submission.
#[automock]
#[async_trait]
pub trait OrderService: Send + Sync {
    /// Submit an order.
    async fn create_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError>;
}

/// The remote services a checkout depends on.
#[derive(Clone)]
pub struct StoreServices {
    /// Catalog lookup
    pub catalog: Arc<dyn CatalogService>,

    /// Promotion validation
    pub promotions: Arc<dyn PromotionService>,

    /// Order submission
    pub orders: Arc<dyn OrderService>,
}

impl StoreServices {
    /// Uses one HTTP client for every service.
    pub fn http(client: HttpStoreClient) -> Self {
        let client = Arc::new(client);

        Self {
            catalog: client.clone(),
            promotions: client.clone(),
            orders: client,
        }
    }
}

impl std::fmt::Debug for StoreServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreServices").finish_non_exhaustive()
    }
}

/// Connection settings for the store API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API base URL, e.g. `"https://shop.example/api"`.
    pub base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

/// HTTP client for the store API.
#[derive(Debug, Clone)]
pub struct HttpStoreClient {
    base_url: String,
    http: Client,
}

impl HttpStoreClient {
    /// Create a new client from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let http = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl CatalogService for HttpStoreClient {
    async fn product(&self, id: ProductId) -> Result<ProductDetails, ApiError> {
        let url = self.endpoint(&format!("products/{id}"));

        debug!(%url, "fetching product");

        let response = self.http.get(&url).send().await?;

        parse_success(response, "product lookup").await
    }
}

#[async_trait]
impl PromotionService for HttpStoreClient {
    async fn validate(&self, code: &str) -> Result<PromotionValidation, ApiError> {
        let url = self.endpoint("promo/validate");

        debug!(%url, code, "validating promotion code");

        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({ "code": code }))
            .send()
            .await?;

        if response.status().is_client_error() {
            debug!(status = response.status().as_u16(), code, "promotion code rejected");

            return Ok(PromotionValidation::invalid());
        }

        parse_success(response, "promotion validation").await
    }
}

#[async_trait]
impl OrderService for HttpStoreClient {
    async fn create_order(&self, order: &OrderRequest) -> Result<OrderResponse, ApiError> {
        let url = self.endpoint("orders");

        debug!(%url, items = order.items.len(), total = order.total, "submitting order");

        let response = self.http.post(&url).json(order).send().await?;

        parse_success(response, "order submission").await
    }
}

async fn parse_success<T: DeserializeOwned>(
    response: Response,
    operation: &'static str,
) -> Result<T, ApiError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(error) => {
            warn!(%error, operation, "could not read error response body");

            format!("<unreadable body: {error}>")
        }
    };

    warn!(status = status.as_u16(), operation, "store API request failed");

    Err(ApiError::Status {
        operation,
        status,
        body,
    })
}
