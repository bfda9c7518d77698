//! famshop prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    bonuses::{BONUS_CAP_PERCENT, max_bonuses, redeemable_bonuses},
    cart::{Cart, CartError},
    checkout::{CheckoutError, CheckoutForm, CheckoutSession, PaymentMethod},
    client::{
        ApiConfig, ApiError, CatalogService, HttpStoreClient, OrderService, PaymentDirective,
        PromotionService, StoreServices,
    },
    items::{LineItem, LineItemError, ProductId},
    pricing::{PriceBreakdown, compute_breakdown, compute_subtotal, max_redeemable_bonuses},
    promotions::{DiscountType, PromotionCode, PromotionError},
    receipt::{BreakdownReceipt, ReceiptError},
    store::{CartRepository, CartStoreError, JsonCartRepository, MemoryCartRepository},
    view::{CartSummaryView, CheckoutSummaryView, cart_summary, checkout_summary},
};
