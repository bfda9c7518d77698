//! famshop
//!
//! Cart pricing, promotion stacking and checkout for a marketplace of Revit family archives.
//!
//! Every caller prices a cart through one pass, [`pricing::compute_breakdown`]: per-item prices
//! make the subtotal, a promotion code discounts it, bonuses cover up to 70% of what is left, and
//! the remainder is the total. [`checkout::CheckoutSession`] drives that pass against a persisted
//! cart and the store API.

pub mod bonuses;
pub mod cart;
pub mod checkout;
pub mod client;
pub mod config;
pub mod fixtures;
pub mod items;
pub mod money;
pub mod observability;
pub mod prelude;
pub mod pricing;
pub mod promotions;
pub mod receipt;
pub mod store;
pub mod view;

#[cfg(test)]
mod test_support;
