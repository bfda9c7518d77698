use std::error::Error;

use rusty_money::{Money, iso::RUB};

use crate::{
    cart::Cart,
    items::{LineItem, ProductId},
};

pub(crate) type TestOutcome<T> = Result<T, Box<dyn Error>>;

/// Line item priced in RUB minor units with an explicit quantity.
pub(crate) fn line(id: u64, price: i64, quantity: u32) -> TestOutcome<LineItem<'static>> {
    Ok(LineItem::new(ProductId::new(id), Money::from_minor(price, RUB))?.with_quantity(quantity))
}

/// RUB cart from `(product id, price, quantity)` tuples.
pub(crate) fn cart(lines: &[(u64, i64, u32)]) -> TestOutcome<Cart<'static>> {
    let items = lines
        .iter()
        .map(|&(id, price, quantity)| line(id, price, quantity))
        .collect::<TestOutcome<Vec<_>>>()?;

    Ok(Cart::with_items(items, RUB)?)
}

pub(crate) fn rub(minor: i64) -> Money<'static, rusty_money::iso::Currency> {
    Money::from_minor(minor, RUB)
}
