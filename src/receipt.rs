//! Receipt

use std::io;

use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{cart::Cart, items::LineItem, pricing::PriceBreakdown, promotions::PromotionCode};

/// Errors that can occur when rendering a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Writing to the output failed.
    #[error("failed to write receipt: {0}")]
    Io(#[from] io::Error),
}

/// Terminal rendering of a priced cart.
#[derive(Debug, Clone, Copy)]
pub struct BreakdownReceipt<'r, 'a> {
    cart: &'r Cart<'a>,
    breakdown: &'r PriceBreakdown<'a>,
    promotion: Option<&'r PromotionCode>,
}

impl<'r, 'a> BreakdownReceipt<'r, 'a> {
    /// Pairs a cart with its breakdown.
    #[must_use]
    pub fn new(
        cart: &'r Cart<'a>,
        breakdown: &'r PriceBreakdown<'a>,
        promotion: Option<&'r PromotionCode>,
    ) -> Self {
        Self {
            cart,
            breakdown,
            promotion,
        }
    }

    /// Writes the line table followed by the summary rows.
    ///
    /// # Errors
    ///
    /// Returns [`ReceiptError::Io`] if the output cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if self.cart.is_empty() {
            writeln!(out, "\nCart is empty.\n")?;

            return Ok(());
        }

        let mut builder = Builder::default();

        builder.push_record(["", "Product", "List Price", "Price", "Qty", "Line Total"]);

        for (idx, item) in self.cart.items().iter().enumerate() {
            builder.push_record(item_row(idx, item));
        }

        write_table(&mut out, builder, self.cart.items())?;
        write_summary(&mut out, self.breakdown, self.promotion)?;

        Ok(())
    }
}

fn item_row(idx: usize, item: &LineItem<'_>) -> [String; 6] {
    let list_price = if item.current_price().is_some_and(|price| price != item.unit_price()) {
        item.unit_price().to_string()
    } else {
        String::new()
    };

    [
        format!("#{:<3}", idx + 1),
        item.product_id().to_string(),
        list_price,
        item.effective_unit_price().to_string(),
        item.quantity().to_string(),
        item.line_total().to_string(),
    ]
}

fn write_table(
    out: &mut impl io::Write,
    builder: Builder,
    items: &[LineItem<'_>],
) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(
        1,
        HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤')),
    );

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..6), Alignment::right());

    // Header is row 0.
    for (idx, item) in items.iter().enumerate() {
        if item.current_price().is_some_and(|price| price != item.unit_price()) {
            table.modify((idx + 1, 2), Color::new("\x1b[90m", "\x1b[0m"));
            table.modify((idx + 1, 3), Color::FG_GREEN);
        }
    }

    writeln!(out, "\n{table}")?;

    Ok(())
}

/// One right-aligned line under the table, e.g. ` Discount (TEN):  -180.00 ₽`.
#[derive(Debug)]
struct SummaryRow {
    label: String,
    amount: String,
    bold: bool,
}

impl SummaryRow {
    fn new(label: impl Into<String>, money: &Money<'_, Currency>) -> Self {
        Self {
            label: label.into(),
            amount: money.to_string(),
            bold: false,
        }
    }

    /// A reduction, shown with a leading minus.
    fn deduction(label: impl Into<String>, money: &Money<'_, Currency>) -> Self {
        Self {
            amount: format!("-{money}"),
            ..Self::new(label, money)
        }
    }

    fn bold(self) -> Self {
        Self { bold: true, ..self }
    }
}

fn write_summary(
    out: &mut impl io::Write,
    breakdown: &PriceBreakdown<'_>,
    promotion: Option<&PromotionCode>,
) -> Result<(), ReceiptError> {
    let mut rows = vec![SummaryRow::new("Subtotal:", &breakdown.subtotal())];

    if breakdown.discount().to_minor_units() != 0 {
        let label = promotion.map_or_else(
            || "Discount:".to_string(),
            |promotion| format!("Discount ({}):", promotion.code()),
        );

        rows.push(SummaryRow::deduction(label, &breakdown.discount()));
    }

    if breakdown.bonuses_used().to_minor_units() != 0 {
        rows.push(SummaryRow::deduction("Bonuses:", &breakdown.bonuses_used()));
    }

    rows.push(SummaryRow::new("Total:", &breakdown.total()).bold());

    // Widths are measured before any styling is applied.
    let label_width = rows.iter().map(|row| row.label.chars().count()).max().unwrap_or_default();
    let amount_width = rows.iter().map(|row| row.amount.chars().count()).max().unwrap_or_default();

    for row in &rows {
        let line = format!(
            " {label:>label_width$}  {amount:>amount_width$}  ",
            label = row.label,
            amount = row.amount,
        );

        if row.bold {
            writeln!(out, "\x1b[1m{line}\x1b[0m")?;
        } else {
            writeln!(out, "{line}")?;
        }
    }

    writeln!(out)?;

    Ok(())
}
