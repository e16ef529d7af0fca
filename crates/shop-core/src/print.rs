//! Print-ready view of an invoice for receipt printers.

use serde::Serialize;

use shop_domain::{Invoice, InvoiceStatus};

use crate::format::{CurrencyFormatter, DateFormatter};

/// Business details printed at the top of every receipt.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BusinessHeader {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

/// Formatting collaborators needed to render money and dates.
pub struct PrintContext<'a> {
    pub header: BusinessHeader,
    pub currency_code: String,
    pub currency: &'a dyn CurrencyFormatter,
    pub dates: &'a dyn DateFormatter,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintableLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: String,
    pub subtotal: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrintableInvoice {
    pub header: BusinessHeader,
    pub invoice_number: String,
    pub issued_on: String,
    pub barber: String,
    pub client: String,
    pub lines: Vec<PrintableLine>,
    pub subtotal: String,
    pub tax: String,
    /// Omitted when no discount applies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<String>,
    pub total: String,
    pub payment_method: String,
    pub status: String,
    /// True when the invoice was printed before; receipts carry a copy mark.
    pub is_copy: bool,
    pub print_count: u32,
    pub notes: Vec<String>,
}

/// Adds the print view to [`Invoice`].
pub trait PrintableInvoiceExt {
    fn format_for_print(&self, ctx: &PrintContext<'_>) -> PrintableInvoice;
}

impl PrintableInvoiceExt for Invoice {
    fn format_for_print(&self, ctx: &PrintContext<'_>) -> PrintableInvoice {
        let money = |amount: f64| ctx.currency.format_amount(amount, &ctx.currency_code);
        let lines = self
            .items
            .iter()
            .map(|item| PrintableLine {
                description: item.description.clone(),
                quantity: item.quantity,
                unit_price: money(item.unit_price),
                subtotal: money(item.subtotal),
            })
            .collect();
        let status = match self.status {
            InvoiceStatus::Cancelled | InvoiceStatus::Refunded => self.status.to_string().to_uppercase(),
            InvoiceStatus::Pending | InvoiceStatus::Printed => self.status.to_string(),
        };

        PrintableInvoice {
            header: ctx.header.clone(),
            invoice_number: self.invoice_number.to_string(),
            issued_on: ctx.dates.format_date(self.issued_at.date_naive()),
            barber: self.barber.name.clone(),
            client: self.client.name.clone(),
            lines,
            subtotal: money(self.subtotal),
            tax: money(self.tax),
            discount: (self.discount > 0.0).then(|| money(self.discount)),
            total: money(self.total),
            payment_method: self.payment_method.to_string(),
            status,
            is_copy: self.is_printed(),
            print_count: self.print_info.print_count,
            notes: self.notes.iter().map(ToString::to_string).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use shop_domain::{InvoiceItem, InvoiceNumber, PartyRef, PaymentMethod};

    use super::*;
    use crate::format::PlainFormatters;

    fn sample() -> Invoice {
        let mut invoice = Invoice::new(
            InvoiceNumber::new("FAC", 2026, 12),
            PartyRef::named("Marco"),
            PartyRef::named("Lucia"),
            vec![
                InvoiceItem::new("Haircut", 1, 18.0),
                InvoiceItem::new("Wax", 2, 4.25),
            ],
            Utc.with_ymd_and_hms(2026, 4, 2, 17, 30, 0).unwrap(),
        )
        .with_adjustments(2.0, 0.0);
        invoice.payment_method = PaymentMethod::Card;
        invoice
    }

    fn context(fmt: &PlainFormatters) -> PrintContext<'_> {
        PrintContext {
            header: BusinessHeader {
                name: "Barbería Central".into(),
                tax_id: Some("B-12345678".into()),
                ..BusinessHeader::default()
            },
            currency_code: "EUR".into(),
            currency: fmt,
            dates: fmt,
        }
    }

    #[test]
    fn view_model_formats_money_and_lines() {
        let fmt = PlainFormatters::default();
        let view = sample().format_for_print(&context(&fmt));
        assert_eq!(view.invoice_number, "FAC-2026-00012");
        assert_eq!(view.issued_on, "2026-04-02");
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.lines[1].unit_price, "4.25 EUR");
        assert_eq!(view.lines[1].subtotal, "8.50 EUR");
        assert_eq!(view.subtotal, "26.50 EUR");
        assert_eq!(view.total, "28.50 EUR");
        assert_eq!(view.discount, None);
        assert_eq!(view.payment_method, "Card");
        assert!(!view.is_copy);
    }

    #[test]
    fn reprints_are_marked_as_copies() {
        let fmt = PlainFormatters::default();
        let mut invoice = sample();
        invoice.mark_as_printed("ana", Utc.with_ymd_and_hms(2026, 4, 2, 17, 31, 0).unwrap());
        let view = invoice.format_for_print(&context(&fmt));
        assert!(view.is_copy);
        assert_eq!(view.print_count, 1);
        assert_eq!(view.status, "Printed");
    }

    #[test]
    fn cancelled_invoices_show_reason() {
        let fmt = PlainFormatters::default();
        let mut invoice = sample();
        invoice.cancel("wrong client", Utc.with_ymd_and_hms(2026, 4, 3, 9, 0, 0).unwrap());
        let view = invoice.format_for_print(&context(&fmt));
        assert_eq!(view.status, "CANCELLED");
        assert_eq!(view.notes, vec!["Cancelled: wrong client".to_string()]);
    }
}
