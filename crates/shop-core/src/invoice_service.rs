//! Invoice lifecycle: creation from a completed sale, saving, printing and cancellation.

use std::sync::Arc;

use chrono::Datelike;
use tracing::{info, warn};
use uuid::Uuid;

use shop_domain::{
    Invoice, InvoiceItem, InvoiceNumber, InvoiceStatus, PartyRef, PaymentMethod,
};

use crate::{numbering::InvoiceNumbering, storage::InvoiceStore, time::Clock, CoreError};

/// A billed line as reported by the sale workflow.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl SaleLine {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
        }
    }
}

/// Everything the sale workflow hands over once a sale is completed.
#[derive(Debug, Clone)]
pub struct CompletedSale {
    pub sale_id: Option<Uuid>,
    pub barber: PartyRef,
    pub client: PartyRef,
    pub lines: Vec<SaleLine>,
    pub tax: f64,
    pub discount: f64,
    pub payment_method: PaymentMethod,
    pub completed_by: Option<String>,
}

impl CompletedSale {
    pub fn new(barber: PartyRef, client: PartyRef, lines: Vec<SaleLine>) -> Self {
        Self {
            sale_id: None,
            barber,
            client,
            lines,
            tax: 0.0,
            discount: 0.0,
            payment_method: PaymentMethod::default(),
            completed_by: None,
        }
    }
}

/// Invoice operations over an explicitly supplied store and clock.
#[derive(Clone)]
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
    clock: Arc<dyn Clock>,
    numbering: InvoiceNumbering,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn InvoiceStore>, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            numbering: InvoiceNumbering::default(),
        }
    }

    pub fn with_numbering(mut self, numbering: InvoiceNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn store(&self) -> &dyn InvoiceStore {
        self.store.as_ref()
    }

    pub fn numbering(&self) -> &InvoiceNumbering {
        &self.numbering
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Reserves the next invoice number for the current year.
    pub fn generate_invoice_number(&self) -> Result<InvoiceNumber, CoreError> {
        let year = self.clock.now().year();
        self.numbering.allocate(self.store.as_ref(), year)
    }

    /// Builds, numbers and persists the invoice for a completed sale.
    ///
    /// The sale is validated before a number is reserved, so rejected sales do
    /// not consume sequence values. A number collision in the store surfaces as
    /// [`CoreError::DuplicateInvoiceNumber`]; no retry is attempted here.
    pub fn create_from_sale(&self, sale: CompletedSale) -> Result<Invoice, CoreError> {
        let now = self.clock.now();
        let items: Vec<InvoiceItem> = sale
            .lines
            .into_iter()
            .map(|line| InvoiceItem::new(line.description, line.quantity, line.unit_price))
            .collect();

        let mut invoice = Invoice::new(
            self.numbering.format(now.year(), 1),
            sale.barber,
            sale.client,
            items,
            now,
        )
        .with_adjustments(sale.tax, sale.discount);
        invoice.sale_id = sale.sale_id;
        invoice.payment_method = sale.payment_method;
        invoice.created_by = sale.completed_by;
        invoice.validate()?;

        invoice.invoice_number = self.generate_invoice_number()?;
        invoice.recompute_totals();
        if let Err(err) = self.store.insert(&invoice) {
            if let CoreError::DuplicateInvoiceNumber(number) = &err {
                warn!(%number, "invoice number collision");
            }
            return Err(err);
        }
        info!(
            number = %invoice.invoice_number,
            total = invoice.total,
            "invoice created"
        );
        Ok(invoice)
    }

    /// Recomputes totals, validates and persists an existing invoice.
    pub fn save(&self, invoice: &mut Invoice) -> Result<(), CoreError> {
        invoice.recompute_totals();
        invoice.validate()?;
        invoice.touch(self.clock.now());
        self.store.update(invoice)
    }

    /// Replaces the item list of a pending invoice and saves it.
    pub fn replace_items(&self, id: Uuid, items: Vec<InvoiceItem>) -> Result<Invoice, CoreError> {
        let mut invoice = self.get(id)?;
        if invoice.status != InvoiceStatus::Pending {
            return Err(CoreError::InvalidOperation(format!(
                "invoice {} is {} and can no longer be edited",
                invoice.invoice_number, invoice.status
            )));
        }
        invoice.set_items(items);
        self.save(&mut invoice)?;
        Ok(invoice)
    }

    pub fn mark_as_printed(&self, id: Uuid, user: &str) -> Result<Invoice, CoreError> {
        let mut invoice = self.get(id)?;
        let count = invoice.mark_as_printed(user, self.clock.now());
        self.store.update(&invoice)?;
        info!(number = %invoice.invoice_number, count, user, "invoice printed");
        Ok(invoice)
    }

    pub fn cancel(&self, id: Uuid, reason: &str) -> Result<Invoice, CoreError> {
        let reason = required_reason(reason)?;
        let mut invoice = self.get(id)?;
        invoice.cancel(reason, self.clock.now());
        self.store.update(&invoice)?;
        info!(number = %invoice.invoice_number, reason, "invoice cancelled");
        Ok(invoice)
    }

    pub fn refund(&self, id: Uuid, reason: &str) -> Result<Invoice, CoreError> {
        let reason = required_reason(reason)?;
        let mut invoice = self.get(id)?;
        invoice.refund(reason, self.clock.now())?;
        self.store.update(&invoice)?;
        info!(number = %invoice.invoice_number, reason, "invoice refunded");
        Ok(invoice)
    }

    pub fn get(&self, id: Uuid) -> Result<Invoice, CoreError> {
        self.store
            .get(id)?
            .ok_or_else(|| CoreError::InvoiceNotFound(id.to_string()))
    }

    pub fn find_by_number(&self, raw: &str) -> Result<Invoice, CoreError> {
        let number = InvoiceNumber::parse(raw)?;
        self.store
            .find_by_number(&number)?
            .ok_or_else(|| CoreError::InvoiceNotFound(number.to_string()))
    }

    /// Invoices issued in `year` across every numbering series, ordered by
    /// prefix then sequence. Series from earlier prefixes stay listed after
    /// the configured prefix changes.
    pub fn list_for_year(&self, year: i32) -> Result<Vec<Invoice>, CoreError> {
        let mut invoices: Vec<Invoice> = self
            .store
            .list()?
            .into_iter()
            .filter(|invoice| invoice.invoice_number.year() == year)
            .collect();
        invoices.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
        Ok(invoices)
    }

    /// Invoices of the `prefix`/`year` series, in sequence order.
    pub fn list_series(&self, prefix: &str, year: i32) -> Result<Vec<Invoice>, CoreError> {
        let mut invoices: Vec<Invoice> = self
            .list_for_year(year)?
            .into_iter()
            .filter(|invoice| invoice.invoice_number.in_series(prefix, year))
            .collect();
        invoices.sort_by_key(|invoice| invoice.invoice_number.sequence());
        Ok(invoices)
    }

    pub fn list_by_status(&self, status: InvoiceStatus) -> Result<Vec<Invoice>, CoreError> {
        let mut invoices: Vec<Invoice> = self
            .store
            .list()?
            .into_iter()
            .filter(|invoice| invoice.status == status)
            .collect();
        invoices.sort_by(|a, b| a.invoice_number.cmp(&b.invoice_number));
        Ok(invoices)
    }
}

fn required_reason(reason: &str) -> Result<&str, CoreError> {
    let trimmed = reason.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation("a reason is required".into()));
    }
    Ok(trimmed)
}
