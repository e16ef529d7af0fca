//! Invoices issued from completed sales, with numbering, totals and print state.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

pub const DEFAULT_INVOICE_PREFIX: &str = "FAC";
pub const DEFAULT_SEQUENCE_WIDTH: usize = 5;

/// Year-scoped sequential identifier rendered as `<prefix>-<year>-<sequence>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InvoiceNumber {
    prefix: String,
    year: i32,
    sequence: u32,
    width: usize,
}

impl InvoiceNumber {
    pub fn new(prefix: impl Into<String>, year: i32, sequence: u32) -> Self {
        Self {
            prefix: prefix.into(),
            year,
            sequence,
            width: DEFAULT_SEQUENCE_WIDTH,
        }
    }

    /// Sets the zero-padding width of the sequence. Wider sequences are never truncated.
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width.max(1);
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Returns true when the number belongs to the `prefix`/`year` series.
    pub fn in_series(&self, prefix: &str, year: i32) -> bool {
        self.year == year && self.prefix == prefix
    }

    pub fn parse(raw: &str) -> Result<Self, InvoiceNumberError> {
        let trimmed = raw.trim();
        let mut parts = trimmed.rsplitn(3, '-');
        let sequence_part = parts.next().unwrap_or_default();
        let year_part = parts.next().ok_or(InvoiceNumberError::Malformed)?;
        let prefix = parts.next().ok_or(InvoiceNumberError::Malformed)?;

        if prefix.is_empty() {
            return Err(InvoiceNumberError::Malformed);
        }
        if year_part.len() != 4 || !year_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvoiceNumberError::InvalidYear);
        }
        if sequence_part.is_empty() || !sequence_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(InvoiceNumberError::InvalidSequence);
        }
        let year = year_part
            .parse::<i32>()
            .map_err(|_| InvoiceNumberError::InvalidYear)?;
        let sequence = sequence_part
            .parse::<u32>()
            .map_err(|_| InvoiceNumberError::InvalidSequence)?;
        if sequence == 0 {
            return Err(InvoiceNumberError::InvalidSequence);
        }
        Ok(Self {
            prefix: prefix.to_string(),
            year,
            sequence,
            width: sequence_part.len(),
        })
    }
}

impl fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{:0>width$}",
            self.prefix,
            self.year,
            self.sequence,
            width = self.width
        )
    }
}

impl FromStr for InvoiceNumber {
    type Err = InvoiceNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for InvoiceNumber {
    type Error = InvoiceNumberError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<InvoiceNumber> for String {
    fn from(value: InvoiceNumber) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors raised when parsing an [`InvoiceNumber`].
pub enum InvoiceNumberError {
    Malformed,
    InvalidYear,
    InvalidSequence,
}

impl fmt::Display for InvoiceNumberError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceNumberError::Malformed => {
                f.write_str("invoice number must look like PREFIX-YYYY-NNNNN")
            }
            InvoiceNumberError::InvalidYear => f.write_str("invoice number has an invalid year"),
            InvoiceNumberError::InvalidSequence => {
                f.write_str("invoice number has an invalid sequence")
            }
        }
    }
}

impl std::error::Error for InvoiceNumberError {}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
/// A single billed line.
pub struct InvoiceItem {
    pub description: String,
    pub quantity: u32,
    pub unit_price: f64,
    #[serde(default)]
    pub subtotal: f64,
}

impl InvoiceItem {
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: f64) -> Self {
        let mut item = Self {
            description: description.into(),
            quantity,
            unit_price,
            subtotal: 0.0,
        };
        item.recompute();
        item
    }

    pub fn recompute(&mut self) {
        self.subtotal = self.quantity as f64 * self.unit_price;
    }
}

impl Amounted for InvoiceItem {
    fn amount(&self) -> f64 {
        self.subtotal
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Lifecycle state of an invoice. Transitions only move forward.
pub enum InvoiceStatus {
    #[default]
    Pending,
    Printed,
    Cancelled,
    Refunded,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InvoiceStatus::Pending => "Pending",
            InvoiceStatus::Printed => "Printed",
            InvoiceStatus::Cancelled => "Cancelled",
            InvoiceStatus::Refunded => "Refunded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    Cash,
    Card,
    Transfer,
    Other(String),
}

impl PaymentMethod {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cash" | "efectivo" => PaymentMethod::Cash,
            "card" | "tarjeta" => PaymentMethod::Card,
            "transfer" | "transferencia" => PaymentMethod::Transfer,
            _ => PaymentMethod::Other(raw.trim().to_string()),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Cash => f.write_str("Cash"),
            PaymentMethod::Card => f.write_str("Card"),
            PaymentMethod::Transfer => f.write_str("Transfer"),
            PaymentMethod::Other(label) => f.write_str(label),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
/// Cumulative print tracking. Counters only grow.
pub struct PrintInfo {
    #[serde(default)]
    pub first_printed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_printed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub print_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_printed_by: Option<String>,
}

impl PrintInfo {
    fn record(&mut self, user: &str, at: DateTime<Utc>) {
        if self.first_printed_at.is_none() {
            self.first_printed_at = Some(at);
        }
        self.last_printed_at = Some(at);
        self.print_count = self.print_count.saturating_add(1);
        self.last_printed_by = Some(user.to_string());
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoteKind {
    Cancellation,
    Refund,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InvoiceNote {
    pub kind: NoteKind,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

impl fmt::Display for InvoiceNote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            NoteKind::Cancellation => "Cancelled",
            NoteKind::Refund => "Refunded",
        };
        write!(f, "{label}: {}", self.reason)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: InvoiceNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<Uuid>,
    pub barber: PartyRef,
    pub client: PartyRef,
    pub items: Vec<InvoiceItem>,
    pub subtotal: f64,
    #[serde(default)]
    pub tax: f64,
    #[serde(default)]
    pub discount: f64,
    pub total: f64,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub print_info: PrintInfo,
    #[serde(default)]
    pub notes: Vec<InvoiceNote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Invoice {
    pub fn new(
        invoice_number: InvoiceNumber,
        barber: PartyRef,
        client: PartyRef,
        items: Vec<InvoiceItem>,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let mut invoice = Self {
            id: Uuid::new_v4(),
            invoice_number,
            sale_id: None,
            barber,
            client,
            items,
            subtotal: 0.0,
            tax: 0.0,
            discount: 0.0,
            total: 0.0,
            payment_method: PaymentMethod::default(),
            status: InvoiceStatus::Pending,
            print_info: PrintInfo::default(),
            notes: Vec::new(),
            created_by: None,
            issued_at,
            created_at: issued_at,
            updated_at: issued_at,
        };
        invoice.recompute_totals();
        invoice
    }

    pub fn with_adjustments(mut self, tax: f64, discount: f64) -> Self {
        self.tax = tax;
        self.discount = discount;
        self.recompute_totals();
        self
    }

    /// Recalculates every line subtotal, the invoice subtotal and the total.
    /// Tax and discount are taken as given.
    pub fn recompute_totals(&mut self) {
        for item in &mut self.items {
            item.recompute();
        }
        self.subtotal = self.items.iter().map(Amounted::amount).sum();
        self.total = self.subtotal + self.tax - self.discount;
    }

    pub fn set_items(&mut self, items: Vec<InvoiceItem>) {
        self.items = items;
        self.recompute_totals();
    }

    pub fn add_item(&mut self, item: InvoiceItem) {
        self.items.push(item);
        self.recompute_totals();
    }

    pub fn validate(&self) -> Result<(), InvoiceValidationError> {
        if self.items.is_empty() {
            return Err(InvoiceValidationError::NoItems);
        }
        for (index, item) in self.items.iter().enumerate() {
            if item.description.trim().is_empty() {
                return Err(InvoiceValidationError::EmptyDescription { line: index + 1 });
            }
            if item.quantity < 1 {
                return Err(InvoiceValidationError::InvalidQuantity { line: index + 1 });
            }
            if !item.unit_price.is_finite() || item.unit_price < 0.0 {
                return Err(InvoiceValidationError::InvalidUnitPrice { line: index + 1 });
            }
            if !(f64::from(item.quantity) * item.unit_price).is_finite() {
                return Err(InvoiceValidationError::AmountOverflow { line: Some(index + 1) });
            }
        }
        if !self.tax.is_finite() || self.tax < 0.0 {
            return Err(InvoiceValidationError::InvalidTax);
        }
        if !self.discount.is_finite() || self.discount < 0.0 {
            return Err(InvoiceValidationError::InvalidDiscount);
        }
        // Non-finite amounts serialize as JSON null and could not be read back.
        if !self.subtotal.is_finite() || !self.total.is_finite() {
            return Err(InvoiceValidationError::AmountOverflow { line: None });
        }
        Ok(())
    }

    pub fn is_printed(&self) -> bool {
        self.print_info.print_count > 0
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == InvoiceStatus::Cancelled
    }

    /// Records a print. The first print moves a pending invoice to `Printed`;
    /// cancelled and refunded invoices keep their status. Returns the new count.
    pub fn mark_as_printed(&mut self, user: &str, at: DateTime<Utc>) -> u32 {
        self.print_info.record(user, at);
        if self.status == InvoiceStatus::Pending {
            self.status = InvoiceStatus::Printed;
        }
        self.touch(at);
        self.print_info.print_count
    }

    /// Moves the invoice to `Cancelled` and appends the reason. Prints are kept.
    pub fn cancel(&mut self, reason: impl Into<String>, at: DateTime<Utc>) {
        self.status = InvoiceStatus::Cancelled;
        self.notes.push(InvoiceNote {
            kind: NoteKind::Cancellation,
            reason: reason.into(),
            recorded_at: at,
        });
        self.touch(at);
    }

    pub fn refund(
        &mut self,
        reason: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Result<(), InvoiceStateError> {
        match self.status {
            InvoiceStatus::Cancelled => return Err(InvoiceStateError::Cancelled),
            InvoiceStatus::Refunded => return Ok(()),
            InvoiceStatus::Pending | InvoiceStatus::Printed => {}
        }
        self.status = InvoiceStatus::Refunded;
        self.notes.push(InvoiceNote {
            kind: NoteKind::Refund,
            reason: reason.into(),
            recorded_at: at,
        });
        self.touch(at);
        Ok(())
    }

    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

impl Identifiable for Invoice {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl Amounted for Invoice {
    fn amount(&self) -> f64 {
        self.total
    }
}

impl Displayable for Invoice {
    fn display_label(&self) -> String {
        format!("{} [{}]", self.invoice_number, self.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Reasons an invoice cannot be persisted.
pub enum InvoiceValidationError {
    NoItems,
    EmptyDescription { line: usize },
    InvalidQuantity { line: usize },
    InvalidUnitPrice { line: usize },
    InvalidTax,
    InvalidDiscount,
    /// A line subtotal (`line`) or the invoice totals (`None`) are not finite.
    AmountOverflow { line: Option<usize> },
}

impl fmt::Display for InvoiceValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceValidationError::NoItems => f.write_str("invoice needs at least one item"),
            InvoiceValidationError::EmptyDescription { line } => {
                write!(f, "item {line} has no description")
            }
            InvoiceValidationError::InvalidQuantity { line } => {
                write!(f, "item {line} quantity must be at least 1")
            }
            InvoiceValidationError::InvalidUnitPrice { line } => {
                write!(f, "item {line} unit price must be zero or positive")
            }
            InvoiceValidationError::InvalidTax => f.write_str("tax must be zero or positive"),
            InvoiceValidationError::InvalidDiscount => {
                f.write_str("discount must be zero or positive")
            }
            InvoiceValidationError::AmountOverflow { line: Some(line) } => {
                write!(f, "item {line} amount is too large")
            }
            InvoiceValidationError::AmountOverflow { line: None } => {
                f.write_str("invoice total is too large")
            }
        }
    }
}

impl std::error::Error for InvoiceValidationError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceStateError {
    Cancelled,
}

impl fmt::Display for InvoiceStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStateError::Cancelled => f.write_str("invoice is cancelled"),
        }
    }
}

impl std::error::Error for InvoiceStateError {}
