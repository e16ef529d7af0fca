//! Year-scoped invoice numbering on top of an [`InvoiceStore`] counter.

use tracing::debug;

use shop_domain::{InvoiceNumber, DEFAULT_INVOICE_PREFIX, DEFAULT_SEQUENCE_WIDTH};

use crate::{storage::InvoiceStore, CoreError};

/// Numbering policy: `<prefix>-<year>-<sequence padded to width>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceNumbering {
    prefix: String,
    width: usize,
}

impl Default for InvoiceNumbering {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_INVOICE_PREFIX.into(),
            width: DEFAULT_SEQUENCE_WIDTH,
        }
    }
}

impl InvoiceNumbering {
    pub fn new(prefix: impl Into<String>, width: usize) -> Result<Self, CoreError> {
        let prefix = prefix.into();
        let prefix = prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CoreError::Validation(format!(
                "invoice prefix `{prefix}` must be non-empty and alphanumeric"
            )));
        }
        if !(1..=9).contains(&width) {
            return Err(CoreError::Validation(format!(
                "invoice sequence width {width} must be between 1 and 9"
            )));
        }
        Ok(Self {
            prefix: prefix.to_string(),
            width,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn format(&self, year: i32, sequence: u32) -> InvoiceNumber {
        InvoiceNumber::new(self.prefix.clone(), year, sequence).with_width(self.width)
    }

    /// Reserves the next number of `year` through the store's atomic counter.
    pub fn allocate(&self, store: &dyn InvoiceStore, year: i32) -> Result<InvoiceNumber, CoreError> {
        let sequence = store.next_sequence(&self.prefix, year)?;
        let number = self.format(year, sequence);
        debug!(%number, "allocated invoice number");
        Ok(number)
    }

    /// Number the next invoice of `year` would get by scanning existing ones.
    /// Does not reserve anything.
    pub fn peek(&self, store: &dyn InvoiceStore, year: i32) -> Result<InvoiceNumber, CoreError> {
        let highest = store.highest_sequence(&self.prefix, year)?.unwrap_or(0);
        Ok(self.format(year, highest.saturating_add(1)))
    }
}
