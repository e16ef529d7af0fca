use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

use uuid::Uuid;

use shop_domain::{Invoice, InvoiceNumber};

use crate::CoreError;

/// Persistence contract for invoices.
///
/// Invoices are never deleted; there is intentionally no removal operation.
/// Implementations must enforce invoice-number uniqueness on [`insert`] and
/// make [`next_sequence`] atomic with respect to other callers of the same store.
///
/// [`insert`]: InvoiceStore::insert
/// [`next_sequence`]: InvoiceStore::next_sequence
pub trait InvoiceStore: Send + Sync {
    /// Reserves and returns the next sequence for the `prefix`/`year` series.
    /// The counter is seeded from [`InvoiceStore::highest_sequence`] on first use.
    fn next_sequence(&self, prefix: &str, year: i32) -> Result<u32, CoreError>;
    /// Highest sequence already present among stored invoices of the series.
    fn highest_sequence(&self, prefix: &str, year: i32) -> Result<Option<u32>, CoreError>;
    fn insert(&self, invoice: &Invoice) -> Result<(), CoreError>;
    fn update(&self, invoice: &Invoice) -> Result<(), CoreError>;
    fn get(&self, id: Uuid) -> Result<Option<Invoice>, CoreError>;
    fn find_by_number(&self, number: &InvoiceNumber) -> Result<Option<Invoice>, CoreError>;
    fn list(&self) -> Result<Vec<Invoice>, CoreError>;
}

/// Highest sequence of the `prefix`/`year` series within `invoices`.
pub fn highest_in<'a>(
    invoices: impl IntoIterator<Item = &'a Invoice>,
    prefix: &str,
    year: i32,
) -> Option<u32> {
    invoices
        .into_iter()
        .filter(|invoice| invoice.invoice_number.in_series(prefix, year))
        .map(|invoice| invoice.invoice_number.sequence())
        .max()
}

/// Rejects `candidate` when its id or number is already taken in `invoices`.
pub fn ensure_unique<'a>(
    invoices: impl IntoIterator<Item = &'a Invoice>,
    candidate: &Invoice,
) -> Result<(), CoreError> {
    for existing in invoices {
        if existing.id == candidate.id {
            return Err(CoreError::DuplicateInvoiceId(candidate.id));
        }
        if same_number(&existing.invoice_number, &candidate.invoice_number) {
            return Err(CoreError::DuplicateInvoiceNumber(
                candidate.invoice_number.to_string(),
            ));
        }
    }
    Ok(())
}

/// Numbers are unique by series and sequence; padding width does not matter.
pub fn same_number(a: &InvoiceNumber, b: &InvoiceNumber) -> bool {
    a.in_series(b.prefix(), b.year()) && a.sequence() == b.sequence()
}

pub fn counter_key(prefix: &str, year: i32) -> String {
    format!("{prefix}-{year}")
}

#[derive(Default)]
struct MemoryState {
    invoices: Vec<Invoice>,
    counters: HashMap<String, u32>,
}

/// Process-local store guarded by a single mutex.
#[derive(Default)]
pub struct InMemoryInvoiceStore {
    state: Mutex<MemoryState>,
}

impl InMemoryInvoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with existing invoices, e.g. imported history.
    pub fn with_invoices(invoices: Vec<Invoice>) -> Self {
        Self {
            state: Mutex::new(MemoryState {
                invoices,
                counters: HashMap::new(),
            }),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, CoreError> {
        self.state
            .lock()
            .map_err(|_| CoreError::Storage("invoice store lock poisoned".into()))
    }
}

impl InvoiceStore for InMemoryInvoiceStore {
    fn next_sequence(&self, prefix: &str, year: i32) -> Result<u32, CoreError> {
        let mut state = self.lock()?;
        let key = counter_key(prefix, year);
        let current = match state.counters.get(&key) {
            Some(value) => *value,
            None => highest_in(&state.invoices, prefix, year).unwrap_or(0),
        };
        let next = current
            .checked_add(1)
            .ok_or_else(|| CoreError::Storage(format!("sequence exhausted for {key}")))?;
        state.counters.insert(key, next);
        Ok(next)
    }

    fn highest_sequence(&self, prefix: &str, year: i32) -> Result<Option<u32>, CoreError> {
        let state = self.lock()?;
        Ok(highest_in(&state.invoices, prefix, year))
    }

    fn insert(&self, invoice: &Invoice) -> Result<(), CoreError> {
        let mut state = self.lock()?;
        ensure_unique(&state.invoices, invoice)?;
        state.invoices.push(invoice.clone());
        Ok(())
    }

    fn update(&self, invoice: &Invoice) -> Result<(), CoreError> {
        let mut state = self.lock()?;
        let slot = state
            .invoices
            .iter_mut()
            .find(|existing| existing.id == invoice.id)
            .ok_or_else(|| CoreError::InvoiceNotFound(invoice.id.to_string()))?;
        *slot = invoice.clone();
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<Option<Invoice>, CoreError> {
        let state = self.lock()?;
        Ok(state.invoices.iter().find(|invoice| invoice.id == id).cloned())
    }

    fn find_by_number(&self, number: &InvoiceNumber) -> Result<Option<Invoice>, CoreError> {
        let state = self.lock()?;
        Ok(state
            .invoices
            .iter()
            .find(|invoice| same_number(&invoice.invoice_number, number))
            .cloned())
    }

    fn list(&self) -> Result<Vec<Invoice>, CoreError> {
        let state = self.lock()?;
        Ok(state.invoices.clone())
    }
}
