//! shop-core
//!
//! Business logic and services for the barbershop back office.
//! Depends on shop-domain. No CLI, no terminal I/O; persistence goes through
//! the [`storage::InvoiceStore`] trait handed to each service.

pub mod error;
pub mod format;
pub mod frequency;
pub mod invoice_service;
pub mod numbering;
pub mod print;
pub mod recurring_expense_service;
pub mod reminder;
pub mod storage;
pub mod time;

pub use error::CoreError;
pub use format::{CurrencyFormatter, DateFormatter, PlainFormatters};
pub use frequency::{format_frequency, join_list, FrequencyFormatter, Language};
pub use invoice_service::{CompletedSale, InvoiceService, SaleLine};
pub use numbering::InvoiceNumbering;
pub use print::{BusinessHeader, PrintContext, PrintableInvoice, PrintableInvoiceExt, PrintableLine};
pub use recurring_expense_service::{DueExpense, RecurringExpenseService};
pub use reminder::{ExpenseReminder, ReminderComposer};
pub use storage::{InMemoryInvoiceStore, InvoiceStore};
pub use time::{Clock, FixedClock};

#[cfg(test)]
mod tests;
