//! shop-domain
//!
//! Pure domain models for the barbershop back office (invoices, expenses,
//! recurrence schedules). No I/O, no CLI, no storage. Only data types and
//! the calendar arithmetic they need.

pub mod calendar;
pub mod common;
pub mod expense;
pub mod invoice;

pub use common::*;
pub use expense::*;
pub use invoice::*;
