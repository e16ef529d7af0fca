#![doc(test(attr(deny(warnings))))]

//! Barbershop Core wires invoicing and recurring-expense services to JSON
//! storage, persisted configuration and a command shell.

pub mod app;
pub mod cli;
pub mod clock;
pub mod errors;
pub mod formatters;
pub mod utils;

pub use app::ShopApp;
pub use clock::SystemClock;
pub use errors::ShopError;
pub use formatters::ConfigFormatters;

pub use shop_config as config;
pub use shop_core as services;
pub use shop_domain as domain;
pub use shop_storage_json as storage;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Barbershop Core tracing initialized.");
    });
}
