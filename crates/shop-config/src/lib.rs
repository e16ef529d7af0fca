//! shop-config
//!
//! Persisted shop preferences: locale, currency, invoice numbering policy and
//! the business profile printed on receipts, plus disk persistence helpers.

pub mod error;
pub mod manager;
pub mod model;

pub use error::ConfigError;
pub use manager::ConfigManager;
pub use model::{BusinessProfile, Config, DATA_ROOT_ENV};
