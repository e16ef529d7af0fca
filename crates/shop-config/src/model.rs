use std::{fmt::Write, path::PathBuf};

use chrono::{
    format::{Item, StrftimeItems},
    NaiveDate,
};
use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Environment variable overriding the data directory.
pub const DATA_ROOT_ENV: &str = "BARBERSHOP_HOME";

/// Stores shop-wide preferences and the receipt header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default = "Config::default_currency_precision")]
    pub currency_precision: u8,
    #[serde(default = "Config::default_date_format")]
    pub date_format: String,
    #[serde(default = "Config::default_invoice_prefix")]
    pub invoice_prefix: String,
    #[serde(default = "Config::default_invoice_sequence_width")]
    pub invoice_sequence_width: usize,
    #[serde(default)]
    pub business: BusinessProfile,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom root directory for invoices and backups. Defaults to `~/.barbershop`.
    pub data_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "en-US".into(),
            currency: "EUR".into(),
            currency_precision: Self::default_currency_precision(),
            date_format: Self::default_date_format(),
            invoice_prefix: Self::default_invoice_prefix(),
            invoice_sequence_width: Self::default_invoice_sequence_width(),
            business: BusinessProfile::default(),
            data_root: None,
        }
    }
}

impl Config {
    pub fn default_currency_precision() -> u8 {
        2
    }

    pub fn default_date_format() -> String {
        "%Y-%m-%d".into()
    }

    pub fn default_invoice_prefix() -> String {
        "FAC".into()
    }

    pub fn default_invoice_sequence_width() -> usize {
        5
    }

    /// Rejects values the services would refuse later on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.locale.trim().is_empty() {
            return Err(ConfigError::Invalid("locale must not be empty".into()));
        }
        let currency = self.currency.trim();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::Invalid(format!(
                "currency `{}` must be a three-letter code",
                self.currency
            )));
        }
        if self.currency_precision > 6 {
            return Err(ConfigError::Invalid(
                "currency precision must be at most 6".into(),
            ));
        }
        if !is_date_pattern(&self.date_format) {
            return Err(ConfigError::Invalid(format!(
                "date format `{}` is not a valid date pattern",
                self.date_format
            )));
        }
        let prefix = self.invoice_prefix.trim();
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::Invalid(format!(
                "invoice prefix `{}` must be alphanumeric",
                self.invoice_prefix
            )));
        }
        if !(1..=9).contains(&self.invoice_sequence_width) {
            return Err(ConfigError::Invalid(
                "invoice sequence width must be between 1 and 9".into(),
            ));
        }
        if self.business.name.trim().is_empty() {
            return Err(ConfigError::Invalid("business name must not be empty".into()));
        }
        Ok(())
    }

    /// Resolution order: `BARBERSHOP_HOME`, then `data_root`, then `~/.barbershop`.
    pub fn resolve_data_root(&self) -> PathBuf {
        let from_env = std::env::var_os(DATA_ROOT_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);
        self.resolve_data_root_with(from_env)
    }

    pub fn resolve_data_root_with(&self, env_override: Option<PathBuf>) -> PathBuf {
        if let Some(path) = env_override {
            return path;
        }
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        base.join(".barbershop")
    }

    pub fn is_spanish(&self) -> bool {
        self.locale
            .split(['-', '_'])
            .next()
            .is_some_and(|lang| lang.eq_ignore_ascii_case("es"))
    }
}

/// Business details printed on receipts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: "Barbershop".into(),
            address: None,
            phone: None,
            tax_id: None,
        }
    }
}

/// Accepts strftime patterns that render a plain date; time or zone fields
/// have nothing to render from and would fail at print time.
fn is_date_pattern(pattern: &str) -> bool {
    if pattern.trim().is_empty()
        || StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
    {
        return false;
    }
    let Some(sample) = NaiveDate::from_ymd_opt(2026, 1, 31) else {
        return false;
    };
    let mut rendered = String::new();
    write!(rendered, "{}", sample.format(pattern)).is_ok()
}
