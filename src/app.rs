//! Wiring of configuration, storage and services for one data directory.

use std::{path::PathBuf, sync::Arc};

use shop_config::{Config, ConfigManager};
use shop_core::{
    BusinessHeader, Clock, FrequencyFormatter, InvoiceNumbering, InvoiceService, Language,
    PrintContext,
};
use shop_storage_json::JsonInvoiceStore;
use tracing::debug;

use crate::{clock::SystemClock, errors::ShopError, formatters::ConfigFormatters};

/// Application state shared by the shell and embedding code.
pub struct ShopApp {
    pub data_root: PathBuf,
    pub config: Config,
    pub config_manager: ConfigManager,
    pub store: Arc<JsonInvoiceStore>,
    pub invoices: InvoiceService,
    pub formatters: ConfigFormatters,
}

impl ShopApp {
    /// Opens the data root resolved from `BARBERSHOP_HOME` or the defaults.
    pub fn open_default() -> Result<Self, ShopError> {
        let root = Config::default().resolve_data_root();
        Self::open(root, Arc::new(SystemClock))
    }

    /// Opens (creating if needed) the data directory at `root`.
    pub fn open(root: PathBuf, clock: Arc<dyn Clock>) -> Result<Self, ShopError> {
        let config_manager = ConfigManager::with_base_dir(&root)?;
        let config = config_manager.load()?;
        let store = Arc::new(JsonInvoiceStore::new(root.join("invoices"))?);
        let numbering =
            InvoiceNumbering::new(config.invoice_prefix.clone(), config.invoice_sequence_width)?;
        let invoices = InvoiceService::new(store.clone(), clock).with_numbering(numbering);
        let formatters = ConfigFormatters::from_config(&config);
        debug!(root = %root.display(), "opened data directory");
        Ok(Self {
            data_root: root,
            config,
            config_manager,
            store,
            invoices,
            formatters,
        })
    }

    pub fn language(&self) -> Language {
        Language::from_locale(&self.config.locale)
    }

    pub fn frequency_formatter(&self) -> FrequencyFormatter {
        FrequencyFormatter::new(self.language())
    }

    pub fn print_context(&self) -> PrintContext<'_> {
        let business = &self.config.business;
        PrintContext {
            header: BusinessHeader {
                name: business.name.clone(),
                address: business.address.clone(),
                phone: business.phone.clone(),
                tax_id: business.tax_id.clone(),
            },
            currency_code: self.config.currency.clone(),
            currency: &self.formatters,
            dates: &self.formatters,
        }
    }

    /// Persists a changed configuration and rebuilds what depends on it.
    pub fn update_config(&mut self, config: Config) -> Result<(), ShopError> {
        self.config_manager.save(&config)?;
        let numbering =
            InvoiceNumbering::new(config.invoice_prefix.clone(), config.invoice_sequence_width)?;
        self.invoices = self.invoices.clone().with_numbering(numbering);
        self.formatters = ConfigFormatters::from_config(&config);
        self.config = config;
        Ok(())
    }
}
