use shop_config::ConfigError;
use shop_core::CoreError;
use thiserror::Error;

/// Error type that unifies service, configuration and filesystem failures.
#[derive(Debug, Error)]
pub enum ShopError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures that stop the shell itself rather than a single command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Shop(#[from] ShopError),
    #[error("Input error: {0}")]
    Input(String),
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Input(err.to_string())
    }
}
