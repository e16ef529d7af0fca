use std::io;

use shop_config::ConfigError;
use shop_core::CoreError;
use strsim::levenshtein;

use crate::{app::ShopApp, errors::CliError, errors::ShopError};

use super::{
    commands,
    output,
    registry::{CommandDefinition, CommandRegistry},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    Script,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl From<ShopError> for CommandError {
    fn from(err: ShopError) -> Self {
        match err {
            ShopError::Core(err) => CommandError::Core(err),
            ShopError::Config(err) => CommandError::Config(err),
            ShopError::Io(err) => CommandError::Io(err),
        }
    }
}

/// Mutable state of one shell session.
pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub app: ShopApp,
    /// Recorded as the printing user when a command does not name one.
    pub operator: String,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    pub fn new(mode: CliMode, app: ShopApp) -> Self {
        let operator = std::env::var("SHOP_CLI_USER")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "shop_cli".to_string());
        Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            app,
            operator,
            last_command: None,
            running: true,
        }
    }

    pub fn open(mode: CliMode) -> Result<Self, CliError> {
        let app = ShopApp::open_default()?;
        Ok(Self::new(mode, app))
    }

    pub fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub fn prompt(&self) -> String {
        format!("{}> ", self.app.config.business.name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(handler) = self.registry.get(command).map(|definition| definition.handler) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        if let Some(best) = self.closest_command(input) {
            output::info(format!("Suggestion: `{best}`?"));
        }
    }

    pub(crate) fn closest_command(&self, input: &str) -> Option<&'static str> {
        let needle = input.to_lowercase();
        self.registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance)
            .filter(|(distance, _)| *distance <= 3)
            .map(|(_, name)| name)
    }

    pub(crate) fn report_error(&self, err: CommandError) {
        match err {
            CommandError::ExitRequested => {}
            CommandError::InvalidArguments(message) => {
                output::error(message);
                output::info("Use `help <command>` for usage details.");
            }
            other => output::error(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use shop_core::FixedClock;
    use tempfile::TempDir;

    use super::*;

    fn context(dir: &TempDir) -> ShellContext {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 9, 1, 9, 0, 0).unwrap());
        let app = ShopApp::open(dir.path().to_path_buf(), Arc::new(clock)).unwrap();
        ShellContext::new(CliMode::Script, app)
    }

    #[test]
    fn close_typos_get_suggestions() {
        let dir = TempDir::new().unwrap();
        let ctx = context(&dir);
        assert_eq!(ctx.closest_command("invoce-list"), Some("invoice-list"));
        assert_eq!(ctx.closest_command("completely-unrelated"), None);
    }

    #[test]
    fn exit_maps_to_loop_exit() {
        let dir = TempDir::new().unwrap();
        let mut ctx = context(&dir);
        assert_eq!(ctx.dispatch("exit", "exit", &[]).unwrap(), LoopControl::Exit);
        assert_eq!(
            ctx.dispatch("nope", "nope", &[]).unwrap(),
            LoopControl::Continue
        );
    }
}
