use shop_storage_json::INVOICE_SCHEMA_VERSION;

use crate::cli::{
    output,
    registry::{CommandDefinition, CommandRegistry},
    shell_context::{CommandError, CommandResult, ShellContext},
};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("help", "Show available commands", "help [command]", cmd_help),
        CommandDefinition::new("version", "Show build metadata", "version", cmd_version),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first() {
        match context.command(&name.to_lowercase()) {
            Some(command) => {
                output::section(command.name);
                output::info(command.description);
                output::info(format!("Usage: {}", command.usage));
            }
            None => context.suggest_command(name),
        }
        return Ok(());
    }
    print_overview(&context.registry);
    Ok(())
}

fn print_overview(registry: &CommandRegistry) {
    output::section("Commands");
    let width = registry.names().map(str::len).max().unwrap_or(0);
    for command in registry.iter() {
        output::info(format!(
            "  {:<width$}  {}",
            command.name,
            command.description,
            width = width
        ));
    }
}

fn cmd_version(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::section(format!("Barbershop Core {}", env!("CARGO_PKG_VERSION")));
    output::info(format!("  Invoice schema : v{INVOICE_SCHEMA_VERSION}"));
    output::info(format!("  Data root      : {}", context.app.data_root.display()));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
