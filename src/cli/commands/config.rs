use shop_config::Config;

use crate::cli::{
    output,
    registry::CommandDefinition,
    shell_context::{CommandError, CommandResult, ShellContext},
};

const CONFIG_USAGE: &str = "config [show|set <key> <value>|backup [note]|backups|restore <name>]";
const SETTABLE_KEYS: &str = "locale, currency, precision, date-format, invoice-prefix, invoice-width, business-name, business-address, business-phone, business-tax-id";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "config",
            "View and manage shop preferences",
            CONFIG_USAGE,
            cmd_config,
        ),
        CommandDefinition::new(
            "config-show",
            "Show the current configuration",
            "config-show",
            cmd_config_show,
        ),
    ]
}

fn cmd_config(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let Some((sub, rest)) = args.split_first() else {
        return show_config(context);
    };
    match sub.to_lowercase().as_str() {
        "show" => show_config(context),
        "set" => match rest {
            [key, value @ ..] if !value.is_empty() => set_value(context, key, &value.join(" ")),
            _ => Err(CommandError::InvalidArguments(format!(
                "usage: config set <key> <value> (keys: {SETTABLE_KEYS})"
            ))),
        },
        "backup" => {
            let note = (!rest.is_empty()).then(|| rest.join(" "));
            let name = context
                .app
                .config_manager
                .backup(&context.app.config, note.as_deref())?;
            output::success(format!("Configuration backed up as {name}."));
            Ok(())
        }
        "backups" => {
            let names = context.app.config_manager.list_backups()?;
            if names.is_empty() {
                output::info("No configuration backups yet.");
            }
            for name in names {
                output::info(format!("  {name}"));
            }
            Ok(())
        }
        "restore" => {
            let [name] = rest else {
                return Err(CommandError::InvalidArguments(
                    "usage: config restore <name>".into(),
                ));
            };
            let restored = context.app.config_manager.restore(name)?;
            context.app.update_config(restored)?;
            output::success(format!("Configuration restored from {name}."));
            Ok(())
        }
        _ => Err(CommandError::InvalidArguments(format!("usage: {CONFIG_USAGE}"))),
    }
}

fn cmd_config_show(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    show_config(context)
}

fn show_config(context: &ShellContext) -> CommandResult {
    let config = &context.app.config;
    let business = &config.business;
    output::section("Configuration");
    output::info(format!("  locale           : {}", config.locale));
    output::info(format!("  currency         : {}", config.currency));
    output::info(format!("  precision        : {}", config.currency_precision));
    output::info(format!("  date format      : {}", config.date_format));
    output::info(format!("  invoice prefix   : {}", config.invoice_prefix));
    output::info(format!("  invoice width    : {}", config.invoice_sequence_width));
    output::info(format!("  business name    : {}", business.name));
    for (label, value) in [
        ("business address", &business.address),
        ("business phone  ", &business.phone),
        ("business tax id ", &business.tax_id),
    ] {
        if let Some(value) = value {
            output::info(format!("  {label} : {value}"));
        }
    }
    output::info(format!("  data root        : {}", context.app.data_root.display()));
    Ok(())
}

fn set_value(context: &mut ShellContext, key: &str, value: &str) -> CommandResult {
    let mut config = context.app.config.clone();
    apply_setting(&mut config, key, value)?;
    context.app.update_config(config)?;
    output::success(format!("Updated {key}."));
    Ok(())
}

fn apply_setting(config: &mut Config, key: &str, value: &str) -> Result<(), CommandError> {
    let value = value.trim();
    let optional = |value: &str| (!value.is_empty() && value != "-").then(|| value.to_string());
    match key.to_lowercase().as_str() {
        "locale" => config.locale = value.to_string(),
        "currency" => config.currency = value.to_uppercase(),
        "precision" => config.currency_precision = parse_number(key, value)?,
        "date-format" => config.date_format = value.to_string(),
        "invoice-prefix" => config.invoice_prefix = value.to_string(),
        "invoice-width" => config.invoice_sequence_width = parse_number(key, value)?,
        "business-name" => config.business.name = value.to_string(),
        "business-address" => config.business.address = optional(value),
        "business-phone" => config.business.phone = optional(value),
        "business-tax-id" => config.business.tax_id = optional(value),
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "unknown setting `{other}` (keys: {SETTABLE_KEYS})"
            )))
        }
    }
    Ok(())
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, CommandError> {
    value
        .parse::<T>()
        .map_err(|_| CommandError::InvalidArguments(format!("`{key}` expects a number, got `{value}`")))
}
