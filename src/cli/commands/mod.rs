use std::collections::HashMap;

use chrono::NaiveDate;

use crate::cli::{registry::CommandDefinition, shell_context::CommandError};

pub mod config;
pub mod expense;
pub mod invoice;
pub mod system;

pub(crate) fn all_definitions() -> Vec<CommandDefinition> {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(invoice::definitions());
    commands.extend(expense::definitions());
    commands.extend(config::definitions());
    commands
}

/// Positional arguments plus `--flag value` options, in input order.
#[derive(Debug, Default)]
pub(crate) struct ParsedArgs<'a> {
    pub positional: Vec<&'a str>,
    options: HashMap<String, &'a str>,
}

impl<'a> ParsedArgs<'a> {
    /// Splits `args`; every name in `flags` must be followed by a value.
    pub fn parse(args: &[&'a str], flags: &[&str]) -> Result<Self, CommandError> {
        let mut parsed = ParsedArgs::default();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                parsed.positional.push(arg);
                continue;
            };
            if !flags.contains(&name) {
                return Err(CommandError::InvalidArguments(format!(
                    "unknown option `--{name}`"
                )));
            }
            let value = iter.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("option `--{name}` needs a value"))
            })?;
            parsed.options.insert(name.to_string(), value);
        }
        Ok(parsed)
    }

    pub fn option(&self, name: &str) -> Option<&'a str> {
        self.options.get(name).copied()
    }

    pub fn f64_option(&self, name: &str) -> Result<Option<f64>, CommandError> {
        self.option(name).map(|raw| parse_amount(raw, name)).transpose()
    }
}

pub(crate) fn parse_amount(raw: &str, what: &str) -> Result<f64, CommandError> {
    raw.trim()
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CommandError::InvalidArguments(format!("invalid {what} `{raw}`")))
}

pub(crate) fn parse_date(input: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("invalid date `{input}` (use YYYY-MM-DD)"))
    })
}

/// Parses `1,15` style lists.
pub(crate) fn parse_number_list(raw: &str, what: &str) -> Result<Vec<u8>, CommandError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<u8>().map_err(|_| {
                CommandError::InvalidArguments(format!("invalid {what} `{part}`"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_are_split_from_positionals() {
        let args = ["Marco", "--tax", "2.5", "Lucia", "--pay", "card"];
        let parsed = ParsedArgs::parse(&args, &["tax", "pay"]).unwrap();
        assert_eq!(parsed.positional, vec!["Marco", "Lucia"]);
        assert_eq!(parsed.option("pay"), Some("card"));
        assert_eq!(parsed.f64_option("tax").unwrap(), Some(2.5));
        assert_eq!(parsed.f64_option("discount").unwrap(), None);
    }

    #[test]
    fn unknown_or_dangling_options_fail() {
        assert!(ParsedArgs::parse(&["--color", "red"], &["tax"]).is_err());
        assert!(ParsedArgs::parse(&["--tax"], &["tax"]).is_err());
    }

    #[test]
    fn decimal_comma_is_accepted() {
        assert_eq!(parse_amount("4,25", "price").unwrap(), 4.25);
        assert!(parse_amount("NaN", "price").is_err());
        assert!(parse_amount("abc", "price").is_err());
    }

    #[test]
    fn number_lists_ignore_blanks() {
        assert_eq!(parse_number_list("1, 15,", "day").unwrap(), vec![1, 15]);
        assert!(parse_number_list("1,x", "day").is_err());
    }
}
