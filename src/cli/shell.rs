use std::{
    fmt,
    io::{self, BufRead, Write},
};

use shell_words::split;

use crate::errors::CliError;

use super::{
    output,
    shell_context::{CliMode, LoopControl, ShellContext},
};

/// Environment variable switching the shell to non-interactive script mode.
pub const SCRIPT_ENV: &str = "SHOP_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };
    if mode == CliMode::Script {
        output::set_color_enabled(false);
    }

    let mut context = ShellContext::open(mode)?;
    tracing::debug!(?mode, root = %context.app.data_root.display(), "shell started");
    run_loop(&mut context, io::stdin().lock())
}

/// Reads commands line by line until `exit` or end of input.
pub(crate) fn run_loop(context: &mut ShellContext, input: impl BufRead) -> Result<(), CliError> {
    let interactive = context.mode == CliMode::Interactive;
    if interactive {
        output::info("Type `help` to list commands, `exit` to quit.");
        show_prompt(context)?;
    }
    for line in input.lines() {
        let line = line?;
        match handle_line(context, &line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => context.report_error(err),
        }
        if !context.running {
            break;
        }
        if interactive {
            show_prompt(context)?;
        }
    }
    Ok(())
}

fn show_prompt(context: &ShellContext) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    write!(stdout, "{}", context.prompt())?;
    stdout.flush()?;
    Ok(())
}

fn handle_line(
    context: &mut ShellContext,
    line: &str,
) -> Result<LoopControl, super::shell_context::CommandError> {
    let tokens = match parse_command_line(line) {
        Ok(tokens) => tokens,
        Err(err) => {
            output::warning(err);
            return Ok(LoopControl::Continue);
        }
    };
    let Some((raw, rest)) = tokens.split_first() else {
        return Ok(LoopControl::Continue);
    };
    if raw.starts_with('#') {
        return Ok(LoopControl::Continue);
    }

    let command = raw.to_lowercase();
    let args: Vec<&str> = rest.iter().map(String::as_str).collect();
    context.last_command = Some(line.trim().to_string());

    let outcome = context.dispatch(&command, raw, &args);
    if matches!(outcome, Ok(LoopControl::Exit)) {
        context.running = false;
    }
    outcome
}

pub(crate) fn parse_command_line(input: &str) -> Result<Vec<String>, ParseError> {
    split(input).map_err(|err| ParseError {
        message: err.to_string(),
    })
}

#[derive(Debug)]
pub(crate) struct ParseError {
    message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not parse command: {}", self.message)
    }
}
