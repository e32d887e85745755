use std::{
    fmt,
    io::{self, BufRead},
};

use rustyline::{error::ReadlineError, history::DefaultHistory, Cmd, Editor, KeyEvent};
use shell_words::split;
use tracing::debug;

use crate::cli::completion::{CommandHelper, Vocabulary};
use crate::cli::context::{CliError, CliMode, LoopControl, ShellContext};
use crate::cli::output;

/// Environment variable switching the shell to line-by-line stdin processing.
pub const SCRIPT_ENV: &str = "TEA_SALES_CLI_SCRIPT";

pub fn run_cli() -> Result<(), CliError> {
    let mode = if std::env::var_os(SCRIPT_ENV).is_some() {
        CliMode::Script
    } else {
        CliMode::Interactive
    };

    let mut context = ShellContext::new(mode)?;

    match mode {
        CliMode::Interactive => run_interactive(&mut context),
        CliMode::Script => run_script(&mut context),
    }
}

fn run_interactive(context: &mut ShellContext) -> Result<(), CliError> {
    let mut editor = Editor::<CommandHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(CommandHelper::new(Vocabulary::from_context(context))));
    editor.bind_sequence(KeyEvent::from('?'), Cmd::Complete);
    output::info("Type `help` to list commands. Tab completes villages, packages, and options.");

    while context.running {
        let prompt = context.prompt();
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                if context.confirm_exit()? {
                    break;
                }
                continue;
            }
            Err(ReadlineError::Eof) => {
                output::info("Exiting shell.");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        editor.add_history_entry(trimmed).ok();
        if step(context, trimmed)? == LoopControl::Exit {
            break;
        }
        // Prices and customers may have changed.
        let vocabulary = Vocabulary::from_context(context);
        if let Some(helper) = editor.helper_mut() {
            helper.refresh(vocabulary);
        }
    }

    Ok(())
}

/// Blank lines and lines starting with `#` are skipped.
fn run_script(context: &mut ShellContext) -> Result<(), CliError> {
    let stdin = io::stdin();
    for (index, line) in stdin.lock().lines().enumerate() {
        if !context.running {
            break;
        }
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        debug!(line = index + 1, command = trimmed, "script line");
        if step(context, trimmed)? == LoopControl::Exit {
            break;
        }
    }
    Ok(())
}

/// Runs one line. Command failures are reported and the loop carries on.
fn step(context: &mut ShellContext, line: &str) -> Result<LoopControl, CliError> {
    match context.process_line(line) {
        Ok(control) => Ok(control),
        Err(err) => {
            context.report_error(err)?;
            Ok(LoopControl::Continue)
        }
    }
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
        write!(f, "{}", self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_names_stay_together() {
        let tokens = parse_command_line(r#"customer add "Harali KH" "Balaji Naik""#).unwrap();
        assert_eq!(tokens, vec!["customer", "add", "Harali KH", "Balaji Naik"]);
    }

    #[test]
    fn unbalanced_quotes_are_reported() {
        assert!(parse_command_line(r#"customer add "Harali KH"#).is_err());
    }
}
