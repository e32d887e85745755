use std::{io, path::PathBuf, sync::Arc};

use chrono::NaiveDate;
use dialoguer::{theme::ColorfulTheme, Confirm};
use rustyline::error::ReadlineError;
use strsim::levenshtein;
use thiserror::Error;
use tracing::warn;

use crate::{
    cli::{commands, output},
    config::{Config, ConfigManager},
    core::{
        services::{PricingService, PricingSnapshot},
        time::{Clock, SystemClock},
        utils::PathResolver,
        DirectoryCache,
    },
    domain::CustomerBook,
    errors::SalesError,
    storage::{import, JsonStore, RecordStore},
};

use super::commands::CommandRegistry;

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

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] SalesError),
    #[error("{0}")]
    Input(String),
    #[error("{0}")]
    Command(String),
}

impl From<ReadlineError> for CliError {
    fn from(err: ReadlineError) -> Self {
        CliError::Input(err.to_string())
    }
}

impl From<io::Error> for CliError {
    fn from(err: io::Error) -> Self {
        CliError::Command(err.to_string())
    }
}

impl From<dialoguer::Error> for CliError {
    fn from(err: dialoguer::Error) -> Self {
        CliError::Input(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error(transparent)]
    Core(#[from] SalesError),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    #[error("exit requested")]
    ExitRequested,
}

impl CommandError {
    pub(crate) fn usage(usage: &str) -> Self {
        CommandError::InvalidArguments(format!("Usage: {}", usage))
    }
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub theme: ColorfulTheme,
    pub store: Box<dyn RecordStore>,
    pub config: Config,
    pub cache: DirectoryCache,
    pub clock: Arc<dyn Clock>,
    pub data_dir: Option<PathBuf>,
    /// Date chosen with `day`; sales default to it instead of today.
    pub working_date: Option<NaiveDate>,
    pub last_command: Option<String>,
    pub running: bool,
}

impl ShellContext {
    /// Opens the JSON store beneath the application home and loads its config.
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        let base = PathResolver::base_dir();
        let config = ConfigManager::with_base_dir(base.clone())?.load()?;
        let data_dir = config.resolve_data_dir(&base);
        let store = JsonStore::new(data_dir.clone())?;
        let mut context = Self::with_store(mode, config, Box::new(store), Arc::new(SystemClock));
        context.data_dir = Some(data_dir);
        context.bootstrap();
        Ok(context)
    }

    pub fn with_store(
        mode: CliMode,
        config: Config,
        store: Box<dyn RecordStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            theme: ColorfulTheme::default(),
            store,
            config,
            cache: DirectoryCache::new(),
            clock,
            data_dir: None,
            working_date: None,
            last_command: None,
            running: true,
        }
    }

    /// Installs missing default rates and the seed customers. Failures are
    /// reported and the shell keeps running.
    pub fn bootstrap(&mut self) {
        if let Err(err) =
            PricingService::initialize_defaults(self.store.as_ref(), &self.config.default_pricing)
        {
            warn!(%err, "default pricing not installed");
            output::warning(format!("Default pricing not installed: {}", err));
        }
        if let Err(err) = import::seed_customers(self.store.as_ref(), &self.config.seed_customers) {
            warn!(%err, "seed customers not installed");
            output::warning(format!("Seed customers not installed: {}", err));
        }
    }

    pub(crate) fn prompt(&self) -> String {
        match self.working_date {
            Some(date) => format!("tea-sales [{}]> ", date),
            None => "tea-sales> ".to_string(),
        }
    }

    pub(crate) fn today(&self) -> NaiveDate {
        self.working_date.unwrap_or_else(|| self.clock.today())
    }

    pub(crate) fn pricing(&mut self) -> Result<PricingSnapshot, CommandError> {
        Ok(self
            .cache
            .pricing(self.store.as_ref(), &self.config.default_pricing)?)
    }

    pub(crate) fn customers(&mut self) -> Result<CustomerBook, CommandError> {
        Ok(self
            .cache
            .customers(self.store.as_ref(), &self.config.villages)?)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        if let Some(definition) = self.registry.get(command) {
            let handler = definition.handler;
            match handler(self, args) {
                Ok(()) => Ok(LoopControl::Continue),
                Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
                Err(err) => Err(err),
            }
        } else {
            self.suggest_command(raw);
            Ok(LoopControl::Continue)
        }
    }

    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = match crate::cli::shell::parse_command_line(line) {
            Ok(tokens) => tokens,
            Err(err) => {
                output::warning(err);
                return Ok(LoopControl::Continue);
            }
        };
        if tokens.is_empty() {
            return Ok(LoopControl::Continue);
        }

        let raw = &tokens[0];
        let command = raw.to_lowercase();
        let args: Vec<&str> = tokens.iter().skip(1).map(String::as_str).collect();
        self.last_command = Some(line.trim().to_string());

        match self.dispatch(&command, raw, &args) {
            Ok(LoopControl::Exit) => {
                self.running = false;
                Ok(LoopControl::Exit)
            }
            other => other,
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        output::warning(format!(
            "Unknown command `{}`. Type `help` to see available commands.",
            input
        ));

        let needle = input.to_lowercase();
        let mut suggestions: Vec<_> = self
            .registry
            .names()
            .map(|key| (levenshtein(key, &needle), key))
            .collect();
        suggestions.sort_by_key(|(distance, _)| *distance);

        if let Some((distance, best)) = suggestions.first() {
            if *distance <= 3 {
                output::info(format!("Suggestion: `{}`?", best));
            }
        }
    }

    /// Asks before a destructive action. Script mode never prompts.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Confirm::with_theme(&self.theme)
            .with_prompt(prompt)
            .default(false)
            .interact()
            .map_err(CommandError::from)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        Ok(Confirm::with_theme(&self.theme)
            .with_prompt("Exit shell?")
            .default(true)
            .interact()?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested => Ok(()),
            CommandError::InvalidArguments(message) => {
                output::error(&message);
                output::hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::Core(SalesError::StoreUnavailable(reason)) => {
                output::error(format!("Store unavailable: {}", reason));
                output::hint("Nothing was saved. Check the data directory and retry.");
                Ok(())
            }
            other => {
                output::error(other.to_string());
                Ok(())
            }
        }
    }
}

#[cfg(test)]
pub(crate) fn process_script(
    store: Box<dyn RecordStore>,
    lines: &[&str],
) -> Result<ShellContext, CliError> {
    use crate::core::time::FixedClock;
    use chrono::{TimeZone, Utc};

    let clock = FixedClock(Utc.with_ymd_and_hms(2025, 1, 6, 9, 0, 0).unwrap());
    let mut app = ShellContext::with_store(CliMode::Script, Config::default(), store, Arc::new(clock));
    app.bootstrap();
    for line in lines {
        match app.process_line(line) {
            Ok(LoopControl::Continue) => {}
            Ok(LoopControl::Exit) => break,
            Err(err) => app.report_error(err)?,
        }
    }
    Ok(app)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;

    fn run(lines: &[&str]) -> ShellContext {
        process_script(Box::new(InMemoryStore::new()), lines).expect("script runs")
    }

    #[test]
    fn bootstrap_installs_defaults_and_seed() {
        let app = run(&[]);
        assert_eq!(app.store.list_pricing().unwrap().get("1kg"), Some(350));
        assert_eq!(app.store.list_customers().unwrap().names("Bardwadi").len(), 10);
    }

    #[test]
    fn sale_add_records_a_balanced_sale() {
        let app = run(&[
            r#"sale add --customer "Balaji Naik" --package 1kg --qty 2 --status "half paid" --paid 300"#,
        ]);
        let sales = app.store.list_sales().unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].sale.village, "Harali KH");
        assert_eq!(sales[0].sale.balance, 400);
    }

    #[test]
    fn failed_sale_is_reported_and_script_continues() {
        let app = run(&[
            "sale add --customer Someone --package 2kg --qty 1",
            "price set 2kg 700",
            "sale add --customer Someone --package 2kg --qty 1 --village Bardwadi",
        ]);
        let sales = app.store.list_sales().unwrap();
        assert_eq!(sales.len(), 1);
        assert_eq!(sales[0].sale.total_amount, 700);
        assert!(app
            .store
            .list_customers()
            .unwrap()
            .exists("Bardwadi", "someone"));
    }

    #[test]
    fn day_command_sets_working_date() {
        let app = run(&["day 2025-01-10"]);
        assert_eq!(app.working_date, NaiveDate::from_ymd_opt(2025, 1, 10));
        assert_eq!(app.prompt(), "tea-sales [2025-01-10]> ");
    }

    #[test]
    fn exit_stops_processing() {
        let app = run(&["exit", "price set 1kg 999"]);
        assert!(!app.running);
        assert_eq!(app.store.list_pricing().unwrap().get("1kg"), Some(350));
    }

    #[test]
    fn customer_commands_update_store() {
        let app = run(&[
            "customer add Bardwadi \"New Buyer\"",
            "customer rename Bardwadi \"new buyer\" \"New Buyer Sr\"",
            "customer remove Bardwadi \"Ajay Thorat\"",
        ]);
        let book = app.store.list_customers().unwrap();
        assert!(book.exists("Bardwadi", "New Buyer Sr"));
        assert!(!book.exists("Bardwadi", "Ajay Thorat"));
    }
}
