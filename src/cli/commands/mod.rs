use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;

pub mod customer;
pub mod import;
pub mod price;
pub mod sale;
pub mod summary;
pub mod system;

use crate::cli::context::{CommandError, CommandResult, ShellContext};

static DEFINITIONS: Lazy<Vec<CommandDefinition>> = Lazy::new(|| {
    let mut commands = Vec::new();
    commands.extend(system::definitions());
    commands.extend(sale::definitions());
    commands.extend(customer::definitions());
    commands.extend(price::definitions());
    commands.extend(summary::definitions());
    commands.extend(import::definitions());
    commands
});

pub(crate) fn all_definitions() -> &'static [CommandDefinition] {
    &DEFINITIONS
}

pub type CommandHandler = fn(&mut ShellContext, &[&str]) -> CommandResult;

#[derive(Clone)]
pub struct CommandDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub usage: &'static str,
    pub handler: CommandHandler,
    /// Words accepted right after the command name.
    pub subcommands: &'static [&'static str],
    /// `--name` options, without the dashes.
    pub flags: &'static [&'static str],
}

impl CommandDefinition {
    pub const fn new(
        name: &'static str,
        description: &'static str,
        usage: &'static str,
        handler: CommandHandler,
    ) -> Self {
        Self {
            name,
            description,
            usage,
            handler,
            subcommands: &[],
            flags: &[],
        }
    }

    pub const fn with_subcommands(mut self, subcommands: &'static [&'static str]) -> Self {
        self.subcommands = subcommands;
        self
    }

    pub const fn with_flags(mut self, flags: &'static [&'static str]) -> Self {
        self.flags = flags;
        self
    }
}

pub struct CommandRegistry {
    commands: HashMap<&'static str, &'static CommandDefinition>,
    order: Vec<&'static str>,
}

impl CommandRegistry {
    pub fn new(definitions: &'static [CommandDefinition]) -> Self {
        let mut commands = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            order.push(definition.name);
            commands.insert(definition.name, definition);
        }
        Self { commands, order }
    }

    pub fn get(&self, name: &str) -> Option<&'static CommandDefinition> {
        self.commands.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static CommandDefinition> + '_ {
        self.order
            .iter()
            .filter_map(move |name| self.commands.get(name).copied())
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.order.iter().copied()
    }
}

/// `--name value` options plus positional arguments.
pub(crate) struct Flags<'a> {
    values: Vec<(&'a str, &'a str)>,
    positional: Vec<&'a str>,
}

impl<'a> Flags<'a> {
    pub(crate) fn parse(args: &[&'a str], allowed: &[&str]) -> Result<Self, CommandError> {
        let mut values = Vec::new();
        let mut positional = Vec::new();
        let mut iter = args.iter().copied();
        while let Some(arg) = iter.next() {
            let Some(name) = arg.strip_prefix("--") else {
                positional.push(arg);
                continue;
            };
            if !allowed.contains(&name) {
                return Err(CommandError::InvalidArguments(format!(
                    "Unknown option `--{}`. Expected one of: {}",
                    name,
                    allowed
                        .iter()
                        .map(|flag| format!("--{}", flag))
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            let value = iter.next().ok_or_else(|| {
                CommandError::InvalidArguments(format!("Option `--{}` needs a value", name))
            })?;
            values.retain(|(existing, _)| *existing != name);
            values.push((name, value));
        }
        Ok(Self { values, positional })
    }

    pub(crate) fn get(&self, name: &str) -> Option<&'a str> {
        self.values
            .iter()
            .find(|(flag, _)| *flag == name)
            .map(|(_, value)| *value)
    }

    pub(crate) fn positional(&self) -> &[&'a str] {
        &self.positional
    }
}

pub(crate) fn parse_date(context: &ShellContext, value: &str) -> Result<NaiveDate, CommandError> {
    if value.eq_ignore_ascii_case("today") {
        return Ok(context.clock.today());
    }
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        CommandError::InvalidArguments(format!("Invalid date `{}`. Use YYYY-MM-DD.", value))
    })
}

pub(crate) fn parse_number<T: std::str::FromStr>(label: &str, value: &str) -> Result<T, CommandError> {
    value.trim().parse::<T>().map_err(|_| {
        CommandError::InvalidArguments(format!("Invalid {} `{}`", label, value))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_split_options_from_positionals() {
        let args = ["abc", "--qty", "2", "--customer", "Ajay Thorat"];
        let flags = Flags::parse(&args, &["qty", "customer"]).unwrap();
        assert_eq!(flags.positional(), ["abc"]);
        assert_eq!(flags.get("qty"), Some("2"));
        assert_eq!(flags.get("customer"), Some("Ajay Thorat"));
    }

    #[test]
    fn flags_reject_unknown_and_dangling_options() {
        assert!(Flags::parse(&["--colour", "red"], &["qty"]).is_err());
        assert!(Flags::parse(&["--qty"], &["qty"]).is_err());
    }

    #[test]
    fn registry_keeps_definition_order() {
        let registry = CommandRegistry::new(all_definitions());
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names.first(), Some(&"help"));
        assert!(names.contains(&"sale"));
        assert!(registry.get("summary").is_some());
        assert_eq!(registry.iter().count(), names.len());
        let sale = registry.get("sale").unwrap();
        assert!(sale.subcommands.contains(&"update"));
        assert!(sale.flags.contains(&"village"));
        assert!(registry.get("status").unwrap().subcommands.is_empty());
    }
}
