use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::{LoadSource, ScheduleService};
use crate::domain::DayOfWeek;

use super::{parse_date, CommandDefinition};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "help",
            "Show available commands",
            "help [command]",
            cmd_help,
        ),
        CommandDefinition::new(
            "day",
            "Pick the working date and show its default village",
            "day [YYYY-MM-DD|today] [weekday]",
            cmd_day,
        ),
        CommandDefinition::new(
            "status",
            "Show store health and directory sizes",
            "status",
            cmd_status,
        ),
        CommandDefinition::new("exit", "Exit the shell", "exit", cmd_exit),
    ]
}

fn cmd_help(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if let Some(name) = args.first().map(|name| name.to_lowercase()) {
        match context.registry.get(&name) {
            Some(definition) => {
                output::section(format!("Help: {}", definition.name));
                output::info(format!("  Description: {}", definition.description));
                output::info(format!("  Usage: {}", definition.usage));
            }
            None => context.suggest_command(args[0]),
        }
        return Ok(());
    }

    output::section("Available commands");
    for definition in context.registry.iter() {
        output::info(format!("  {:<10} {}", definition.name, definition.description));
    }
    output::info("Use `help <command>` for details.");
    Ok(())
}

fn cmd_day(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.len() > 2 {
        return Err(CommandError::usage("day [YYYY-MM-DD|today] [weekday]"));
    }
    let date = match args.first() {
        Some(value) => parse_date(context, value)?,
        None => context.today(),
    };
    let day_override = match args.get(1) {
        Some(value) => Some(value.parse::<DayOfWeek>()?),
        None => None,
    };
    context.working_date = Some(date);

    let selection = ScheduleService::resolve(
        &context.config.day_villages,
        &context.config.villages,
        date,
        day_override,
    );
    output::info(format!("{} is a {}.", date, selection.day));
    match (&selection.forced_village, &selection.suggested_village) {
        (Some(village), _) => output::success(format!("Default village: {}", village)),
        (None, Some(village)) => {
            output::warning(format!("No village is assigned to {}.", selection.day));
            output::hint(format!(
                "Pass --village when adding sales; `{}` is used otherwise.",
                village
            ));
        }
        (None, None) => output::warning("No villages are configured."),
    }
    Ok(())
}

fn cmd_status(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    output::section("Status");
    output::info(format!("  Backend   : {}", context.store.backend_name()));
    if let Some(dir) = &context.data_dir {
        output::info(format!("  Data dir  : {}", dir.display()));
    }
    output::info(format!("  Revision  : {}", context.store.revision()));
    match context.store.check() {
        Ok(()) => output::success("Store reachable."),
        Err(err) => {
            output::error(format!("Store check failed: {}", err));
            return Ok(());
        }
    }

    let sales = context.store.list_sales()?;
    let customers = context.customers()?;
    let pricing = context.pricing()?;
    output::info(format!("  Sales     : {}", sales.len()));
    output::info(format!(
        "  Customers : {} in {} villages",
        customers.total_customers(),
        customers.village_names().len()
    ));
    let source = match &pricing.source {
        LoadSource::Store => "store".to_string(),
        LoadSource::DefaultsEmptyStore => "defaults (store empty)".to_string(),
        LoadSource::DefaultsStoreUnavailable(reason) => format!("defaults ({})", reason),
    };
    output::info(format!("  Packages  : {} from {}", pricing.table.len(), source));
    Ok(())
}

fn cmd_exit(_context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    Err(CommandError::ExitRequested)
}
