use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::CustomerService;

use super::CommandDefinition;

const USAGE: &str = "customer list [village] | customer add <village> <name> \
| customer rename <village> <old> <new> | customer remove <village> <name> \
| customer search <village> [term]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "customer",
        "Manage the customer directory",
        USAGE,
        cmd_customer,
    )
    .with_subcommands(&["list", "add", "rename", "remove", "search"])]
}

fn cmd_customer(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let rest = args.get(1..).unwrap_or(&[]);
    match args.first().map(|sub| sub.to_lowercase()).as_deref() {
        Some("list") => customer_list(context, rest),
        Some("add") => customer_add(context, rest),
        Some("rename") => customer_rename(context, rest),
        Some("remove") => customer_remove(context, rest),
        Some("search") => customer_search(context, rest),
        _ => Err(CommandError::usage(USAGE)),
    }
}

fn customer_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let book = context.customers()?;
    match args {
        [] => {
            output::section("Customers");
            for village in book.villages() {
                output::info(format!("  {:<16} {}", village.village, village.names.len()));
            }
        }
        [village] => {
            let names = book.names(village);
            output::section(format!("Customers in {}", village));
            if names.is_empty() {
                output::info("No customers registered.");
            }
            for name in names {
                output::line(format!("  {}", name));
            }
        }
        _ => return Err(CommandError::usage("customer list [village]")),
    }
    Ok(())
}

fn customer_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [village, name] = args else {
        return Err(CommandError::usage("customer add <village> <name>"));
    };
    ensure_village(context, village)?;
    if CustomerService::add(context.store.as_ref(), village, name)? {
        output::success(format!("Added `{}` to {}.", name.trim(), village));
    } else {
        output::info(format!("`{}` already exists in {}.", name.trim(), village));
    }
    Ok(())
}

fn customer_rename(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [village, old_name, new_name] = args else {
        return Err(CommandError::usage("customer rename <village> <old> <new>"));
    };
    ensure_village(context, village)?;
    if CustomerService::rename(context.store.as_ref(), village, old_name, new_name)? {
        output::success(format!(
            "Renamed `{}` to `{}` in {}.",
            old_name.trim(),
            new_name.trim(),
            village
        ));
    } else {
        output::warning(format!("No customer `{}` in {}.", old_name.trim(), village));
    }
    Ok(())
}

fn customer_remove(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [village, name] = args else {
        return Err(CommandError::usage("customer remove <village> <name>"));
    };
    ensure_village(context, village)?;
    if !context.confirm(&format!("Remove `{}` from {}?", name.trim(), village))? {
        output::info("Remove cancelled.");
        return Ok(());
    }
    if CustomerService::remove(context.store.as_ref(), village, name)? {
        output::success(format!("Removed `{}` from {}.", name.trim(), village));
    } else {
        output::warning(format!("No customer `{}` in {}.", name.trim(), village));
    }
    Ok(())
}

fn customer_search(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let (village, term) = match args {
        [village] => (*village, ""),
        [village, term] => (*village, *term),
        _ => return Err(CommandError::usage("customer search <village> [term]")),
    };
    let book = context.customers()?;
    let suggestions = CustomerService::search(&book, village, term);
    if suggestions.is_empty() {
        output::info(format!("No customers registered in {}.", village));
        return Ok(());
    }
    for name in &suggestions {
        let marker = if book.exists(village, name) { " " } else { "+" };
        output::line(format!("{} {}", marker, name));
    }
    Ok(())
}

fn ensure_village(context: &ShellContext, village: &str) -> CommandResult {
    if context.config.has_village(village) {
        Ok(())
    } else {
        Err(CommandError::InvalidArguments(format!(
            "Unknown village `{}`. Known villages: {}",
            village,
            context.config.villages.join(", ")
        )))
    }
}
