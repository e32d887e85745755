use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::{LoadSource, PricingService};

use super::{parse_number, CommandDefinition};

const USAGE: &str = "price list | price set <package> <rate>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "price",
        "Show or change package rates",
        USAGE,
        cmd_price,
    )
    .with_subcommands(&["list", "set"])]
}

fn cmd_price(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [sub] if sub.eq_ignore_ascii_case("list") => price_list(context),
        [sub, package, rate] if sub.eq_ignore_ascii_case("set") => {
            let rate = parse_number::<u64>("rate", rate)?;
            let change = PricingService::set_rate(context.store.as_ref(), package, rate)?;
            match change.previous {
                Some(previous) if previous == change.rate => {
                    output::info(format!("{} already costs {}.", change.package, change.rate))
                }
                Some(previous) => output::success(format!(
                    "{}: {} -> {}",
                    change.package, previous, change.rate
                )),
                None => output::success(format!("{}: new rate {}", change.package, change.rate)),
            }
            Ok(())
        }
        _ => Err(CommandError::usage(USAGE)),
    }
}

fn price_list(context: &mut ShellContext) -> CommandResult {
    let snapshot = context.pricing()?;
    match &snapshot.source {
        LoadSource::Store => {}
        LoadSource::DefaultsEmptyStore => {
            output::warning("No rates saved yet; showing defaults.")
        }
        LoadSource::DefaultsStoreUnavailable(reason) => {
            output::warning(format!("Store unavailable ({}); showing defaults.", reason))
        }
    }
    output::section("Pricing");
    for entry in snapshot.table.iter() {
        output::line(format!("  {:<8} {:>6}", entry.package, entry.rate));
    }
    Ok(())
}
