use std::path::Path;

use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::storage::import;

use super::CommandDefinition;

const USAGE: &str = "import customers <file> | import pricing [file]";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "import",
        "Copy legacy customer or pricing files into the store",
        USAGE,
        cmd_import,
    )
    .with_subcommands(&["customers", "pricing"])]
}

fn cmd_import(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args {
        [kind, file] if kind.eq_ignore_ascii_case("customers") => {
            let report = import::import_customers(context.store.as_ref(), Path::new(file))?;
            output::success(format!(
                "Imported {} customers ({} already present).",
                report.added, report.skipped
            ));
            Ok(())
        }
        [kind, rest @ ..] if kind.eq_ignore_ascii_case("pricing") && rest.len() <= 1 => {
            let path = rest.first().map(Path::new);
            let report =
                import::import_pricing(context.store.as_ref(), &context.config.default_pricing, path)?;
            output::success(format!("Set {} package rates.", report.pricing_set));
            Ok(())
        }
        _ => Err(CommandError::usage(USAGE)),
    }
}
