use chrono::NaiveDate;

use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::SummaryService;
use crate::domain::DateWindow;

use super::{parse_date, CommandDefinition, Flags};

const USAGE: &str =
    "summary [--month YYYY-MM | --from YYYY-MM-DD --to YYYY-MM-DD] \
[--by village|customer|product|package|outstanding]";

const SUMMARY_FLAGS: &[&str] = &["month", "from", "to", "by"];

/// Accepted `--by` values.
pub(crate) const GROUPINGS: &[&str] = &["village", "customer", "product", "package", "outstanding"];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "summary",
        "Totals over a date range, optionally grouped",
        USAGE,
        cmd_summary,
    )
    .with_flags(SUMMARY_FLAGS)]
}

fn cmd_summary(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let flags = Flags::parse(args, SUMMARY_FLAGS)?;
    if !flags.positional().is_empty() {
        return Err(CommandError::usage(USAGE));
    }
    let records = context.store.list_sales()?;

    let from = match flags.get("from") {
        Some(value) => Some(parse_date(context, value)?),
        None => None,
    };
    let to = match flags.get("to") {
        Some(value) => Some(parse_date(context, value)?),
        None => None,
    };
    let month = match flags.get("month") {
        Some(value) if from.is_some() || to.is_some() => {
            return Err(CommandError::InvalidArguments(format!(
                "--month {} cannot be combined with --from or --to",
                value
            )))
        }
        Some(value) => Some(parse_month(value)?),
        None => None,
    };
    let (records, title) = match (from, to) {
        (None, None) => match month {
            Some(window) => (
                SummaryService::within(&records, window),
                format!("Sales {} to {}", window.start, window.end),
            ),
            None => (records, "All sales".to_string()),
        },
        (start, end) => {
            let start = start.or_else(|| records.iter().map(|r| r.sale.date).min());
            let end = end.or_else(|| records.iter().map(|r| r.sale.date).max());
            match (start, end) {
                (Some(start), Some(end)) => {
                    let window = DateWindow::new(start, end)?;
                    (
                        SummaryService::within(&records, window),
                        format!("Sales {} to {}", window.start, window.end),
                    )
                }
                _ => (Vec::new(), "Sales".to_string()),
            }
        }
    };

    output::section(&title);
    output::totals("Total", &SummaryService::totals(&records));

    let Some(by) = flags.get("by") else {
        return Ok(());
    };
    let groups = match by.to_lowercase().as_str() {
        "village" => SummaryService::by_village(&records),
        "customer" => SummaryService::by_customer(&records),
        "product" | "type" => SummaryService::by_product(&records),
        "package" => SummaryService::by_package(&records),
        "outstanding" => SummaryService::outstanding_by_customer(&records),
        other => {
            return Err(CommandError::InvalidArguments(format!(
                "Unknown grouping `{}`. Use one of: {}",
                other,
                GROUPINGS.join(", ")
            )))
        }
    };
    output::section(format!("By {}", by.to_lowercase()));
    output::groups(&groups);
    Ok(())
}

fn parse_month(value: &str) -> Result<DateWindow, CommandError> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map(DateWindow::month_of)
        .map_err(|_| {
            CommandError::InvalidArguments(format!("Invalid month `{}`. Use YYYY-MM.", value))
        })
}
