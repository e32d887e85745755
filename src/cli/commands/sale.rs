use uuid::Uuid;

use crate::cli::context::{CommandError, CommandResult, ShellContext};
use crate::cli::output;
use crate::core::services::{SaleContext, SaleRequest, SaleService, SubmittedSale};
use crate::domain::{DayOfWeek, PaymentStatus};

use super::{parse_date, parse_number, CommandDefinition, Flags};

const USAGE: &str = "sale add --customer NAME --package PKG --qty N [--village V] [--date D] \
[--day WEEKDAY] [--type TYPE] [--status STATUS] [--paid AMOUNT] | sale update <id> [options] \
| sale delete <id> | sale list [n]";

pub(crate) const SALE_FLAGS: &[&str] = &[
    "customer", "package", "qty", "village", "date", "day", "type", "status", "paid",
];

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![CommandDefinition::new(
        "sale",
        "Record, correct, delete, or list sales",
        USAGE,
        cmd_sale,
    )
    .with_subcommands(&["add", "update", "delete", "list"])
    .with_flags(SALE_FLAGS)]
}

fn cmd_sale(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    match args.first().map(|sub| sub.to_lowercase()).as_deref() {
        Some("add") => sale_add(context, &args[1..]),
        Some("update") => sale_update(context, &args[1..]),
        Some("delete") => sale_delete(context, &args[1..]),
        Some("list") => sale_list(context, &args[1..]),
        _ => Err(CommandError::usage(USAGE)),
    }
}

fn sale_add(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let flags = Flags::parse(args, SALE_FLAGS)?;
    if !flags.positional().is_empty() {
        return Err(CommandError::usage(USAGE));
    }
    let customer = flags
        .get("customer")
        .ok_or_else(|| CommandError::InvalidArguments("--customer is required".into()))?;
    let package = flags
        .get("package")
        .ok_or_else(|| CommandError::InvalidArguments("--package is required".into()))?;
    let quantity = match flags.get("qty") {
        Some(value) => parse_quantity(value)?,
        None => 1,
    };
    let mut request = SaleRequest::new(context.today(), customer, package, quantity);
    apply_flags(context, &flags, &mut request)?;

    let submitted = submit(context, None, &request)?;
    report(&submitted, "Sale recorded");
    Ok(())
}

fn sale_update(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let flags = Flags::parse(args, SALE_FLAGS)?;
    let [token] = flags.positional() else {
        return Err(CommandError::usage("sale update <id> [options]"));
    };
    let existing = match resolve_id(context, token)? {
        Some(id) => context.store.get_sale(id)?,
        None => None,
    }
    .ok_or_else(|| CommandError::InvalidArguments(format!("No sale matches `{}`", token)))?;
    let id = existing.id;

    let mut request = SaleRequest::from(&existing.sale);
    if let Some(customer) = flags.get("customer") {
        request.customer_name = customer.to_string();
    }
    if let Some(package) = flags.get("package") {
        request.package = package.to_string();
    }
    if let Some(value) = flags.get("qty") {
        request.quantity = parse_quantity(value)?;
    }
    if flags.get("date").is_some() && flags.get("day").is_none() {
        request.day = None;
    }
    apply_flags(context, &flags, &mut request)?;

    let submitted = submit(context, Some(id), &request)?;
    report(&submitted, "Sale updated");
    Ok(())
}

fn sale_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [token] = args else {
        return Err(CommandError::usage("sale delete <id>"));
    };
    let Some(id) = resolve_id(context, token)? else {
        output::warning(format!("No sale matches `{}`.", token));
        return Ok(());
    };
    if !context.confirm(&format!("Delete sale {}?", id))? {
        output::info("Delete cancelled.");
        return Ok(());
    }
    if SaleService::delete(context.store.as_ref(), id)? {
        output::success(format!("Sale {} deleted.", id));
    } else {
        output::warning(format!("No sale matches `{}`.", token));
    }
    Ok(())
}

fn sale_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let count = match args {
        [] => context.config.recent_entries,
        [value] => parse_number::<usize>("count", value)?,
        _ => return Err(CommandError::usage("sale list [n]")),
    };
    let records = SaleService::recent(context.store.as_ref(), count)?;
    if records.is_empty() {
        output::info("No sales recorded yet.");
        return Ok(());
    }
    output::section(format!("Last {} sales", records.len()));
    output::sale_header();
    for record in &records {
        output::sale_row(record);
    }
    Ok(())
}

fn apply_flags(
    context: &ShellContext,
    flags: &Flags<'_>,
    request: &mut SaleRequest,
) -> Result<(), CommandError> {
    if let Some(value) = flags.get("date") {
        request.date = parse_date(context, value)?;
    }
    if let Some(value) = flags.get("day") {
        request.day = Some(value.parse::<DayOfWeek>()?);
    }
    if let Some(value) = flags.get("village") {
        request.village = Some(value.to_string());
    } else if flags.get("date").is_some() || flags.get("day").is_some() {
        request.village = None;
    }
    if let Some(value) = flags.get("type") {
        request.product_type = value.to_string();
    }
    if let Some(value) = flags.get("status") {
        request.payment_status = value.parse::<PaymentStatus>()?;
    }
    if let Some(value) = flags.get("paid") {
        request.amount_paid = Some(parse_number::<u64>("amount", value)?);
    }
    Ok(())
}

fn submit(
    context: &mut ShellContext,
    id: Option<Uuid>,
    request: &SaleRequest,
) -> Result<SubmittedSale, CommandError> {
    let pricing = context.pricing()?;
    if pricing.is_fallback() {
        output::warning("Using default pricing; the store has no saved rates.");
    }
    let customers = context.customers()?;
    let sale_context = SaleContext::new(&context.config, &pricing.table, &customers);
    let submitted = match id {
        Some(id) => SaleService::update(context.store.as_ref(), &sale_context, id, request)?,
        None => SaleService::submit(context.store.as_ref(), &sale_context, request)?,
    };
    Ok(submitted)
}

fn report(submitted: &SubmittedSale, headline: &str) {
    let sale = &submitted.record.sale;
    output::success(format!("{} (id {})", headline, submitted.record.id));
    if submitted.new_customer {
        output::info(format!(
            "New customer `{}` added to {}.",
            sale.customer_name, sale.village
        ));
    }
    output::info(format!(
        "  {} {} | {} {} x{} @ {} = {} | {} | paid {} | balance {}",
        sale.date,
        sale.day,
        sale.village,
        sale.package,
        sale.quantity,
        sale.rate,
        sale.total_amount,
        sale.payment_status,
        sale.amount_paid,
        sale.balance
    ));
}

fn parse_quantity(value: &str) -> Result<u32, CommandError> {
    let quantity = parse_number::<i64>("quantity", value)?;
    if quantity < 1 {
        return Err(CommandError::InvalidArguments(
            "Quantity must be at least 1".into(),
        ));
    }
    u32::try_from(quantity)
        .map_err(|_| CommandError::InvalidArguments(format!("Quantity {} is too large", quantity)))
}

/// Accepts a full sale id or a unique prefix of one, as shown by `sale list`.
/// `None` when nothing matches. Store failures propagate.
fn resolve_id(context: &ShellContext, token: &str) -> Result<Option<Uuid>, CommandError> {
    if let Ok(id) = Uuid::parse_str(token) {
        return Ok(Some(id));
    }
    let prefix = token.trim().to_lowercase();
    if prefix.is_empty() {
        return Err(CommandError::InvalidArguments("Sale id must not be empty".into()));
    }
    let matches: Vec<Uuid> = context
        .store
        .list_sales()?
        .iter()
        .map(|record| record.id)
        .filter(|id| id.to_string().starts_with(&prefix))
        .collect();
    match matches.as_slice() {
        [id] => Ok(Some(*id)),
        [] => Ok(None),
        _ => Err(CommandError::InvalidArguments(format!(
            "`{}` matches {} sales; use more characters",
            token,
            matches.len()
        ))),
    }
}
