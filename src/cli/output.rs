use colored::Colorize;
use std::fmt;

use crate::core::services::{GroupTotals, SalesTotals};
use crate::domain::SaleRecord;

/// Message categories used by the CLI output helpers.
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Hint,
    Section,
}

fn build_label(kind: MessageKind) -> (&'static str, &'static str) {
    match kind {
        MessageKind::Info => ("INFO", "[i]"),
        MessageKind::Success => ("SUCCESS", "[+]"),
        MessageKind::Warning => ("WARNING", "[!]"),
        MessageKind::Error => ("ERROR", "[x]"),
        MessageKind::Hint => ("HINT", ">"),
        MessageKind::Section => ("INFO", ""),
    }
}

fn apply_style(kind: MessageKind, message: impl fmt::Display) -> String {
    let text = message.to_string();
    let formatted = match kind {
        MessageKind::Section => format!("=== {} ===", text.trim()),
        _ => {
            let (label, icon) = build_label(kind);
            format!("{label}: {icon} {text}")
        }
    };

    match kind {
        MessageKind::Success => formatted.bright_green().to_string(),
        MessageKind::Warning => formatted.bright_yellow().to_string(),
        MessageKind::Error => formatted.bright_red().to_string(),
        MessageKind::Hint => formatted.bright_cyan().to_string(),
        MessageKind::Section => formatted.bold().to_string(),
        MessageKind::Info => formatted,
    }
}

pub fn print(kind: MessageKind, message: impl fmt::Display) {
    let formatted = apply_style(kind, message);
    match kind {
        MessageKind::Section => println!("\n{}", formatted),
        _ => println!("{}", formatted),
    }
}

pub fn info(message: impl fmt::Display) {
    print(MessageKind::Info, message);
}

pub fn success(message: impl fmt::Display) {
    print(MessageKind::Success, message);
}

pub fn warning(message: impl fmt::Display) {
    print(MessageKind::Warning, message);
}

pub fn error(message: impl fmt::Display) {
    print(MessageKind::Error, message);
}

pub fn hint(message: impl fmt::Display) {
    print(MessageKind::Hint, message);
}

pub fn section(title: impl fmt::Display) {
    print(MessageKind::Section, title);
}

/// Plain line without a label, used for table rows.
pub fn line(message: impl fmt::Display) {
    println!("{}", message);
}

pub fn sale_header() {
    line(format!(
        "  {:<8} {:<10} {:<10} {:<12} {:<20} {:<6} {:<6} {:>4} {:>7} {:<9} {:>7} {:>7}",
        "id", "date", "day", "village", "customer", "type", "pack", "qty", "total", "status",
        "paid", "balance"
    ));
}

pub fn sale_row(record: &SaleRecord) {
    let sale = &record.sale;
    let id = record.id.to_string();
    line(format!(
        "  {:<8} {:<10} {:<10} {:<12} {:<20} {:<6} {:<6} {:>4} {:>7} {:<9} {:>7} {:>7}",
        &id[..8],
        sale.date,
        sale.day.label(),
        sale.village,
        sale.customer_name,
        sale.product_type,
        sale.package,
        sale.quantity,
        sale.total_amount,
        sale.payment_status.label(),
        sale.amount_paid,
        sale.balance
    ));
}

pub fn totals(label: &str, totals: &SalesTotals) {
    line(format!(
        "  {:<28} entries {:>4}  qty {:>5}  total {:>8}  paid {:>8}  outstanding {:>8}",
        label,
        totals.entries,
        totals.quantity,
        totals.total_amount,
        totals.amount_paid,
        totals.outstanding
    ));
}

pub fn groups(groups: &[GroupTotals]) {
    if groups.is_empty() {
        info("No sales in range.");
        return;
    }
    for group in groups {
        totals(&group.key, &group.totals);
    }
}
