//! One-shot copy of legacy JSON files into a record store.

use serde::{
    de::{MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use std::{fmt, fs, io, path::Path};
use tracing::{info, warn};

use crate::domain::{CustomerBook, PackageRate, PricingTable};
use crate::errors::{Result, SalesError};

use super::RecordStore;

/// Outcome of an import run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Customers inserted into the store.
    pub added: usize,
    /// Customers already present under an equivalent name.
    pub skipped: usize,
    /// Package rates written to the store.
    pub pricing_set: usize,
}

/// Imports a legacy `{ "village": ["name", ...] }` customer file.
pub fn import_customers(store: &dyn RecordStore, path: &Path) -> Result<ImportReport> {
    let data = read_file(path)?.ok_or_else(|| {
        SalesError::not_found(format!("customer file {} does not exist", path.display()))
    })?;
    let book: CustomerBook = serde_json::from_str(&data)
        .map_err(|err| SalesError::Parse(format!("{}: {}", path.display(), err)))?;
    let report = copy_customers(store, &book)?;
    info!(
        path = %path.display(),
        added = report.added,
        skipped = report.skipped,
        "customers imported"
    );
    Ok(report)
}

/// Writes `defaults` overlaid with the rates in `path` (when given and present).
///
/// The legacy file is a `{ "package": rate }` object; the `[{package, rate}]`
/// form written by the JSON store is accepted too.
pub fn import_pricing(
    store: &dyn RecordStore,
    defaults: &PricingTable,
    path: Option<&Path>,
) -> Result<ImportReport> {
    let mut pricing = defaults.clone();
    if let Some(path) = path {
        match read_file(path)? {
            Some(data) => {
                let file: PricingFile = serde_json::from_str(&data)
                    .map_err(|err| SalesError::Parse(format!("{}: {}", path.display(), err)))?;
                for entry in file.0.iter() {
                    pricing.upsert(&entry.package, entry.rate);
                }
            }
            None => warn!(path = %path.display(), "pricing file not found, using defaults"),
        }
    }

    let mut report = ImportReport::default();
    for entry in pricing.iter() {
        if entry.rate == 0 {
            return Err(SalesError::invalid(format!(
                "rate for `{}` must be positive",
                entry.package
            )));
        }
    }
    for entry in pricing.iter() {
        store.upsert_pricing(&entry.package, entry.rate)?;
        report.pricing_set += 1;
    }
    info!(packages = report.pricing_set, "pricing imported");
    Ok(report)
}

/// Copies the seed book into the store only while the store has no customers.
pub fn seed_customers(store: &dyn RecordStore, seed: &CustomerBook) -> Result<ImportReport> {
    if !store.list_customers()?.is_empty() {
        return Ok(ImportReport::default());
    }
    let report = copy_customers(store, seed)?;
    if report.added > 0 {
        info!(added = report.added, "seed customers installed");
    }
    Ok(report)
}

fn copy_customers(store: &dyn RecordStore, book: &CustomerBook) -> Result<ImportReport> {
    let mut report = ImportReport::default();
    for village in book.villages() {
        for name in &village.names {
            if store.upsert_customer(&village.village, name)? {
                report.added += 1;
            } else {
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

fn read_file(path: &Path) -> Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(data) => Ok(Some(data)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(SalesError::StoreUnavailable(format!(
            "{}: {}",
            path.display(),
            err
        ))),
    }
}

/// Pricing file in either the legacy object form or the table form.
struct PricingFile(PricingTable);

impl<'de> Deserialize<'de> for PricingFile {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(PricingFileVisitor)
    }
}

struct PricingFileVisitor;

impl<'de> Visitor<'de> for PricingFileVisitor {
    type Value = PricingFile;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of package labels to rates or a list of package rates")
    }

    fn visit_map<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut table = PricingTable::new();
        while let Some((package, rate)) = access.next_entry::<String, u64>()? {
            table.upsert(&package, rate);
        }
        Ok(PricingFile(table))
    }

    fn visit_seq<A>(self, mut access: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut table = PricingTable::new();
        while let Some(entry) = access.next_element::<PackageRate>()? {
            table.upsert(&entry.package, entry.rate);
        }
        Ok(PricingFile(table))
    }
}
