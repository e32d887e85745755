use tracing::{info, warn};

use crate::domain::PricingTable;
use crate::errors::SalesError;
use crate::storage::RecordStore;

use super::ServiceResult;

/// Where a pricing table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadSource {
    Store,
    /// The store answered but holds no rates yet.
    DefaultsEmptyStore,
    /// The store could not be reached; the reason is kept for display.
    DefaultsStoreUnavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PricingSnapshot {
    pub table: PricingTable,
    pub source: LoadSource,
}

impl PricingSnapshot {
    pub fn is_fallback(&self) -> bool {
        self.source != LoadSource::Store
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateChange {
    pub package: String,
    pub previous: Option<u64>,
    pub rate: u64,
}

pub struct PricingService;

impl PricingService {
    /// Current rates, or `defaults` when the store is empty or unreachable.
    /// Parse failures are returned as errors rather than masked.
    pub fn get_all(
        store: &dyn RecordStore,
        defaults: &PricingTable,
    ) -> ServiceResult<PricingSnapshot> {
        match store.list_pricing() {
            Ok(table) if !table.is_empty() => Ok(PricingSnapshot {
                table,
                source: LoadSource::Store,
            }),
            Ok(_) => {
                info!("pricing store empty, using default rates");
                Ok(PricingSnapshot {
                    table: defaults.clone(),
                    source: LoadSource::DefaultsEmptyStore,
                })
            }
            Err(SalesError::StoreUnavailable(reason)) => {
                warn!(%reason, "pricing store unavailable, using default rates");
                Ok(PricingSnapshot {
                    table: defaults.clone(),
                    source: LoadSource::DefaultsStoreUnavailable(reason),
                })
            }
            Err(err) => Err(err),
        }
    }

    pub fn get_rate(table: &PricingTable, package: &str) -> ServiceResult<u64> {
        table
            .get(package)
            .ok_or_else(|| SalesError::not_found(format!("no rate for package `{}`", package.trim())))
    }

    pub fn set_rate(store: &dyn RecordStore, package: &str, rate: u64) -> ServiceResult<RateChange> {
        let package = package.trim();
        if package.is_empty() {
            return Err(SalesError::invalid("package label must not be empty"));
        }
        if rate == 0 {
            return Err(SalesError::invalid("rate must be a positive integer"));
        }
        let previous = store.upsert_pricing(package, rate)?;
        info!(package, ?previous, rate, "rate updated");
        Ok(RateChange {
            package: package.to_string(),
            previous,
            rate,
        })
    }

    /// Inserts every default whose label is missing. Returns the labels inserted.
    pub fn initialize_defaults(
        store: &dyn RecordStore,
        defaults: &PricingTable,
    ) -> ServiceResult<Vec<String>> {
        let mut inserted = Vec::new();
        for entry in defaults.iter() {
            if store.insert_pricing_if_absent(&entry.package, entry.rate)? {
                inserted.push(entry.package.clone());
            }
        }
        if !inserted.is_empty() {
            info!(count = inserted.len(), "default rates installed");
        }
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::InMemoryStore;

    #[test]
    fn empty_store_falls_back_with_source() {
        let store = InMemoryStore::new();
        let defaults = Config::default_pricing_table();
        let snapshot = PricingService::get_all(&store, &defaults).unwrap();
        assert_eq!(snapshot.source, LoadSource::DefaultsEmptyStore);
        assert_eq!(snapshot.table, defaults);
    }

    #[test]
    fn unavailable_store_falls_back_with_reason() {
        let store = InMemoryStore::new();
        store.set_offline(true);
        let snapshot = PricingService::get_all(&store, &Config::default_pricing_table()).unwrap();
        assert!(matches!(
            snapshot.source,
            LoadSource::DefaultsStoreUnavailable(_)
        ));
        assert!(snapshot.is_fallback());
    }

    #[test]
    fn unknown_package_fails_closed() {
        let table = Config::default_pricing_table();
        assert!(matches!(
            PricingService::get_rate(&table, "2kg"),
            Err(SalesError::NotFound(_))
        ));
        assert_eq!(PricingService::get_rate(&table, " 1kg ").unwrap(), 350);
    }

    #[test]
    fn set_rate_reports_previous_and_rejects_zero() {
        let store = InMemoryStore::new();
        let first = PricingService::set_rate(&store, "1kg", 350).unwrap();
        assert_eq!(first.previous, None);
        let second = PricingService::set_rate(&store, "1kg", 360).unwrap();
        assert_eq!(second.previous, Some(350));
        assert!(PricingService::set_rate(&store, "1kg", 0).is_err());
        let snapshot = PricingService::get_all(&store, &PricingTable::new()).unwrap();
        assert_eq!(PricingService::get_rate(&snapshot.table, "1kg").unwrap(), 360);
    }

    #[test]
    fn initialize_defaults_is_idempotent_and_keeps_custom_rates() {
        let store = InMemoryStore::new();
        store.upsert_pricing("1kg", 400).unwrap();
        let defaults = Config::default_pricing_table();
        let inserted = PricingService::initialize_defaults(&store, &defaults).unwrap();
        assert_eq!(inserted, vec!["100gm", "250gm", "500gm"]);
        assert!(PricingService::initialize_defaults(&store, &defaults)
            .unwrap()
            .is_empty());
        assert_eq!(store.list_pricing().unwrap().get("1kg"), Some(400));
    }
}
