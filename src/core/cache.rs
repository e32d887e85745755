use tracing::debug;

use crate::domain::{CustomerBook, PricingTable};
use crate::errors::Result;
use crate::storage::RecordStore;

use super::services::{CustomerService, LoadSource, PricingService, PricingSnapshot};

/// Read-through cache of the pricing and customer directories.
///
/// Entries are dropped whenever the store's revision differs from the one
/// they were loaded at, or when [`DirectoryCache::invalidate`] is called.
/// Fallback pricing from an unreachable store is never cached.
#[derive(Debug, Default)]
pub struct DirectoryCache {
    revision: Option<u64>,
    pricing: Option<PricingSnapshot>,
    customers: Option<CustomerBook>,
}

impl DirectoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invalidate(&mut self) {
        self.revision = None;
        self.pricing = None;
        self.customers = None;
    }

    pub fn pricing(
        &mut self,
        store: &dyn RecordStore,
        defaults: &PricingTable,
    ) -> Result<PricingSnapshot> {
        self.sync(store);
        if let Some(snapshot) = &self.pricing {
            return Ok(snapshot.clone());
        }
        let snapshot = PricingService::get_all(store, defaults)?;
        if !matches!(snapshot.source, LoadSource::DefaultsStoreUnavailable(_)) {
            self.pricing = Some(snapshot.clone());
        }
        Ok(snapshot)
    }

    pub fn customers(
        &mut self,
        store: &dyn RecordStore,
        villages: &[String],
    ) -> Result<CustomerBook> {
        self.sync(store);
        if let Some(book) = &self.customers {
            return Ok(book.clone());
        }
        let book = CustomerService::get_all(store, villages)?;
        self.customers = Some(book.clone());
        Ok(book)
    }

    pub fn is_warm(&self) -> bool {
        self.pricing.is_some() || self.customers.is_some()
    }

    fn sync(&mut self, store: &dyn RecordStore) {
        let current = store.revision();
        if self.revision != Some(current) {
            if self.is_warm() {
                debug!(revision = current, "store revision changed, reloading directories");
            }
            self.pricing = None;
            self.customers = None;
            self.revision = Some(current);
        }
    }
}
